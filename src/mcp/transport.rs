//! stdio transport for the MCP server.
//!
//! - Messages are UTF-8 encoded JSON-RPC, one per line
//! - Messages must not contain embedded newlines
//! - stdin carries client messages, stdout carries server messages
//! - stderr is left for logging

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// A stdio-based MCP transport.
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Handle for stdout.
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }

    /// Reads the next message line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    /// Writes one serialised message to stdout with newline termination.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub async fn write_line(&mut self, json: &str) -> io::Result<()> {
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse, RequestId};

    #[test]
    fn transport_default() {
        let _transport = StdioTransport::default();
    }

    #[test]
    fn serialised_messages_have_no_newlines() {
        let response = JsonRpcResponse::success(
            RequestId::Number(1),
            serde_json::json!({
                "content": [{"type": "text", "text": "{\"status\":\"success\"}"}],
                "nested": {"key": "multi\nline"}
            }),
        );
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains('\n'));

        let error = JsonRpcError::method_not_found(RequestId::Number(1), "test/method");
        let json = serde_json::to_string(&error).unwrap();
        assert!(!json.contains('\n'));
    }
}
