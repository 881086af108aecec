//! Newline-delimited JSON transport.
//!
//! Framing follows the MCP stdio transport:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! [`LineTransport`] works over any buffered reader and writer, which keeps
//! the server loop testable with in-memory I/O.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::mcp::protocol::Message;

/// A line-framed JSON-RPC transport.
#[derive(Debug)]
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// The transport over the process's stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    /// Creates a transport over stdin/stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over `reader` and `writer`.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads the next message line.
    ///
    /// Returns `None` if the input is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Serialises and writes one message.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message(&mut self, message: &Message) -> io::Result<()> {
        let json = message
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_line(&json).await
    }

    /// Writes an already serialised JSON message with newline termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the message contains a newline or writing fails.
    pub async fn write_line(&mut self, json: &str) -> io::Result<()> {
        if json.contains('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "JSON message must not contain embedded newlines",
            ));
        }

        let mut frame = String::with_capacity(json.len() + 1);
        frame.push_str(json);
        frame.push('\n');
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await
    }
}
