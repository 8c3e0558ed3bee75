//! The listener and the per-connection tasks.
//!
//! Reads are done into a small stack buffer and accumulated in a `RecvBuffer` until a full
//! line is available; complete lines are handed to the dispatcher one by one.  Writes go
//! through an unbounded queue that the connection task drains, so that no handler ever
//! blocks on a slow peer.

use crate::client::MessageQueueItem;
use crate::state::State;
use std::net::SocketAddr;
use std::{io, process};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Size of the buffer used for a single read off a client socket.
const READ_CHUNK: usize = 1024;

/// Cap on buffered, not-yet-framed input.  A client that sends this much data without a
/// line terminator is disconnected.
const INBOUND_MAX: usize = 8 * 1024;

/// Accumulates raw reads off a socket and splits them into IRC lines.
#[derive(Default)]
struct RecvBuffer {
    buf: Vec<u8>,
}

impl RecvBuffer {
    fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    /// Removes and returns the next complete line, without its `\n` terminator and without
    /// the `\r` that may precede it.
    ///
    /// Returns `Ok(None)` when no full line is buffered yet, and an error when the line is
    /// not valid UTF-8.
    fn extract_line(&mut self) -> io::Result<Option<String>> {
        let end = match memchr::memchr(b'\n', &self.buf) {
            Some(end) => end,
            None => return Ok(None),
        };
        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        match String::from_utf8(line) {
            Ok(line) => Ok(Some(line)),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "line is not valid UTF-8",
            )),
        }
    }
}

/// Binds to `addr`, then accepts and handles incoming connections, forever.
///
/// Exits the process when the address cannot be bound.
pub async fn listen(addr: SocketAddr, shared: State) {
    let listener = TcpListener::bind(addr).await.unwrap_or_else(|err| {
        log::error!("Failed to bind to {}: {}", addr, err);
        process::exit(1);
    });
    log::info!("Listening on {} for plain-text connections...", addr);

    loop {
        match listener.accept().await {
            Ok((conn, peer_addr)) => {
                tokio::spawn(handle(conn, peer_addr, shared.clone()));
            }
            Err(err) => {
                log::debug!("Failed to accept connection: {}", err);
            }
        }
    }
}

/// Handles an IRC connection.
async fn handle(conn: TcpStream, peer_addr: SocketAddr, shared: State) {
    let (reader, writer) = conn.into_split();
    let (msg_queue, outgoing_msgs) = mpsc::unbounded_channel();
    shared.peer_joined(peer_addr, msg_queue).await;

    let res = tokio::select! {
        res = incoming(reader, peer_addr, &shared) => res,
        res = outgoing(writer, outgoing_msgs) => res,
    };
    shared.peer_quit(&peer_addr, res.err()).await;
}

/// Reads from the socket and feeds complete lines to the dispatcher.
///
/// Finishes on EOF, on a read error, on a line that is not valid UTF-8, and when a client
/// overruns the inbound cap.
async fn incoming(mut reader: OwnedReadHalf, peer_addr: SocketAddr, shared: &State) -> io::Result<()> {
    let mut inbound = RecvBuffer::default();
    let mut chunk = [0; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        inbound.append(&chunk[..n]);
        while let Some(line) = inbound.extract_line()? {
            shared.handle_line(&peer_addr, &line).await;
        }
        if INBOUND_MAX < inbound.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "input line too long",
            ));
        }
    }
}

/// Drains the outgoing queue into the socket.
async fn outgoing(
    mut writer: OwnedWriteHalf,
    mut msgs: mpsc::UnboundedReceiver<MessageQueueItem>,
) -> io::Result<()> {
    while let Some(msg) = msgs.recv().await {
        writer.write_all(msg.as_ref()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::RecvBuffer;

    #[test]
    fn test_extract_line_strips_terminators() {
        let mut buf = RecvBuffer::default();
        buf.append(b"NICK ada\r\n");
        assert_eq!(buf.extract_line().unwrap(), Some("NICK ada".to_owned()));
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.extract_line().unwrap(), None);
    }

    #[test]
    fn test_extract_line_handles_partial_reads() {
        let mut buf = RecvBuffer::default();
        buf.append(b"NICK");
        assert_eq!(buf.extract_line().unwrap(), None);
        assert_eq!(buf.extract_line().unwrap(), None);
        buf.append(b" ada\nUSER ");
        assert_eq!(buf.extract_line().unwrap(), Some("NICK ada".to_owned()));
        assert_eq!(buf.extract_line().unwrap(), None);
        buf.append(b"ada 0 * :Ada\r\n");
        assert_eq!(
            buf.extract_line().unwrap(),
            Some("USER ada 0 * :Ada".to_owned())
        );
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_extract_line_splits_batched_reads() {
        let mut buf = RecvBuffer::default();
        buf.append(b"\nPASS x\n\r\n");
        assert_eq!(buf.extract_line().unwrap(), Some(String::new()));
        assert_eq!(buf.extract_line().unwrap(), Some("PASS x".to_owned()));
        assert_eq!(buf.extract_line().unwrap(), Some(String::new()));
        assert_eq!(buf.extract_line().unwrap(), None);
    }

    #[test]
    fn test_extract_line_rejects_invalid_utf8() {
        let mut buf = RecvBuffer::default();
        buf.append(b"\xff\xfe\n");
        assert!(buf.extract_line().is_err());
    }
}
