//! Line transport used by the connector.
//!
//! The connector never blocks its driver: reads only return a line that is
//! already available, and writes are buffered until an explicit flush.

use bytes::{Buf, BytesMut};
use std::io;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};
use tracing::{debug, warn};

/// Longest inbound line accepted, terminator excluded. Longer lines are
/// discarded up to their next newline.
pub const MAX_LINE_LEN: usize = 8191;

const READ_CHUNK: usize = 4096;

/// A bidirectional, line-oriented connection to the chat service.
pub trait Transport: Send {
    /// Return the next complete inbound line if one is available without
    /// waiting. `Ok(None)` means no full line has arrived yet. The line
    /// terminator (`\n` or `\r\n`) is stripped.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Buffer one outbound line. A `\n` terminator is appended.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Push buffered outbound lines to the peer. May return with output still
    /// pending if the peer is not keeping up.
    fn flush(&mut self) -> io::Result<()>;

    /// Whether written lines are still waiting to reach the peer.
    fn has_pending(&self) -> bool;

    /// Close the connection. Further calls are no-ops.
    fn close(&mut self);
}

/// Plain TCP transport backed by a tokio socket polled with `try_read`/`try_write`.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    codec: LinesCodec,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl TcpTransport {
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            codec: LinesCodec::new_with_max_length(MAX_LINE_LEN),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            write_buf: BytesMut::new(),
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is closed")
}

/// Decode the next complete line from `buf`, skipping lines that are too
/// long or not UTF-8.
fn next_line(codec: &mut LinesCodec, buf: &mut BytesMut) -> io::Result<Option<String>> {
    loop {
        match codec.decode(buf) {
            Ok(line) => return Ok(line),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(max = MAX_LINE_LEN, "dropping overlong inbound line");
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                debug!("dropping inbound line: {}", e);
            }
            Err(LinesCodecError::Io(e)) => return Err(e),
        }
    }
}

impl Transport for TcpTransport {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = next_line(&mut self.codec, &mut self.read_buf)? {
            return Ok(Some(line));
        }
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.try_read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ))
                }
                Ok(n) => {
                    self.read_buf.extend_from_slice(&chunk[..n]);
                    if let Some(line) = next_line(&mut self.codec, &mut self.read_buf)? {
                        return Ok(Some(line));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.stream.is_none() {
            return Err(not_connected());
        }
        self.codec
            .encode(line, &mut self.write_buf)
            .map_err(|e| match e {
                LinesCodecError::Io(e) => e,
                LinesCodecError::MaxLineLengthExceeded => {
                    io::Error::new(io::ErrorKind::InvalidInput, "line too long")
                }
            })
    }

    fn flush(&mut self) -> io::Result<()> {
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;
        while !self.write_buf.is_empty() {
            match stream.try_write(&self.write_buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.write_buf.advance(n),
                // Socket buffer is full; the remainder goes out on a later flush.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.stream.is_some() && !self.write_buf.is_empty()
    }

    fn close(&mut self) {
        self.stream = None;
        self.read_buf.clear();
        self.write_buf.clear();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::Transport;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Observable state shared between a [`MockTransport`] and its test.
    #[derive(Debug, Default)]
    pub struct MockState {
        pub inbound: VecDeque<String>,
        pub fail_next_read: Option<io::ErrorKind>,
        pub pending: Vec<String>,
        pub flushed: Vec<String>,
        pub flush_count: usize,
        /// Lines moved per flush, simulating a peer that reads slowly.
        pub flush_limit: Option<usize>,
        pub close_count: usize,
        pub closed: bool,
        pub access_after_close: usize,
    }

    impl MockState {
        /// Lines written so far, flushed or not.
        pub fn written(&self) -> Vec<String> {
            self.flushed.iter().chain(self.pending.iter()).cloned().collect()
        }
    }

    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub fn new() -> (Self, Arc<Mutex<MockState>>) {
            let state = Arc::new(Mutex::new(MockState::default()));
            (
                Self {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl Transport for MockTransport {
        fn read_line(&mut self) -> io::Result<Option<String>> {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                state.access_after_close += 1;
            }
            if let Some(kind) = state.fail_next_read.take() {
                return Err(kind.into());
            }
            Ok(state.inbound.pop_front())
        }

        fn write_line(&mut self, line: &str) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                state.access_after_close += 1;
            }
            state.pending.push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                state.access_after_close += 1;
            }
            let take = state
                .flush_limit
                .map_or(state.pending.len(), |limit| limit.min(state.pending.len()));
            let moved: Vec<String> = state.pending.drain(..take).collect();
            state.flushed.extend(moved);
            state.flush_count += 1;
            Ok(())
        }

        fn has_pending(&self) -> bool {
            !self.state.lock().unwrap().pending.is_empty()
        }

        fn close(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.close_count += 1;
            state.closed = true;
        }
    }
}
