use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, timeout_at, Instant};

const READ_CHUNK: usize = 4096;
/// Roughly 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Turns raw bytes from the wire into session data, queuing any protocol replies
pub trait InboundFilter {
    fn filter(&mut self, raw: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>);
}

/// Filter for transports that carry plain session data (SSH channels)
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl InboundFilter for PassThrough {
    fn filter(&mut self, raw: &[u8], data: &mut Vec<u8>, _replies: &mut Vec<u8>) {
        data.extend_from_slice(raw);
    }
}

/// Buffered expect-style reader/writer over a device session
pub struct DeviceStream<S, F = PassThrough> {
    inner: S,
    filter: F,
    buffer: Vec<u8>,
    replies: Vec<u8>,
    eof: bool,
}

impl<S, F> DeviceStream<S, F>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: InboundFilter,
{
    pub fn new(inner: S, filter: F) -> Self {
        Self {
            inner,
            filter,
            buffer: Vec::new(),
            replies: Vec::new(),
            eof: false,
        }
    }

    /// Whether the peer has closed its side
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Read until `pattern` is seen and return everything up to and including it.
    ///
    /// On timeout the bytes read so far are returned (possibly none). When the
    /// connection closes the buffered bytes are returned; a closed connection
    /// with nothing buffered is an `UnexpectedEof` error.
    pub async fn read_until(&mut self, pattern: &[u8], limit: Duration) -> io::Result<Vec<u8>> {
        let deadline = deadline_after(limit);
        loop {
            if let Some(pos) = find(&self.buffer, pattern) {
                let end = pos + pattern.len();
                return Ok(self.buffer.drain(..end).collect());
            }
            if self.eof {
                return self.take_buffered();
            }
            match timeout_at(deadline, self.fill()).await {
                Ok(result) => {
                    result?;
                }
                Err(_) => {
                    tracing::debug!(
                        pattern = %String::from_utf8_lossy(pattern),
                        buffered = self.buffer.len(),
                        "read_until timed out"
                    );
                    return Ok(self.buffer.drain(..).collect());
                }
            }
        }
    }

    /// Return everything available right now without waiting for more
    pub async fn read_very_eager(&mut self) -> io::Result<Vec<u8>> {
        while !self.eof {
            match timeout(Duration::ZERO, self.fill()).await {
                Ok(result) => {
                    result?;
                }
                Err(_) => break,
            }
        }
        if self.eof {
            return self.take_buffered();
        }
        Ok(self.buffer.drain(..).collect())
    }

    /// Read until the session has been quiet for `quiet`, bounded by `limit`.
    ///
    /// Nothing arriving before `limit` is a `TimedOut` error.
    pub async fn read_until_quiet(&mut self, quiet: Duration, limit: Duration) -> io::Result<Vec<u8>> {
        let deadline = deadline_after(limit);
        while !self.eof {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            // Quiet period only counts once the device has said something
            let wait = if self.buffer.is_empty() {
                remaining
            } else {
                quiet.min(remaining)
            };
            match timeout(wait, self.fill()).await {
                Ok(result) => {
                    result?;
                }
                Err(_) => break,
            }
        }

        if self.buffer.is_empty() {
            if self.eof {
                return Err(closed());
            }
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no data received from device within {}s", limit.as_secs()),
            ));
        }
        Ok(self.buffer.drain(..).collect())
    }

    /// Write `bytes` to the device, flushing queued protocol replies first
    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.flush_replies().await?;
        self.inner.write_all(bytes).await?;
        self.inner.flush().await
    }

    /// Close the write side of the session
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }

    /// One read from the wire into the data buffer; returns data bytes gained
    async fn fill(&mut self) -> io::Result<usize> {
        self.flush_replies().await?;

        let mut raw = [0u8; READ_CHUNK];
        let n = self.inner.read(&mut raw).await?;
        if n == 0 {
            self.eof = true;
            return Ok(0);
        }

        let before = self.buffer.len();
        self.filter
            .filter(&raw[..n], &mut self.buffer, &mut self.replies);
        Ok(self.buffer.len() - before)
    }

    async fn flush_replies(&mut self) -> io::Result<()> {
        if self.replies.is_empty() {
            return Ok(());
        }
        let replies = std::mem::take(&mut self.replies);
        self.inner.write_all(&replies).await?;
        self.inner.flush().await
    }

    fn take_buffered(&mut self) -> io::Result<Vec<u8>> {
        if self.buffer.is_empty() {
            return Err(closed());
        }
        Ok(self.buffer.drain(..).collect())
    }
}

/// `limit` from now, saturating far in the future for huge timeouts
fn deadline_after(limit: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(limit).unwrap_or(now + FAR_FUTURE)
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by device")
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
