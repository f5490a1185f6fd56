use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::DRAIN_CHUNK_SIZE;

/// Outcome of one drain: byte counters per destination and the first error
/// each side hit.
#[derive(Debug, Default)]
pub struct PipeStatus {
    pub read: usize,
    pub wrote: usize,
    pub buffered: usize,
    pub read_error: Option<io::Error>,
    pub write_error: Option<io::Error>,
    pub buffer_error: Option<io::Error>,
}

impl PipeStatus {
    pub fn is_clean(&self) -> bool {
        self.read_error.is_none() && self.write_error.is_none() && self.buffer_error.is_none()
    }
}

/// Copies `source` chunk by chunk into `buffer` and, when given, into `echo`.
///
/// Stops at end-of-stream, on a read error, or once every destination that
/// can fail has failed. A missing echo never fails, so without one the source
/// is always read to the end. The source is dropped on return.
pub async fn drain<R, E, B>(mut source: R, mut echo: Option<E>, buffer: &mut B) -> PipeStatus
where
    R: AsyncRead + Unpin,
    E: AsyncWrite + Unpin,
    B: AsyncWrite + Unpin,
{
    let mut status = PipeStatus::default();
    let mut chunk = [0u8; DRAIN_CHUNK_SIZE];

    while status.write_error.is_none() || status.buffer_error.is_none() {
        let n = match source.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                status.read_error = Some(e);
                break;
            }
        };
        status.read += n;

        if status.buffer_error.is_none() {
            match buffer.write_all(&chunk[..n]).await {
                Ok(()) => status.buffered += n,
                Err(e) => status.buffer_error = Some(e),
            }
        }

        if let Some(sink) = echo.as_mut() {
            if status.write_error.is_none() {
                match write_through(sink, &chunk[..n]).await {
                    Ok(()) => status.wrote += n,
                    Err(e) => status.write_error = Some(e),
                }
            }
        }
    }

    if status.buffer_error.is_none() {
        if let Err(e) = buffer.flush().await {
            status.buffer_error = Some(e);
        }
    }
    drop(source);

    status
}

async fn write_through<W: AsyncWrite + Unpin>(sink: &mut W, bytes: &[u8]) -> io::Result<()> {
    sink.write_all(bytes).await?;
    sink.flush().await
}
