//! Frame I/O over async streams.

use crate::{ProtocolError, Request, Response, Result, FRAME_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads one frame from the stream.
///
/// Returns `Ok(None)` if the stream is closed cleanly on a frame boundary.
///
/// # Errors
///
/// Returns an error if the stream closes mid-frame or the read fails.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<[u8; FRAME_LEN]>>
where
    R: AsyncRead + Unpin,
{
    let mut frame = [0u8; FRAME_LEN];
    let mut filled = 0;
    while filled < FRAME_LEN {
        let n = reader.read(&mut frame[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Truncated(filled));
        }
        filled += n;
    }
    Ok(Some(frame))
}

/// Writes one frame and flushes the stream.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if frame.len() != FRAME_LEN {
        return Err(ProtocolError::Malformed {
            expected: FRAME_LEN,
            actual: frame.len(),
        });
    }
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next request, or `None` once the peer has hung up.
///
/// # Errors
///
/// Returns an error if the stream closes mid-frame or the read fails.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    match read_frame(reader).await? {
        Some(frame) => Request::decode(&frame).map(Some),
        None => Ok(None),
    }
}

/// Reads a response. A closed stream is an error: a response was owed.
///
/// # Errors
///
/// Returns an error if no complete frame arrives.
pub async fn read_response<R>(reader: &mut R) -> Result<Response>
where
    R: AsyncRead + Unpin,
{
    match read_frame(reader).await? {
        Some(frame) => Response::decode(&frame),
        None => Err(ProtocolError::Truncated(0)),
    }
}
