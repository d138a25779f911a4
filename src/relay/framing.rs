//! Length-prefixed framing for relay messages.
//!
//! Wire format is `<ASCII decimal length>_<payload>`, e.g. `5_HELLO`. The
//! payload is UTF-8. There is no server response on this stream.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Separator between the length prefix and the payload
pub const DELIMITER: u8 = b'_';

/// Largest payload accepted from a relay client
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Longest length prefix worth reading before giving up on the stream
const MAX_PREFIX_DIGITS: usize = 10;

/// Outcome of reading one frame
#[derive(Debug, PartialEq, Eq)]
pub enum FrameRead {
    Message(String),
    /// Clean or mid-frame EOF; any partial payload is discarded
    Disconnected,
    /// Frame consumed but unusable; the stream is still in sync
    Dropped(DropReason),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("empty payload")]
    Empty,

    #[error("payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors that leave the stream unsynchronised. The connection must be closed.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("relay read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid length prefix {0:?}")]
    InvalidLength(String),

    #[error("frame of {0} bytes exceeds limit of {MAX_FRAME_LEN}")]
    TooLarge(usize),
}

/// Read one frame. Not cancel-safe: a partially read frame is lost.
pub async fn read_frame<R>(reader: &mut R) -> Result<FrameRead, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = BytesMut::with_capacity(MAX_PREFIX_DIGITS);
    let mut byte = [0u8; 1];
    loop {
        if reader.read(&mut byte).await? == 0 {
            return Ok(FrameRead::Disconnected);
        }
        if byte[0] == DELIMITER {
            break;
        }
        if prefix.len() == MAX_PREFIX_DIGITS {
            return Err(FrameError::InvalidLength(lossy(&prefix)));
        }
        prefix.put_u8(byte[0]);
    }

    let len = parse_length(&prefix)?;

    let mut payload = BytesMut::with_capacity(len);
    while payload.len() < len {
        let remaining = (len - payload.len()) as u64;
        if (&mut *reader).take(remaining).read_buf(&mut payload).await? == 0 {
            return Ok(FrameRead::Disconnected);
        }
    }

    if payload.is_empty() {
        return Ok(FrameRead::Dropped(DropReason::Empty));
    }

    match std::str::from_utf8(&payload) {
        Ok(text) => Ok(FrameRead::Message(text.to_string())),
        Err(e) => Ok(FrameRead::Dropped(e.into())),
    }
}

/// Encode a payload for sending to the relay
pub fn encode_frame(payload: &str) -> Bytes {
    let prefix = payload.len().to_string();
    let mut buf = BytesMut::with_capacity(prefix.len() + 1 + payload.len());
    buf.put_slice(prefix.as_bytes());
    buf.put_u8(DELIMITER);
    buf.put_slice(payload.as_bytes());
    buf.freeze()
}

fn parse_length(prefix: &[u8]) -> Result<usize, FrameError> {
    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::InvalidLength(lossy(prefix)));
    }
    let len: usize = lossy(prefix)
        .parse()
        .map_err(|_| FrameError::InvalidLength(lossy(prefix)))?;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }
    Ok(len)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
