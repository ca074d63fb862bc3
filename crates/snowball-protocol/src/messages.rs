//! Request and response frames.

use crate::{ProtocolError, Result, FRAME_LEN, PROBE_SENTINEL};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A request sent to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    /// Ask for the peer's preferred (or decided) value at an index.
    Query(u64),
    /// Ask whether the peer has decided every index.
    Probe,
}

impl Request {
    /// Interprets a raw request value. Any negative value is a probe.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        match u64::try_from(raw) {
            Ok(ix) => Self::Query(ix),
            Err(_) => Self::Probe,
        }
    }

    /// Returns the raw value carried on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if a query index exceeds `i64::MAX`.
    pub fn to_raw(self) -> Result<i64> {
        match self {
            Self::Query(ix) => i64::try_from(ix).map_err(|_| ProtocolError::IndexTooLarge(ix)),
            Self::Probe => Ok(PROBE_SENTINEL),
        }
    }

    /// Encodes the request to a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a query index exceeds `i64::MAX`.
    pub fn encode(self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(FRAME_LEN);
        buf.put_i64(self.to_raw()?);
        Ok(buf.freeze())
    }

    /// Decodes a request from a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not exactly [`FRAME_LEN`] bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(Self::from_raw(decode_i64(data)?))
    }
}

/// A response returned by a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Response(pub i64);

impl Response {
    /// Builds the answer to a liveness probe.
    #[must_use]
    pub fn done(done: bool) -> Self {
        Self(i64::from(done))
    }

    /// Returns the carried value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Interprets the response as the answer to a probe.
    #[must_use]
    pub const fn is_done(self) -> bool {
        self.0 == 1
    }

    /// Encodes the response to a frame.
    #[must_use]
    pub fn encode(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_LEN);
        buf.put_i64(self.0);
        buf.freeze()
    }

    /// Decodes a response from a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not exactly [`FRAME_LEN`] bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        decode_i64(data).map(Self)
    }
}

fn decode_i64(mut data: &[u8]) -> Result<i64> {
    if data.len() != FRAME_LEN {
        return Err(ProtocolError::Malformed {
            expected: FRAME_LEN,
            actual: data.len(),
        });
    }
    Ok(data.get_i64())
}
