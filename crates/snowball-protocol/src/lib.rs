//! # Snowball Protocol
//!
//! Wire protocol spoken between Snowball peers.
//!
//! Every exchange is one fixed-size request frame followed by one
//! fixed-size response frame on the same stream:
//!
//! ```text
//! request  := i64 big-endian   (index >= 0, or -1 for the liveness probe)
//! response := i64 big-endian   (preferred value, or 1/0 for done/not done)
//! ```
//!
//! A connection may carry any number of exchanges back to back.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod messages;

pub use codec::{read_frame, read_request, read_response, write_frame};
pub use error::{ProtocolError, Result};
pub use messages::{Request, Response};

/// Size in bytes of every request and response frame.
pub const FRAME_LEN: usize = 8;

/// Raw request value used as the liveness probe sentinel.
pub const PROBE_SENTINEL: i64 = -1;
