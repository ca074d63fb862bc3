//! Fuzz target for wire frame parsing.
//!
//! Tests that the request and response decoders handle arbitrary input
//! without panicking, and that every accepted frame re-encodes to itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use snowball_protocol::{Request, Response};

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = Request::decode(data) {
        // Decoded queries always fit in an i64.
        let encoded = request.encode().expect("decoded request re-encodes");
        assert_eq!(Request::decode(&encoded).ok(), Some(request));
    }

    if let Ok(response) = Response::decode(data) {
        assert_eq!(&response.encode()[..], data);
    }
});
