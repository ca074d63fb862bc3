//! Result file naming.

use rand::Rng;
use std::path::{Path, PathBuf};

/// Length of generated run names.
pub const RUN_NAME_LEN: usize = 10;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random alphanumeric run name of `len` characters.
pub fn run_name<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Returns the result file of the node listening on `port`.
pub fn output_path(folder: &Path, run: &str, port: u16) -> PathBuf {
    folder.join(run).join(format!("{port}.txt"))
}
