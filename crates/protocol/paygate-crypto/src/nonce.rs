//! Per-request nonce generation.

use rand::Rng;

const NONCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase-alphanumeric string of `len` characters.
///
/// Drawn from the thread-local CSPRNG on every call; never derived from
/// request content.
pub fn generate_nonce(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}
