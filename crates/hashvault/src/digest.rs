use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha512};

/// Size in bytes of the raw SHA-512 output before encoding.
pub const DIGEST_LEN: usize = 64;

/// Hashes `input` with SHA-512 and renders the result as padded standard
/// base64.
///
/// The transform is pure: identical input always yields identical output.
///
/// # Example
///
/// ```
/// let encoded = hashvault::digest(b"angryMonkey");
/// assert_eq!(
///     encoded,
///     "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q=="
/// );
/// ```
pub fn digest(input: &[u8]) -> String {
    let hash = Sha512::digest(input);
    debug_assert_eq!(hash.len(), DIGEST_LEN);
    STANDARD.encode(hash)
}
