use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 16;

/// Short fingerprint of file content for listings and change summaries.
pub fn content_hash(content: &str) -> String {
	let digest = Sha256::digest(content.as_bytes());
	let mut hex = format!("{:x}", digest);
	hex.truncate(HASH_LEN);
	hex
}
