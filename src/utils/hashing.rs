//! Stable hashing for manifest entry IDs

use sha2::{Digest, Sha256};

/// First 16 hex chars of the SHA-256 of an identity key.
pub fn stable_id(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::stable_id;

    #[test]
    fn stable_id_is_deterministic_and_short() {
        let a = stable_id("proj/a.txt");
        assert_eq!(a, stable_id("proj/a.txt"));
        assert_eq!(a.len(), 16);
        assert_ne!(a, stable_id("proj/b.txt"));
    }
}
