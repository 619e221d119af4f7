use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash a raw password for storage or comparison.
pub fn hash_password(raw: &str) -> String {
    hex_digest(raw.as_bytes())
}

/// Derive a fresh opaque session token. Uniqueness comes from the UUID;
/// hashing keeps the issued token unrelated to anything stored elsewhere.
pub fn generate_session_token() -> String {
    let seed = format!("{}:{}", Uuid::new_v4(), chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
    hex_digest(seed.as_bytes())
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_stable() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("other"));
    }

    #[test]
    fn tokens_are_unique_and_hex() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
