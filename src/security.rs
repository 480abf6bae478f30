use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use password_hash::{SaltString, PasswordHash};

/// Hash a plaintext password into an Argon2 PHC string with a fresh random salt.
/// The caller is expected to drop the plaintext immediately afterwards.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

// A real PHC string computed once per process. Login burns a verification
// against it when the username does not exist, so the reply takes one Argon2
// pass either way.
static DUMMY_PHC: Lazy<String> = Lazy::new(|| hash_password("bloglist-missing-user").unwrap_or_default());

pub fn dummy_phc() -> &'static str { &DUMMY_PHC }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let phc = hash_password("pw12345").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "pw12345"));
        assert!(!verify_password(&phc, "pw12346"));
    }

    #[test]
    fn two_hashes_of_same_password_differ() {
        // Fresh salt per call
        let a = hash_password("pw12345").unwrap();
        let b = hash_password("pw12345").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "pw12345"));
        assert!(verify_password(&b, "pw12345"));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "pw12345"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn dummy_phc_rejects_everything_sensible() {
        assert!(!verify_password(dummy_phc(), "pw12345"));
        assert!(!verify_password(dummy_phc(), ""));
    }
}
