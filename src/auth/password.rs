//! Account credential rules and Argon2id hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::validation::check_length;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 30;

const PASSWORD_SPECIALS: &str = "!@#$%^&*()-_=+[]{}|;:,.<>?/";

/// Hash a plaintext password into a PHC string (Argon2id, random salt).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    check_length(username, "username", MIN_USERNAME_LEN, MAX_USERNAME_LEN)?;
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(
            "username may only contain letters, digits, '-' and '_'".to_string(),
        );
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    check_length(password, "password", MIN_PASSWORD_LEN, MAX_PASSWORD_LEN)?;

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    let mut missing = Vec::new();
    if !has_upper {
        missing.push("an uppercase letter");
    }
    if !has_lower {
        missing.push("a lowercase letter");
    }
    if !has_digit {
        missing.push("a digit");
    }
    if !has_special {
        missing.push("a special character");
    }
    if !missing.is_empty() {
        return Err(format!("password must contain {}", missing.join(", ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Str0ng!pass").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Str0ng!pass", &hash).unwrap());
        assert!(!verify_password("Wr0ng!pass", &hash).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("bob_the-builder1").is_ok());
        assert!(validate_username("ab").unwrap_err().contains("too short"));
        assert!(validate_username(&"a".repeat(21)).unwrap_err().contains("too long"));
        assert!(validate_username("bob smith").is_err());
        assert!(validate_username("бобик").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Abcdef1!").is_ok());
        assert!(validate_password("Ab1!").unwrap_err().contains("too short"));
        assert!(validate_password(&format!("Ab1!{}", "x".repeat(27))).is_err());

        let msg = validate_password("abcdefgh").unwrap_err();
        assert!(msg.contains("uppercase"));
        assert!(msg.contains("digit"));
        assert!(msg.contains("special"));
        assert!(!msg.contains("lowercase"));
    }
}
