//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法进行密码哈希和验证

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::{LinktrailError, Result};

/// 对密码进行 Argon2id 哈希（PHC 字符串，含盐）
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LinktrailError::service_unavailable(format!("password hash error: {}", e)))
}

/// 存储的哈希无法解析时视为不匹配
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Corr3ctHorse").expect("hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Corr3ctHorse", &hash));
        assert!(!verify_password("corr3cthorse", &hash));
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("Passw0rdPassw0rd").unwrap();
        let b = hash_password("Passw0rdPassw0rd").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-real-hash"));
        assert!(!verify_password("", ""));
    }
}
