//! Local account registration and login
//!
//! Passwords are stored as Argon2id hashes. Login failures never say
//! whether the email or the password was wrong.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{LinktrailError, Result};
use crate::storage::{NewUser, SeaOrmStorage, User};
use crate::utils::password::{hash_password, verify_password};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 3-20 个 ASCII 字母或数字
pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(LinktrailError::invalid_input(
            "username must be 3-20 characters long",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LinktrailError::invalid_input(
            "username may only contain letters and digits",
        ));
    }
    Ok(())
}

/// 只做结构检查：`local@domain.tld`
pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(LinktrailError::invalid_input("email address is not valid"))
    }
}

/// 8-128 个字符，至少各含一个大写字母、小写字母和数字
pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < 8 {
        return Err(LinktrailError::invalid_input(
            "password must be at least 8 characters long",
        ));
    }
    if len > 128 {
        return Err(LinktrailError::invalid_input(
            "password must be at most 128 characters long",
        ));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(LinktrailError::invalid_input(
            "password needs an uppercase letter, a lowercase letter and a digit",
        ));
    }
    Ok(())
}

pub struct AccountService {
    storage: Arc<SeaOrmStorage>,
}

impl AccountService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Register a new user. Username is trimmed, email trimmed and lowercased.
    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_lowercase();

        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&req.password)?;

        if self.storage.find_user_by_email(&email).await?.is_some() {
            return Err(LinktrailError::conflict(
                "An account with this email already exists",
            ));
        }
        if self.storage.find_user_by_username(&username).await?.is_some() {
            return Err(LinktrailError::conflict("This username is already taken"));
        }

        let password_hash = hash_password(&req.password)?;

        // 并发注册同名账号时由唯一索引兜底
        let user = self
            .storage
            .create_user(NewUser {
                username,
                email,
                password_hash,
            })
            .await?;

        info!("User registered: {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and return the matching user.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            warn!("Login attempt for unknown email");
            return Err(LinktrailError::unauthorized(LOGIN_FAILED_MESSAGE));
        };

        if !verify_password(password, &user.password_hash) {
            warn!("Failed login for user id {}", user.id);
            return Err(LinktrailError::unauthorized(LOGIN_FAILED_MESSAGE));
        }

        info!("User logged in: {} (id {})", user.username, user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Bob2024").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("a_very_long_username_indeed").is_err());
        assert!(validate_username("alice!").is_err());
        assert!(validate_username("ali ce").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b@mail.example.org").is_ok());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("alice@example..com").is_err());
        assert!(validate_email("al ice@example.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Sup3rSecret").is_ok());
        assert!(validate_password("Sh0rt").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
        assert!(validate_password(&format!("Aa1{}", "x".repeat(126))).is_err());
    }
}
