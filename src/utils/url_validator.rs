//! 目标 URL 校验
//!
//! 短链接只会重定向到带主机名的 http(s) 地址。

use std::fmt;

use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;

/// 可执行或读取本地内容的 scheme，单独报告
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    Empty,
    TooLong(usize),
    Malformed(String),
    BlockedScheme(String),
    UnsupportedScheme(String),
    MissingHost,
}

impl fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("target URL is empty"),
            Self::TooLong(len) => {
                write!(f, "target URL has {} characters (max {})", len, MAX_URL_LENGTH)
            }
            Self::Malformed(reason) => write!(f, "target URL does not parse: {}", reason),
            Self::BlockedScheme(scheme) => write!(f, "scheme '{}' is blocked", scheme),
            Self::UnsupportedScheme(scheme) => write!(f, "scheme '{}' is not http(s)", scheme),
            Self::MissingHost => f.write_str("target URL has no host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

impl UrlValidationError {
    /// 返回给 API 调用方的固定文案，不回显用户输入
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Empty => "URL cannot be empty",
            Self::TooLong(_) => "URL is too long",
            Self::Malformed(_) => "Invalid URL format",
            Self::BlockedScheme(_) => "This URL protocol is not allowed",
            Self::UnsupportedScheme(_) => "URL must start with http:// or https://",
            Self::MissingHost => "URL must include a host",
        }
    }
}

/// Parse a link target, returning the normalized [`Url`] on success.
///
/// Surrounding whitespace is ignored. Scheme matching is case-insensitive
/// because [`Url`] lowercases it.
pub fn validate_url(raw: &str) -> Result<Url, UrlValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(raw.len()));
    }

    let parsed = Url::parse(raw).map_err(|e| UrlValidationError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme if BLOCKED_SCHEMES.contains(&scheme) => {
            return Err(UrlValidationError::BlockedScheme(scheme.to_string()));
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(UrlValidationError::MissingHost),
    }
}
