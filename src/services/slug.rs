//! Slug generation
//!
//! Candidates come from a [`SlugSource`]; availability is checked against
//! every link row, deleted ones included.

use std::sync::Arc;

use rand::RngExt;
use tracing::debug;

use crate::errors::{LinktrailError, Result};
use crate::storage::SeaOrmStorage;

/// 64 个字符，字节取模后分布均匀
pub const SLUG_ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

pub trait SlugSource: Send + Sync {
    fn next_slug(&self, length: usize) -> String;
}

/// 使用线程本地 CSPRNG（由系统熵播种）
pub struct RandomSlugSource;

impl SlugSource for RandomSlugSource {
    fn next_slug(&self, length: usize) -> String {
        let mut bytes = vec![0u8; length];
        rand::rng().fill(&mut bytes[..]);
        bytes
            .iter()
            .map(|b| SLUG_ALPHABET[(*b % 64) as usize] as char)
            .collect()
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.bytes().all(|b| SLUG_ALPHABET.contains(&b))
}

#[derive(Clone)]
pub struct SlugGenerator {
    storage: Arc<SeaOrmStorage>,
    source: Arc<dyn SlugSource>,
    max_attempts: u32,
}

impl SlugGenerator {
    pub fn new(storage: Arc<SeaOrmStorage>, max_attempts: u32) -> Self {
        Self::with_source(storage, Arc::new(RandomSlugSource), max_attempts)
    }

    pub fn with_source(
        storage: Arc<SeaOrmStorage>,
        source: Arc<dyn SlugSource>,
        max_attempts: u32,
    ) -> Self {
        Self {
            storage,
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// One attempt: a fresh candidate, or `None` if it is already taken.
    pub async fn candidate(&self, length: usize) -> Result<Option<String>> {
        let slug = self.source.next_slug(length);
        if self.storage.slug_exists(&slug).await? {
            debug!("Slug collision on {}", slug);
            return Ok(None);
        }
        Ok(Some(slug))
    }

    /// A slug not held by any link at the time of the check.
    ///
    /// Insertion is a separate step, so the caller still has to handle
    /// [`LinktrailError::SlugConflict`] from the store.
    pub async fn generate(&self, length: usize) -> Result<String> {
        for _ in 0..self.max_attempts {
            if let Some(slug) = self.candidate(length).await? {
                return Ok(slug);
            }
        }
        Err(LinktrailError::generation_exhausted(format!(
            "no free slug of length {} after {} attempts",
            length, self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_slug_length_and_charset() {
        let source = RandomSlugSource;
        for len in [1, 8, 32] {
            let slug = source.next_slug(len);
            assert_eq!(slug.len(), len);
            assert!(is_valid_slug(&slug));
        }
    }

    #[test]
    fn test_random_slugs_differ() {
        let source = RandomSlugSource;
        let a = source.next_slug(16);
        let b = source.next_slug(16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("abc-_XYZ09"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("slash/"));
    }
}
