//! Link management service
//!
//! Creation, listing and owner-initiated deletion. Shared by the HTTP
//! handlers and the tests; holds no state beyond its collaborators.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::slug::{SlugGenerator, SlugSource};
use crate::config::LinksConfig;
use crate::errors::{LinktrailError, Result};
use crate::storage::{Link, NewLink, SeaOrmStorage, validate_link_input};

/// Request to create a new link
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    pub target_url: String,
    /// Absolute expiry; must be in the future when set
    pub expires_at: Option<DateTime<Utc>>,
    /// Positive click budget
    pub click_limit: Option<i64>,
    pub owner_id: i64,
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    slugs: SlugGenerator,
    slug_length: usize,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, settings: &LinksConfig) -> Self {
        let slugs = SlugGenerator::new(storage.clone(), settings.max_slug_attempts);
        Self {
            storage,
            slugs,
            slug_length: settings.slug_length,
        }
    }

    /// Same as [`LinkService::new`] with a custom slug source.
    pub fn with_slug_source(
        storage: Arc<SeaOrmStorage>,
        settings: &LinksConfig,
        source: Arc<dyn SlugSource>,
    ) -> Self {
        let slugs =
            SlugGenerator::with_source(storage.clone(), source, settings.max_slug_attempts);
        Self {
            storage,
            slugs,
            slug_length: settings.slug_length,
        }
    }

    /// Generate a slug and persist the link.
    ///
    /// Availability checks and insert conflicts draw from one attempt budget.
    /// When it runs out the result is `GenerationExhausted`.
    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<Link> {
        validate_link_input(&req.target_url, req.click_limit)?;
        if let Some(expires_at) = req.expires_at
            && expires_at <= Utc::now()
        {
            return Err(LinktrailError::invalid_input(
                "expires_at must be in the future",
            ));
        }

        let max_attempts = self.slugs.max_attempts();
        for attempt in 1..=max_attempts {
            let Some(slug) = self.slugs.candidate(self.slug_length).await? else {
                continue;
            };

            let new_link = NewLink {
                slug,
                target_url: req.target_url.clone(),
                expires_at: req.expires_at,
                click_limit: req.click_limit,
                owner_id: Some(req.owner_id),
            };

            match self.storage.create_link(new_link).await {
                Ok(link) => {
                    info!(
                        "LinkService: created link '{}' for owner {} (attempt {})",
                        link.slug, req.owner_id, attempt
                    );
                    return Ok(link);
                }
                Err(e) if e.is_retryable() => {
                    warn!("LinkService: {} (attempt {}/{})", e, attempt, max_attempts);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LinktrailError::generation_exhausted(format!(
            "could not allocate a unique slug after {} attempts",
            max_attempts
        )))
    }

    pub async fn list_links(&self, owner_id: i64) -> Result<Vec<Link>> {
        self.storage.list_links_by_owner(owner_id, Utc::now()).await
    }

    pub async fn delete_link(&self, slug: &str, owner_id: i64) -> Result<()> {
        self.storage.soft_delete_link(slug, owner_id).await
    }
}
