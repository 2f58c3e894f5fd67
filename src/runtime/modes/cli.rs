//! CLI mode
//!
//! One-shot maintenance commands. Each opens what it needs and exits.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::Colorize;

use crate::api::JwtPrincipal;
use crate::config::StaticConfig;
use crate::reconciler::ExpiryReconciler;
use crate::runtime::lifetime::startup::open_storage;

/// Run a single sweep, or only count with `dry_run`
pub async fn run_sweep(config: &StaticConfig, dry_run: bool) -> Result<()> {
    let storage = open_storage(config).await?;

    if dry_run {
        let count = storage
            .count_expired(Utc::now())
            .await
            .context("Failed to count expired links")?;
        println!(
            "{} {} {}",
            "Dry run:".yellow(),
            count.to_string().bold(),
            "link(s) would be retired".yellow()
        );
        return Ok(());
    }

    let reconciler = ExpiryReconciler::new(
        storage,
        Duration::from_secs(config.reconciler.interval_secs),
    );
    let report = reconciler.run_once().await.context("Sweep failed")?;
    reconciler.stop();

    println!(
        "{} {} by time, {} by click limit",
        "Sweep complete:".green(),
        report.time_expired.to_string().bold(),
        report.click_expired.to_string().bold()
    );
    Ok(())
}

/// Print a bearer token for `user_id`
pub fn run_token(config: &StaticConfig, user_id: i64, ttl_hours: i64) -> Result<()> {
    if config.auth.jwt_secret.trim().is_empty() {
        bail!("auth.jwt_secret is empty; cannot sign tokens");
    }
    if ttl_hours <= 0 {
        bail!("--ttl-hours must be positive");
    }

    let token = JwtPrincipal::new(&config.auth.jwt_secret)
        .issue(user_id, chrono::Duration::hours(ttl_hours))
        .context("Failed to sign token")?;
    println!("{}", token);
    Ok(())
}

/// Generate example configuration file
pub fn run_config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let Some(path) = output_path else {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    };

    // 已存在的文件只在 --force 时覆盖
    if !force && Path::new(&path).exists() {
        bail!("{} already exists; pass --force to overwrite", path);
    }

    StaticConfig::default()
        .save_to_file(&path)
        .map_err(|e| anyhow::anyhow!("Unable to write configuration file: {}", e))?;
    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    Ok(())
}
