//! linktrail - URL shortener with click limits, expiry sweeping and access logs
//!
//! # Architecture
//! - `storage`: SeaORM-backed link and access-log store
//! - `services`: slug generation, link management, resolution, access logging
//! - `reconciler`: background expiry sweeps
//! - `api`: HTTP services and bearer authentication
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod reconciler;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
