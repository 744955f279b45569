//! Shortener - URL shortener persistence core
//!
//! Maps long URLs to deterministic short aliases, tracks which owner holds
//! which alias, and soft-deletes aliases in the background.
//!
//! # Architecture
//! - `codec`: alias generation from the canonical URL
//! - `storage`: the `RecordStore` contract and its memory, journal and
//!   database backends
//! - `services`: deletion pipeline, health probes and the `ShortenerService` facade
//! - `config`: TOML + environment configuration
//! - `interfaces`: command-line front end
//! - `system`: logging setup

pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod system;
