//! Shared types, error model, and configuration for Leetscribe.
//!
//! This crate is the foundation depended on by all other Leetscribe crates.
//! It provides:
//! - [`LeetscribeError`]: the unified error type
//! - Domain types ([`WorkItem`], [`ExtractedBlock`], [`Annotation`], [`AnnotatedResult`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], [`EnrichmentSettings`], credentials)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiKey, AppConfig, BrowserConfig, Credentials, EnrichmentSettings, LlmConfig, ScrapeConfig,
    ScrapeSection, SiteConfig, SiteCredentials, config_dir, config_file_path, init_config,
    load_config, load_config_from, load_credentials, load_credentials_with, load_dotenv,
    validate_api_key,
};
pub use error::{LeetscribeError, Result};
pub use types::{
    AnnotatedBlock, AnnotatedResult, Annotation, BlockStatus, EnrichmentMode, ExtractedBlock,
    FAILED_ANNOTATION, NO_CONTENT_TEXT, SKIPPED_ANNOTATION, WorkItem,
};
