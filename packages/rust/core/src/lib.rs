//! Core orchestration for Leetscribe.
//!
//! This crate ties the scraping stages together:
//! - [`generator`]: the text generation seam and its OpenAI implementation
//! - [`enrichment`]: prompt construction and per-block annotation
//! - [`pipeline`]: discovery, processing and enrichment over one browser session
//! - [`report`]: console and JSON rendering of results

pub mod enrichment;
pub mod generator;
pub mod pipeline;
pub mod report;

pub use enrichment::Enricher;
pub use generator::{GenerationRequest, OpenAiClient, TextGenerator};
pub use pipeline::{
    LoginPolicy, ProgressReporter, SessionConfig, SessionReport, SilentProgress, Stage,
    run_pipeline, run_session,
};
pub use report::{render_json, render_text};
