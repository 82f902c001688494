//! Site-specific scraping stages.
//!
//! This crate provides:
//! - [`profile`]: URLs and selectors of the target site
//! - [`session`]: login bootstrap with a manual challenge checkpoint
//! - [`discovery`]: listing walk producing deduplicated work items
//! - [`processor`]: per-item solutions page extraction
//!
//! Every stage is generic over [`leetscribe_browser::Browser`], so the same
//! code drives a live WebDriver session and the offline `StaticBrowser`.

pub mod discovery;
pub mod processor;
pub mod profile;
pub mod session;

pub use discovery::{dedup_work_items, discover};
pub use processor::{
    ActionError, ExpandReport, apply_filter, expand_sections, extract_blocks, scroll_page,
};
pub use profile::SiteProfile;
pub use session::{AuthOutcome, LoginPacing, bootstrap, classify_landing};
