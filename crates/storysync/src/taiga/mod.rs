//! Taiga API client.
//!
//! Taiga is both the target tracker (user stories) and, for the story linker,
//! the source tracker (issues). Collections are fetched in one round-trip
//! with pagination disabled.
//!
//! # Module Structure
//!
//! - [`types`] - Wire types for issues and user stories
//! - `client` - [`TaigaClient`], login and the platform trait impls
//! - `convert` - Conversion to tracker-agnostic records

mod client;
mod convert;
pub mod types;

pub use client::{DEFAULT_API_URL, TaigaClient};
pub use convert::{to_source_issue, to_target_story};
pub use types::{TaigaIssue, TaigaUserStory};
