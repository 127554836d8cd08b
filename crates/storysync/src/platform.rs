//! Tracker-agnostic records and client traits.
//!
//! The sync jobs only see [`IssueSource`] and [`StoryTarget`], so the same
//! linker drives Taiga-to-Taiga linking and the GitHub import.
//!
//! # Example
//!
//! ```ignore
//! use storysync::platform::{StoryTarget, TargetStory};
//!
//! async fn print_stories<T: StoryTarget>(target: &T) -> Result<(), storysync::FetchError> {
//!     for story in target.list_user_stories(None).await? {
//!         println!("#{} {}", story.reference, story.subject);
//!     }
//!     Ok(())
//! }
//! ```

mod types;

pub use types::{
    ExternalReference, IssueSource, NewUserStory, SourceIssue, StoryTarget, TargetStory,
};
