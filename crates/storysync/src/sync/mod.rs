//! Batch jobs over the fetched tracker data.
//!
//! # Module Structure
//!
//! - [`types`] - Options, results, [`CancellationFlag`] and [`DuplicatePlan`]
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - `link` - Idempotent linker: [`link_issues`]
//! - `import` - Cutoff-filtered import: [`import_issues`]
//! - `sweep` - Duplicate sweep: [`plan_duplicates`], [`sweep_duplicates`]
//!
//! Every job runs sequentially in fetch order and checks the cancellation
//! flag before each item.
//!
//! # Example
//!
//! ```ignore
//! use storysync::sync::{CancellationFlag, SweepOptions, sweep_duplicates};
//!
//! let result = sweep_duplicates(&taiga, &SweepOptions { dry_run: true }, &CancellationFlag::new(), None).await?;
//! println!("{} duplicates", result.duplicates);
//! ```

mod import;
mod link;
pub mod progress;
mod sweep;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use types::{
    CancellationFlag, DuplicateGroup, DuplicatePlan, ImportOptions, LinkOptions, LinkResult,
    SweepOptions, SweepResult,
};

pub use progress::{ProgressCallback, SkipReason, SyncProgress, emit};

pub use import::import_issues;
pub use link::link_issues;
pub use sweep::{plan_duplicates, sweep_duplicates};
