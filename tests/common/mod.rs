//! Common test infrastructure
//!
//! Builds temporary artist databases, datasets and image pipelines for the
//! end-to-end tests. Tests should only import from this module, not from
//! internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestWorkspace, PROVIDED_DATASET};
//!
//! #[test]
//! fn test_migrate() {
//!     let workspace = TestWorkspace::new();
//!     let records = workspace.write_dataset(PROVIDED_DATASET);
//!     let report = workspace.runner().run(&records);
//!     assert_eq!(report.errors(), 0);
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    artist_with_image, sample_png, FailingThumbnailer, PngFetcher, RecordingPacer, TestWorkspace,
};
