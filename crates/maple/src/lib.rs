#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/maple/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod universe;

// Re-export main types from sub-crates
pub use maple_data as data;
pub use maple_metrics as metrics;
pub use maple_output as output;

// Re-export common universe types
pub use universe::{Universe, gics::GicsSector, tsx::Constituent, tsx::TsxUniverse};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
