//! Glue between the command line and the data, metrics and output crates.
//!
//! This module opens the cache, builds the provider, wraps slow downloads in
//! progress spinners and resolves free-text stock queries.

pub(crate) mod cache_manager;
pub(crate) mod pipeline;
pub(crate) mod resolve;
