//! Graceful degradation for pricing passes
//!
//! This module provides:
//! - Input-preserving fallback for post-processing stages
//! - Partial-success bookkeeping for the rows and stages of one pass
//!
//! A pass never fails as a whole: a bad row contributes no items and a
//! failing stage hands its input through unchanged.

mod fallback;
mod partial_success;

pub use fallback::{FallbackExecutor, FallbackOutcome};
pub use partial_success::{PassDiagnostics, RowFailure, StageFallback};
