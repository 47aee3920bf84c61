//! Inference over expert queries.
//!
//! Two pieces live here:
//!
//! - [`hs_test`]: the hanging-safe test guarding acceptance of positive answers.
//! - [`closure`]: the forward-chaining closure of accepted queries under the
//!   inference rules IR1–IR4, run to a fixpoint.

pub mod closure;

pub use closure::{ClosureReport, InferenceRule, close};
pub use hs_test::hs_test;
