#![forbid(unsafe_code)]
//! Drivestage: staged, reviewable batches of mutations for a remote file store.
//!
//! Model highlights:
//! - A [`Snapshot`](snapshot::Snapshot) is a virtual local view of a remote
//!   subtree: mutations are validated against the cached view, queued, and
//!   applied to the view optimistically. No network call happens until apply.
//! - [`Manager::build_plan`](api::Manager::build_plan) turns the queued
//!   actions into an immutable [`SyncPlan`](types::SyncPlan) with deletion
//!   runs ordered deepest-first.
//! - [`Manager::apply_plan`](api::Manager::apply_plan) executes the plan
//!   sequentially against a [`RemoteStore`](adapters::RemoteStore), detecting
//!   concurrent modification per operation and isolating failures: conflicts
//!   are recorded and skipped past, fatal errors abort the remainder.

pub mod adapters;
pub mod api;
pub mod constants;
pub mod logging;
pub mod snapshot;
pub mod types;

pub use api::*;
