//! Contains the building blocks for per-tournament clock timing.
//!
//! This module provides the volatile timing record (`ClockState`) and the
//! keyed, per-tournament locked storage that holds it (`ClockStore`). The
//! `ClockEngine` is the only component that mutates either.

pub mod state;
pub mod store;
