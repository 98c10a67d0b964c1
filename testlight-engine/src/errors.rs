// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the insight engine.
//!
//! The engine itself is total: every anomaly in a well-typed payload (empty
//! timelines, sparse tests, unknown statuses, disagreeing summaries) produces
//! a documented value, at most with a `tracing` warning. The only fallible
//! step is deserializing the payload in the first place.

use testlight_metadata::PayloadParseError;
use thiserror::Error;

/// An error that occurred while building playback insights from raw JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InsightsError {
    /// The payload was not deserializable — a structural problem such as
    /// `episodes` not being a sequence. Data-quality issues never surface
    /// here; they are tolerated with documented defaults.
    #[error("failed to parse playback payload")]
    Parse(#[from] PayloadParseError),
}
