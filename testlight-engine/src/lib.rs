// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Failure-interval analysis over test-run playback timelines.
//!
//! The engine consumes a [`PlaybackData`](testlight_metadata::PlaybackData)
//! payload — episodes of recorded test runs — and derives everything the
//! playback surface needs to explain a debugging session:
//!
//! 1. [`timeline::RunTimeline`] flattens episodes into one globally-numbered
//!    run sequence.
//! 2. [`history::TestHistories`] builds a per-test status history and derives
//!    contiguous failure intervals, regression flags, flip counts, and a
//!    meaningfulness score.
//! 3. [`highlights::HighlightClassifier`] maps each history to at most one
//!    highlight category and assembles bounded, ranked lists.
//! 4. [`origin::OriginResolver`] locates the run at which a test's currently
//!    relevant failure began.
//!
//! [`insights::PlaybackInsights`] runs the whole pipeline and publishes the
//! result as a single immutable snapshot. Everything here is pure,
//! synchronous computation: the same payload always produces the same
//! output, and no partially-constructed state is ever exposed to callers.

pub mod errors;
pub mod highlights;
pub mod history;
pub mod insights;
pub mod origin;
pub mod timeline;

#[cfg(test)]
mod test_helpers;
