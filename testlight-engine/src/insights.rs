// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fully-computed insight snapshot published to consumers.
//!
//! Recomputation is wholesale: whenever a new payload loads, the entire
//! pipeline runs again and a fresh snapshot replaces the old one. Consumers
//! only ever see a snapshot that has been computed to completion, so
//! concurrent reads never observe partial state.

use crate::{
    errors::InsightsError,
    highlights::{FailureHighlights, HighlightCategory, HighlightClassifier},
    history::{TestHistories, TestHistory},
    origin::{FailureOrigin, OriginResolver},
    timeline::RunTimeline,
};
use serde::Serialize;
use testlight_metadata::{PlaybackData, TestId};

/// Everything derived from one playback payload: the flattened timeline, the
/// per-test histories, and the highlight lists.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackInsights {
    #[serde(skip)]
    timeline: RunTimeline,
    test_histories: TestHistories,
    failure_highlights: FailureHighlights,
}

impl PlaybackInsights {
    /// Runs the full pipeline over a payload with the default classifier.
    pub fn compute(data: &PlaybackData) -> Self {
        Self::compute_with(data, &HighlightClassifier::default())
    }

    /// Runs the full pipeline with a custom [`HighlightClassifier`].
    pub fn compute_with(data: &PlaybackData, classifier: &HighlightClassifier) -> Self {
        let timeline = RunTimeline::build(data);
        let mut histories = TestHistories::build(&timeline);
        let highlights = classifier.classify(&mut histories);
        Self {
            timeline,
            test_histories: histories,
            failure_highlights: highlights,
        }
    }

    /// Parses a JSON payload and computes insights over it.
    ///
    /// This is the boundary where structural problems in the payload surface
    /// as errors; see [`InsightsError`].
    pub fn from_json(input: &str) -> Result<Self, InsightsError> {
        let data = PlaybackData::from_json(input)?;
        Ok(Self::compute(&data))
    }

    /// The flattened run timeline.
    pub fn timeline(&self) -> &RunTimeline {
        &self.timeline
    }

    /// The per-test histories, in first-observation order.
    pub fn histories(&self) -> &TestHistories {
        &self.test_histories
    }

    /// The bounded highlight lists.
    pub fn highlights(&self) -> &FailureHighlights {
        &self.failure_highlights
    }

    /// One test's history, if the test was ever observed.
    pub fn history(&self, test_id: &TestId) -> Option<&TestHistory> {
        self.test_histories.get(test_id)
    }

    /// The histories surfaced under one highlight category, in list order —
    /// score-ranked for the capped categories, first-observation order for
    /// still-failing.
    pub fn highlighted_histories(&self, category: HighlightCategory) -> Vec<&TestHistory> {
        self.failure_highlights
            .ids_for(category)
            .iter()
            .filter_map(|test_id| self.test_histories.get(test_id))
            .collect()
    }

    /// Returns true if the test is surfaced in any highlight list.
    pub fn is_highlighted(&self, test_id: &TestId) -> bool {
        self.failure_highlights.is_highlighted(test_id)
    }

    /// The category under which a test is surfaced, if any.
    pub fn category_of(&self, test_id: &TestId) -> Option<HighlightCategory> {
        self.failure_highlights.category_of(test_id)
    }

    /// Total number of surfaced tests.
    pub fn total_highlights(&self) -> usize {
        self.failure_highlights.total()
    }

    /// Returns true if any test is surfaced.
    pub fn has_highlights(&self) -> bool {
        !self.failure_highlights.is_empty()
    }

    /// An origin resolver borrowing this snapshot.
    pub fn origin_resolver(&self) -> OriginResolver<'_> {
        OriginResolver::new(&self.timeline, &self.test_histories)
    }

    /// Where the test's currently relevant failure began, if it ever failed.
    pub fn failure_origin(&self, test_id: &TestId) -> Option<FailureOrigin> {
        self.origin_resolver().resolve(test_id)
    }
}
