// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Highlight classification and bounded list assembly.
//!
//! The playback surface is a bounded attention surface: it shows every
//! lingering failure (the most actionable signal) but caps the two
//! "interesting but not critical" categories so they don't overwhelm a
//! learner. Classification assigns each history at most one category, in
//! strict precedence order; list assembly ranks the capped categories by
//! meaningfulness score with a stable sort, so ties keep first-observation
//! order.

use crate::history::{TestHistories, TestHistory};
use serde::Serialize;
use std::cmp::Reverse;
use testlight_metadata::TestId;

/// Default cap on the `regressions` highlight list.
pub const DEFAULT_MAX_REGRESSIONS: usize = 3;

/// Default cap on the `costlyDetours` highlight list.
pub const DEFAULT_MAX_COSTLY_DETOURS: usize = 2;

/// The highlight category assigned to a test, at most one per test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightCategory {
    /// The test is still failing at the final run.
    StillFailing,
    /// The test broke more than once.
    Regression,
    /// A single regression that took more than 3 runs to fix.
    CostlyDetour,
}

impl HighlightCategory {
    /// Returns the canonical wire string for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightCategory::StillFailing => "stillFailing",
            HighlightCategory::Regression => "regression",
            HighlightCategory::CostlyDetour => "costlyDetour",
        }
    }
}

impl std::fmt::Display for HighlightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bounded highlight lists surfaced to the learner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureHighlights {
    /// Every test still failing at the final run, in first-observation
    /// order. Unbounded.
    pub still_failing: Vec<TestId>,

    /// Tests that broke more than once, best-ranked first. Capped.
    pub regressions: Vec<TestId>,

    /// Single long-to-fix regressions, best-ranked first. Capped.
    pub costly_detours: Vec<TestId>,
}

impl FailureHighlights {
    /// The list for one category.
    pub fn ids_for(&self, category: HighlightCategory) -> &[TestId] {
        match category {
            HighlightCategory::StillFailing => &self.still_failing,
            HighlightCategory::Regression => &self.regressions,
            HighlightCategory::CostlyDetour => &self.costly_detours,
        }
    }

    /// The category under which a test is surfaced, if any.
    pub fn category_of(&self, test_id: &TestId) -> Option<HighlightCategory> {
        [
            HighlightCategory::StillFailing,
            HighlightCategory::Regression,
            HighlightCategory::CostlyDetour,
        ]
        .into_iter()
        .find(|category| self.ids_for(*category).contains(test_id))
    }

    /// Returns true if the test is surfaced in any list.
    pub fn is_highlighted(&self, test_id: &TestId) -> bool {
        self.category_of(test_id).is_some()
    }

    /// Total number of surfaced tests across all three lists.
    pub fn total(&self) -> usize {
        self.still_failing.len() + self.regressions.len() + self.costly_detours.len()
    }

    /// Returns true if nothing is surfaced.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Assigns highlight categories and assembles the bounded lists.
///
/// The caps default to the canonical 3 regressions and 2 costly detours;
/// they are adjustable for surfaces with more room.
#[derive(Clone, Debug)]
pub struct HighlightClassifier {
    max_regressions: usize,
    max_costly_detours: usize,
}

impl Default for HighlightClassifier {
    fn default() -> Self {
        Self {
            max_regressions: DEFAULT_MAX_REGRESSIONS,
            max_costly_detours: DEFAULT_MAX_COSTLY_DETOURS,
        }
    }
}

impl HighlightClassifier {
    /// Creates a classifier with the default caps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cap on the `regressions` list.
    pub fn set_max_regressions(&mut self, max: usize) -> &mut Self {
        self.max_regressions = max;
        self
    }

    /// Sets the cap on the `costlyDetours` list.
    pub fn set_max_costly_detours(&mut self, max: usize) -> &mut Self {
        self.max_costly_detours = max;
        self
    }

    /// Classifies every history and assembles the highlight lists.
    ///
    /// Each history's `highlight_category` is filled in here — this is the
    /// last derivation step before a snapshot is published. Precedence:
    /// still-failing wins over recurring breakage, which wins over a costly
    /// detour; everything else gets no category and is not surfaced.
    pub fn classify(&self, histories: &mut TestHistories) -> FailureHighlights {
        let mut still_failing = Vec::new();
        let mut regressions: Vec<(TestId, i64)> = Vec::new();
        let mut costly_detours: Vec<(TestId, i64)> = Vec::new();

        for (test_id, history) in histories.iter_mut() {
            let category = categorize(history);
            history.highlight_category = category;
            match category {
                Some(HighlightCategory::StillFailing) => still_failing.push(test_id.clone()),
                Some(HighlightCategory::Regression) => {
                    regressions.push((test_id.clone(), history.meaningfulness_score));
                }
                Some(HighlightCategory::CostlyDetour) => {
                    costly_detours.push((test_id.clone(), history.meaningfulness_score));
                }
                None => {}
            }
        }

        tracing::debug!(
            still_failing = still_failing.len(),
            regressions = regressions.len(),
            costly_detours = costly_detours.len(),
            "classified failure highlights",
        );

        FailureHighlights {
            still_failing,
            regressions: rank_and_cap(regressions, self.max_regressions),
            costly_detours: rank_and_cap(costly_detours, self.max_costly_detours),
        }
    }
}

/// First matching rule wins; the order is load-bearing.
fn categorize(history: &TestHistory) -> Option<HighlightCategory> {
    if history.is_lingering_failure {
        return Some(HighlightCategory::StillFailing);
    }
    if history.recurs_count > 1 {
        return Some(HighlightCategory::Regression);
    }
    let first = history.first_interval()?;
    (first.is_regression && first.duration > 3).then_some(HighlightCategory::CostlyDetour)
}

/// Stable descending sort by score, truncated to `cap`. Stability keeps
/// first-observation order among equal scores.
fn rank_and_cap(mut scored: Vec<(TestId, i64)>, cap: usize) -> Vec<TestId> {
    scored.sort_by_key(|(_, score)| Reverse(*score));
    scored.truncate(cap);
    scored.into_iter().map(|(test_id, _)| test_id).collect()
}
