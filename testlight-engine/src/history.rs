// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test status histories and failure-interval derivation.
//!
//! This is the analytical core of the engine. For every test observed
//! anywhere in the timeline it derives an ordered status sequence, the
//! maximal contiguous failure intervals within it, regression and lingering
//! flags, a flip count, and a meaningfulness score used to rank highlights.
//!
//! All derivation is a single forward walk per test over its *observed* runs:
//! a test absent from a run simply has no entry for that run number, and the
//! walk continues across the gap.

use crate::{highlights::HighlightCategory, timeline::RunTimeline};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use testlight_metadata::{TestId, TestStatus};

/// A maximal contiguous span of observed runs in which a test was failing.
///
/// `duration` counts the observed failing runs in the span. An interval that
/// is still open at the final run of the timeline has `end_run == None` and
/// `is_lingering == true`; a closed interval ends at the run number
/// immediately preceding the observation that closed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInterval {
    /// Run number where the failing status first appeared.
    pub start_run: u32,

    /// Run number of the last run in the interval, or `None` while open.
    pub end_run: Option<u32>,

    /// Count of observed failing runs in the interval, at least 1.
    pub duration: u32,

    /// True iff the interval reaches the final run of the timeline.
    pub is_lingering: bool,

    /// True iff the test's previous observed status was a pass. A test that
    /// failed from its very first observed run is not a regression.
    pub is_regression: bool,
}

/// Everything derived about one test across the whole timeline.
///
/// Histories are immutable once published; `highlight_category` is the one
/// field filled in afterwards by the
/// [`HighlightClassifier`](crate::highlights::HighlightClassifier), before
/// the containing snapshot is exposed to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestHistory {
    /// The stable test identifier.
    pub test_id: TestId,

    /// The display name, taken from the first observation.
    pub test_name: String,

    /// Observed status per run number. Sparse: only runs in which the test
    /// was present have an entry.
    pub status_by_run: BTreeMap<u32, TestStatus>,

    /// Failure intervals in chronological order. At most the last one is
    /// open.
    pub failure_intervals: Vec<FailureInterval>,

    /// True iff the final failure interval is still open at the last run.
    pub is_lingering_failure: bool,

    /// True iff any failure interval is a regression.
    pub is_regression: bool,

    /// Number of failure intervals: how many separate times the test broke.
    pub recurs_count: usize,

    /// Count of observed adjacent-run transitions between failing and
    /// non-failing.
    pub flips_within: u32,

    /// Count of observed runs with a failing status.
    pub total_failed_runs: u32,

    /// Heuristic ranking score; may be negative. See the module docs of
    /// [`crate::highlights`] for how it is consumed.
    pub meaningfulness_score: i64,

    /// The highlight category assigned to this test, if any.
    pub highlight_category: Option<HighlightCategory>,
}

impl TestHistory {
    /// The observed status at a run number, if the test ran then.
    pub fn status_at(&self, run_number: u32) -> Option<TestStatus> {
        self.status_by_run.get(&run_number).copied()
    }

    /// True if the test was observed failing at this run number.
    pub fn is_failing_at(&self, run_number: u32) -> bool {
        self.status_at(run_number).is_some_and(TestStatus::is_failing)
    }

    /// The last observed status, if any.
    pub fn final_status(&self) -> Option<TestStatus> {
        self.status_by_run.values().next_back().copied()
    }

    /// The first failure interval, if any.
    pub fn first_interval(&self) -> Option<&FailureInterval> {
        self.failure_intervals.first()
    }

    /// The most recent failure interval, if any.
    pub fn last_interval(&self) -> Option<&FailureInterval> {
        self.failure_intervals.last()
    }

    /// The most recent failure interval flagged as a regression, if any.
    pub fn last_regression_interval(&self) -> Option<&FailureInterval> {
        self.failure_intervals
            .iter()
            .rev()
            .find(|interval| interval.is_regression)
    }

    /// The longest interval duration, or 0 with no intervals.
    pub fn max_interval_duration(&self) -> u32 {
        self.failure_intervals
            .iter()
            .map(|interval| interval.duration)
            .max()
            .unwrap_or(0)
    }
}

/// Observed statuses for one test, accumulated before derivation.
struct RecordedStatuses {
    name: String,
    status_by_run: BTreeMap<u32, TestStatus>,
}

/// The per-test histories for a whole timeline, keyed by test id in
/// first-observation order.
///
/// First-observation order is the canonical iteration order: the classifier
/// relies on it for stable tie-breaking, and the unsorted `stillFailing`
/// highlight list is emitted in it.
#[derive(Clone, Debug, PartialEq)]
pub struct TestHistories {
    histories: IndexMap<TestId, TestHistory>,
}

impl TestHistories {
    /// Derives a history for every test observed anywhere in the timeline.
    ///
    /// Tests never observed do not appear at all — no empty histories are
    /// synthesized. Building is deterministic: the same timeline always
    /// yields structurally identical histories, in the same order.
    pub fn build(timeline: &RunTimeline) -> Self {
        let mut recorded: IndexMap<TestId, RecordedStatuses> = IndexMap::new();
        for run in timeline.runs() {
            for result in &run.results {
                recorded
                    .entry(result.id.clone())
                    .or_insert_with(|| RecordedStatuses {
                        name: result.name.clone(),
                        status_by_run: BTreeMap::new(),
                    })
                    .status_by_run
                    .insert(run.run_number, result.status);
            }
        }

        let histories: IndexMap<TestId, TestHistory> = recorded
            .into_iter()
            .map(|(test_id, statuses)| {
                let history = derive_history(test_id.clone(), statuses);
                (test_id, history)
            })
            .collect();

        tracing::debug!(tests = histories.len(), "derived test histories");
        Self { histories }
    }

    /// Looks up one test's history.
    pub fn get(&self, test_id: &TestId) -> Option<&TestHistory> {
        self.histories.get(test_id)
    }

    /// Returns true if the test was observed in the timeline.
    pub fn contains(&self, test_id: &TestId) -> bool {
        self.histories.contains_key(test_id)
    }

    /// Iterates histories in first-observation order.
    pub fn iter(&self) -> impl Iterator<Item = (&TestId, &TestHistory)> {
        self.histories.iter()
    }

    /// Iterates history values in first-observation order.
    pub fn values(&self) -> impl Iterator<Item = &TestHistory> {
        self.histories.values()
    }

    /// Number of distinct tests observed.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Returns true if no test was observed anywhere.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Histories with a positive meaningfulness score, highest first. Ties
    /// keep first-observation order.
    pub fn ranked_by_score(&self) -> Vec<&TestHistory> {
        let mut ranked: Vec<_> = self
            .values()
            .filter(|history| history.meaningfulness_score > 0)
            .collect();
        ranked.sort_by_key(|history| std::cmp::Reverse(history.meaningfulness_score));
        ranked
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&TestId, &mut TestHistory)> {
        self.histories.iter_mut()
    }
}

impl Serialize for TestHistories {
    // Serialized as a sequence of histories, matching the payload producers'
    // `testHistories` array shape.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.histories.values())
    }
}

/// Walks one test's observed statuses in run order and derives its history.
fn derive_history(test_id: TestId, recorded: RecordedStatuses) -> TestHistory {
    let RecordedStatuses {
        name,
        status_by_run,
    } = recorded;

    let mut intervals: Vec<FailureInterval> = Vec::new();
    let mut open: Option<FailureInterval> = None;
    let mut previous_status: Option<TestStatus> = None;
    let mut total_failed_runs = 0u32;

    for (&run_number, &status) in &status_by_run {
        if status.is_failing() {
            total_failed_runs += 1;
            match open.as_mut() {
                Some(interval) => interval.duration += 1,
                None => {
                    open = Some(FailureInterval {
                        start_run: run_number,
                        end_run: None,
                        duration: 1,
                        is_lingering: false,
                        is_regression: previous_status.is_some_and(TestStatus::is_passing),
                    });
                }
            }
        } else if let Some(mut interval) = open.take() {
            // Any non-failing observation (pass, skip, or unrecognized)
            // closes the interval at the preceding run number.
            interval.end_run = Some(run_number - 1);
            intervals.push(interval);
        }
        previous_status = Some(status);
    }

    let is_lingering_failure = match open.take() {
        Some(mut interval) => {
            interval.is_lingering = true;
            intervals.push(interval);
            true
        }
        None => false,
    };

    let flips_within = status_by_run
        .values()
        .tuple_windows()
        .filter(|(a, b)| a.is_failing() != b.is_failing())
        .count() as u32;

    let recurs_count = intervals.len();
    let is_regression = intervals.iter().any(|interval| interval.is_regression);
    let max_duration = intervals
        .iter()
        .map(|interval| interval.duration)
        .max()
        .unwrap_or(0);
    let meaningfulness_score =
        meaningfulness_score(is_lingering_failure, recurs_count, max_duration);

    TestHistory {
        test_id,
        test_name: name,
        status_by_run,
        failure_intervals: intervals,
        is_lingering_failure,
        is_regression,
        recurs_count,
        flips_within,
        total_failed_runs,
        meaningfulness_score,
        highlight_category: None,
    }
}

/// Heuristic ranking of how much a test's failure history matters.
///
/// Lingering failures dominate; recurring breakage and long streaks add;
/// a single short, already-fixed blip is penalized so it doesn't crowd out
/// meaningful signals. Deterministic, unbounded in both directions.
fn meaningfulness_score(is_lingering: bool, recurs_count: usize, max_duration: u32) -> i64 {
    let mut score = 0i64;
    if is_lingering {
        score += 100;
    }
    if recurs_count > 1 {
        score += 50 * (recurs_count as i64 - 1);
    }
    score += 10 * i64::from(max_duration);
    if !is_lingering && recurs_count == 1 && max_duration <= 2 {
        score -= 50;
    }
    score
}
