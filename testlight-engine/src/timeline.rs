// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattening of episode-grouped runs into a globally-numbered timeline.
//!
//! The payload groups runs by episode; everything downstream wants one flat,
//! ordered sequence. [`RunTimeline::build`] walks episodes in payload order
//! and their runs in recorded order, assigning each run a 1-based
//! `run_number` strictly in traversal order. Timestamps and producer-supplied
//! run numbers are carried for display but never consulted for ordering.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::cmp::Ordering;
use testlight_metadata::{Episode, EpisodeId, PlaybackData, RunSummary, TestResult};

/// A single run in the flattened timeline.
///
/// `run_number` is 1-based and gapless across the whole timeline;
/// `global_index` is its 0-based position, so `global_index == run_number - 1`
/// always holds.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRun {
    /// Global 1-based run number, assigned in traversal order.
    pub run_number: u32,

    /// 0-based position in the flat sequence.
    pub global_index: usize,

    /// The episode this run belongs to.
    pub episode_id: EpisodeId,

    /// The ordinal position of the owning episode in the payload.
    pub episode_index: usize,

    /// When this run started, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Producer-reported status counts for this run.
    pub summary: RunSummary,

    /// Per-test outcomes, in the producer's order.
    pub results: Vec<TestResult>,
}

impl FlatRun {
    /// Recomputes status counts from this run's results.
    pub fn counts(&self) -> RunCounts {
        RunCounts::tally(&self.results)
    }

    /// Splits and orders this run's results for display: results whose status
    /// changed this run first (failing before passing, then by name),
    /// followed by the rest under the same ordering.
    pub fn sorted_results(&self) -> SortedRunResults<'_> {
        let (mut changed, mut other): (Vec<_>, Vec<_>) =
            self.results.iter().partition(|r| r.changed_this_run);
        changed.sort_by(|a, b| display_order(a, b));
        other.sort_by(|a, b| display_order(a, b));
        SortedRunResults { changed, other }
    }
}

/// Failing results sort ahead of non-failing ones, then by display name.
fn display_order(a: &TestResult, b: &TestResult) -> Ordering {
    b.status
        .is_failing()
        .cmp(&a.status.is_failing())
        .then_with(|| a.name.cmp(&b.name))
}

/// A run's results split into "changed this run" and "everything else",
/// each in display order. See [`FlatRun::sorted_results`].
#[derive(Clone, Debug)]
pub struct SortedRunResults<'a> {
    /// Results whose status changed this run, newly-failing first.
    pub changed: Vec<&'a TestResult>,

    /// All other results, failing first.
    pub other: Vec<&'a TestResult>,
}

/// Status counts recomputed from a run's results.
///
/// Unlike [`RunSummary`], which is whatever the producer claimed, these are
/// tallied from the results actually present in the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    /// Number of passing results.
    pub passed: u32,
    /// Number of failing results.
    pub failed: u32,
    /// Number of errored results.
    pub errored: u32,
    /// Number of skipped results.
    pub skipped: u32,
    /// Number of results with a status this crate doesn't recognize.
    pub unrecognized: u32,
}

impl RunCounts {
    /// Tallies counts over a result slice.
    pub fn tally(results: &[TestResult]) -> Self {
        use testlight_metadata::TestStatus;

        let mut counts = Self::default();
        for result in results {
            match result.status {
                TestStatus::Pass => counts.passed += 1,
                TestStatus::Fail => counts.failed += 1,
                TestStatus::Error => counts.errored += 1,
                TestStatus::Skip => counts.skipped += 1,
                TestStatus::Unknown => counts.unrecognized += 1,
            }
        }
        counts
    }

    /// Total number of tallied results.
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.errored + self.skipped + self.unrecognized
    }

    /// Returns true if the producer-reported summary agrees with this tally.
    pub fn matches_summary(&self, summary: &RunSummary) -> bool {
        self.passed == summary.passed
            && self.failed == summary.failed
            && self.errored == summary.errored
            && self.skipped == summary.skipped
    }
}

/// One data point of the per-run progress series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    /// The episode this run belongs to.
    pub episode_id: EpisodeId,

    /// The owning episode's label, falling back to its id.
    pub label: String,

    /// Global run number.
    pub run_number: u32,

    /// Number of passing tests in this run.
    pub pass_count: u32,

    /// Total number of tests in this run.
    pub total_tests: u32,
}

/// The flattened run sequence for a playback session.
#[derive(Clone, Debug, PartialEq)]
pub struct RunTimeline {
    episodes: Vec<Episode>,
    runs: Vec<FlatRun>,
}

impl RunTimeline {
    /// Flattens a payload into a globally-numbered run sequence.
    ///
    /// Episodes are visited in payload order and their runs in recorded
    /// order. Episodes without run data contribute nothing and do not break
    /// numbering continuity; run data for episodes absent from `episodes` is
    /// dropped with a warning. This is a pure reshape — no input, however
    /// incomplete, makes it fail.
    pub fn build(data: &PlaybackData) -> Self {
        let mut runs = Vec::new();

        for (episode_index, episode) in data.episodes.iter().enumerate() {
            let Some(episode_data) = data
                .episode_test_data
                .iter()
                .find(|entry| entry.episode_id == episode.id)
            else {
                tracing::debug!(episode = %episode.id, "episode has no recorded runs");
                continue;
            };

            for run in &episode_data.runs {
                let flat = FlatRun {
                    run_number: (runs.len() + 1) as u32,
                    global_index: runs.len(),
                    episode_id: episode.id.clone(),
                    episode_index,
                    timestamp: run.timestamp,
                    summary: run.summary,
                    results: run.results.clone(),
                };
                if !flat.counts().matches_summary(&flat.summary) {
                    tracing::warn!(
                        run = flat.run_number,
                        episode = %flat.episode_id,
                        "producer summary disagrees with recorded results",
                    );
                }
                runs.push(flat);
            }
        }

        for entry in &data.episode_test_data {
            if !data.episodes.iter().any(|ep| ep.id == entry.episode_id) {
                tracing::warn!(
                    episode = %entry.episode_id,
                    runs = entry.runs.len(),
                    "dropping run data for an episode not present in the payload",
                );
            }
        }

        tracing::debug!(
            episodes = data.episodes.len(),
            runs = runs.len(),
            "flattened playback timeline",
        );

        Self {
            episodes: data.episodes.clone(),
            runs,
        }
    }

    /// The flattened runs, in global order.
    pub fn runs(&self) -> &[FlatRun] {
        &self.runs
    }

    /// The episodes, in payload order (including those without runs).
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Total number of runs in the timeline.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns true if the timeline contains no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Looks up a run by its global 1-based run number.
    pub fn run_by_number(&self, run_number: u32) -> Option<&FlatRun> {
        // Numbering is gapless, so the run number is also the index + 1.
        let index = run_number.checked_sub(1)? as usize;
        self.runs.get(index)
    }

    /// Looks up a run by its 0-based global index.
    pub fn run_by_index(&self, global_index: usize) -> Option<&FlatRun> {
        self.runs.get(global_index)
    }

    /// Returns the global index for a run number, if the run exists.
    pub fn global_index_for_run_number(&self, run_number: u32) -> Option<usize> {
        self.run_by_number(run_number).map(|run| run.global_index)
    }

    /// Looks up an episode by id.
    pub fn episode(&self, id: &EpisodeId) -> Option<&Episode> {
        self.episodes.iter().find(|ep| &ep.id == id)
    }

    /// The first episode's id, used as a fallback when a run number cannot
    /// be resolved to an owning episode.
    pub fn first_episode_id(&self) -> Option<&EpisodeId> {
        self.episodes.first().map(|ep| &ep.id)
    }

    /// The per-run progress series for the whole timeline: pass counts out of
    /// the producer-reported totals, labeled by owning episode.
    pub fn progress_points(&self) -> Vec<ProgressPoint> {
        self.runs
            .iter()
            .map(|run| {
                let label = self
                    .episode(&run.episode_id)
                    .map(|ep| ep.label.clone())
                    .unwrap_or_else(|| run.episode_id.to_string());
                ProgressPoint {
                    episode_id: run.episode_id.clone(),
                    label,
                    run_number: run.run_number,
                    pass_count: run.summary.passed,
                    total_tests: run
                        .summary
                        .total
                        .unwrap_or_else(|| run.results.len() as u32),
                }
            })
            .collect()
    }
}
