// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating the run at which a test's currently relevant failure began.
//!
//! A lingering failure may have had an earlier false recovery; when the
//! learner asks to jump to the break point, they want the *most recent*
//! regression, not the very first failure. The resolver encodes that
//! preference and falls back to the latest interval otherwise.

use crate::{history::TestHistories, timeline::RunTimeline};
use serde::Serialize;
use testlight_metadata::{EpisodeId, TestId};

/// Where a test's currently relevant failure began.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOrigin {
    /// The run at which the failure interval began.
    pub run_number: u32,

    /// The episode owning that run.
    pub episode_id: EpisodeId,

    /// Whether the selected interval is a regression.
    pub is_regression: bool,
}

/// Resolves failure origins against a timeline and its derived histories.
#[derive(Clone, Copy, Debug)]
pub struct OriginResolver<'a> {
    timeline: &'a RunTimeline,
    histories: &'a TestHistories,
}

impl<'a> OriginResolver<'a> {
    /// Creates a resolver over a timeline and the histories derived from it.
    pub fn new(timeline: &'a RunTimeline, histories: &'a TestHistories) -> Self {
        Self {
            timeline,
            histories,
        }
    }

    /// Returns where the test's currently relevant failure began, or `None`
    /// if the test has no failure intervals.
    ///
    /// For a lingering failure with at least one regression interval, the
    /// *last* such regression interval wins; otherwise the last interval of
    /// any kind. If the interval's start run cannot be found in the timeline
    /// (inconsistent data), the first episode's id is used as a fallback
    /// rather than failing.
    pub fn resolve(&self, test_id: &TestId) -> Option<FailureOrigin> {
        let history = self.histories.get(test_id)?;

        let interval = if history.is_lingering_failure {
            history
                .last_regression_interval()
                .or_else(|| history.last_interval())
        } else {
            history.last_interval()
        }?;

        let episode_id = match self.timeline.run_by_number(interval.start_run) {
            Some(run) => run.episode_id.clone(),
            None => {
                tracing::warn!(
                    test = %test_id,
                    run = interval.start_run,
                    "failure origin run not found in timeline, falling back to first episode",
                );
                self.timeline.first_episode_id()?.clone()
            }
        };

        Some(FailureOrigin {
            run_number: interval.start_run,
            episode_id,
            is_regression: interval.is_regression,
        })
    }
}
