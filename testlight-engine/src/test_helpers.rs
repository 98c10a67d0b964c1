// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared constructors for engine tests.

use testlight_metadata::{
    Episode, EpisodeTestData, PlaybackData, RunSummary, TestResult, TestRun, TestStatus,
};

pub(crate) fn result(id: &str, status: TestStatus) -> TestResult {
    TestResult::new(id, id, status)
}

pub(crate) fn run(results: Vec<TestResult>) -> TestRun {
    TestRun {
        results,
        ..TestRun::default()
    }
}

/// Like [`run`], but with a summary tallied from the results and the given
/// producer-reported total.
pub(crate) fn run_with_summary(results: Vec<TestResult>, total: u32) -> TestRun {
    let mut summary = RunSummary {
        total: Some(total),
        ..RunSummary::default()
    };
    for result in &results {
        match result.status {
            TestStatus::Pass => summary.passed += 1,
            TestStatus::Fail => summary.failed += 1,
            TestStatus::Error => summary.errored += 1,
            TestStatus::Skip => summary.skipped += 1,
            TestStatus::Unknown => {}
        }
    }
    TestRun {
        summary,
        results,
        ..TestRun::default()
    }
}

pub(crate) fn episode(id: &str, label: &str) -> Episode {
    Episode::new(id, label)
}

/// Builds a payload with one `EpisodeTestData` entry per episode.
pub(crate) fn payload(episodes: Vec<(&str, Vec<TestRun>)>) -> PlaybackData {
    PlaybackData {
        episodes: episodes.iter().map(|(id, _)| episode(id, id)).collect(),
        episode_test_data: episodes
            .into_iter()
            .map(|(id, runs)| EpisodeTestData {
                episode_id: id.into(),
                runs,
            })
            .collect(),
    }
}

/// Builds a single-episode payload where run `i` carries the `i`-th status of
/// every listed test. `None` means the test was absent from that run.
pub(crate) fn payload_from_statuses(tests: &[(&str, &[Option<TestStatus>])]) -> PlaybackData {
    let run_count = tests
        .iter()
        .map(|(_, statuses)| statuses.len())
        .max()
        .unwrap_or(0);

    let runs = (0..run_count)
        .map(|run_ix| {
            let results = tests
                .iter()
                .filter_map(|(id, statuses)| {
                    statuses
                        .get(run_ix)
                        .copied()
                        .flatten()
                        .map(|status| result(id, status))
                })
                .collect();
            run(results)
        })
        .collect();

    payload(vec![("ep-1", runs)])
}

/// Dense variant of [`payload_from_statuses`]: every test observed every run.
pub(crate) fn payload_from_dense_statuses(tests: &[(&str, &[TestStatus])]) -> PlaybackData {
    let tests: Vec<(&str, Vec<Option<TestStatus>>)> = tests
        .iter()
        .map(|(id, statuses)| (*id, statuses.iter().map(|s| Some(*s)).collect()))
        .collect();
    let borrowed: Vec<(&str, &[Option<TestStatus>])> = tests
        .iter()
        .map(|(id, statuses)| (*id, statuses.as_slice()))
        .collect();
    payload_from_statuses(&borrowed)
}
