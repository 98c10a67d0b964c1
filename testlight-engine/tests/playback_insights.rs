// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end test: JSON payload in, published insight snapshot out.
//!
//! The fixture replays a binary-search-tree assignment debugging session:
//! nine runs across five episodes, seven tests covering every highlight
//! category plus a skip-only test and a quickly-fixed blip.

use pretty_assertions::assert_eq;
use serde_json::json;
use testlight_engine::{
    highlights::HighlightCategory,
    insights::PlaybackInsights,
};
use testlight_metadata::TestId;

/// Status of each test per run (columns are runs 1 through 9).
const STATUS_TABLE: [(&str, &str, [&str; 9]); 7] = [
    ("t1", "testInsertEmpty", ["fail", "pass", "pass", "pass", "pass", "pass", "pass", "pass", "pass"]),
    ("t2", "testInsertSingle", ["fail", "fail", "pass", "pass", "pass", "pass", "pass", "pass", "pass"]),
    ("t3", "testInsertDuplicate", ["pass", "fail", "fail", "fail", "fail", "pass", "pass", "pass", "pass"]),
    ("t4", "testDeleteRoot", ["pass", "pass", "fail", "pass", "pass", "fail", "pass", "pass", "pass"]),
    ("t5", "testBalanceAfterInsert", ["fail", "fail", "fail", "fail", "fail", "fail", "pass", "fail", "fail"]),
    ("t6", "testTraversalInOrder", ["pass", "pass", "pass", "pass", "pass", "pass", "pass", "fail", "error"]),
    ("t7", "testIteratorConcurrent", ["skip", "skip", "skip", "skip", "skip", "skip", "skip", "skip", "skip"]),
];

/// Which runs (1-based) belong to which episode.
const EPISODES: [(&str, &str, &[u32]); 5] = [
    ("ep-1", "Initial", &[1]),
    ("ep-2", "Added insert", &[2, 3]),
    ("ep-3", "Fixed null check", &[4, 5, 6]),
    ("ep-4", "Refactored", &[7, 8]),
    ("ep-5", "Final fixes", &[9]),
];

fn fixture_json() -> String {
    let episodes: Vec<_> = EPISODES
        .iter()
        .map(|(id, label, _)| json!({ "id": id, "label": label }))
        .collect();

    let episode_test_data: Vec<_> = EPISODES
        .iter()
        .map(|(id, _, run_numbers)| {
            let runs: Vec<_> = run_numbers
                .iter()
                .map(|&run_number| {
                    let results: Vec<_> = STATUS_TABLE
                        .iter()
                        .map(|(test_id, name, statuses)| {
                            json!({
                                "id": test_id,
                                "name": name,
                                "status": statuses[(run_number - 1) as usize],
                            })
                        })
                        .collect();
                    let passed = STATUS_TABLE
                        .iter()
                        .filter(|(_, _, s)| s[(run_number - 1) as usize] == "pass")
                        .count();
                    let failed = STATUS_TABLE
                        .iter()
                        .filter(|(_, _, s)| s[(run_number - 1) as usize] == "fail")
                        .count();
                    let errored = STATUS_TABLE
                        .iter()
                        .filter(|(_, _, s)| s[(run_number - 1) as usize] == "error")
                        .count();
                    let skipped = STATUS_TABLE
                        .iter()
                        .filter(|(_, _, s)| s[(run_number - 1) as usize] == "skip")
                        .count();
                    json!({
                        "runNumber": run_number,
                        "summary": {
                            "passed": passed,
                            "failed": failed,
                            "errored": errored,
                            "skipped": skipped,
                            "total": STATUS_TABLE.len(),
                        },
                        "results": results,
                    })
                })
                .collect();
            json!({ "episodeId": id, "runs": runs })
        })
        .collect();

    json!({
        "episodes": episodes,
        "episodeTestData": episode_test_data,
        // Producers also emit context and feedback; the engine ignores them.
        "context": { "assignmentName": "Assignment 3: Binary Search Trees" },
        "feedback": [],
    })
    .to_string()
}

#[test]
fn timeline_numbering_and_episode_mapping() {
    let insights = PlaybackInsights::from_json(&fixture_json()).unwrap();
    let timeline = insights.timeline();

    assert_eq!(timeline.len(), 9);
    for (index, run) in timeline.runs().iter().enumerate() {
        assert_eq!(run.global_index, index);
        assert_eq!(run.run_number as usize, index + 1);
    }
    assert_eq!(timeline.run_by_number(1).unwrap().episode_id.as_str(), "ep-1");
    assert_eq!(timeline.run_by_number(5).unwrap().episode_id.as_str(), "ep-3");
    assert_eq!(timeline.run_by_number(9).unwrap().episode_id.as_str(), "ep-5");
    assert_eq!(timeline.run_by_number(9).unwrap().episode_index, 4);

    let points = timeline.progress_points();
    assert_eq!(points.len(), 9);
    assert_eq!(points[0].label, "Initial");
    assert_eq!(points[0].pass_count, 3);
    assert_eq!(points[0].total_tests, 7);
    assert_eq!(points[6].label, "Refactored");
    assert_eq!(points[6].pass_count, 6);
}

#[test]
fn histories_derive_expected_intervals_and_scores() {
    let insights = PlaybackInsights::from_json(&fixture_json()).unwrap();

    // t3: one long fixed regression, runs 2 through 5.
    let t3 = insights.history(&"t3".into()).unwrap();
    assert_eq!(t3.recurs_count, 1);
    let interval = t3.first_interval().unwrap();
    assert_eq!((interval.start_run, interval.end_run), (2, Some(5)));
    assert_eq!(interval.duration, 4);
    assert!(interval.is_regression);
    assert!(!t3.is_lingering_failure);
    assert_eq!(t3.meaningfulness_score, 40);

    // t4: broke twice, fixed both times.
    let t4 = insights.history(&"t4".into()).unwrap();
    assert_eq!(t4.recurs_count, 2);
    assert!(!t4.is_lingering_failure);
    assert!(t4.is_regression);
    assert_eq!(t4.meaningfulness_score, 60);
    assert_eq!(t4.flips_within, 4);

    // t5: long initial failure, false recovery at run 7, still broken.
    let t5 = insights.history(&"t5".into()).unwrap();
    assert_eq!(t5.recurs_count, 2);
    assert!(t5.is_lingering_failure);
    assert_eq!(t5.failure_intervals[0].end_run, Some(6));
    assert!(!t5.failure_intervals[0].is_regression);
    assert_eq!(t5.failure_intervals[1].end_run, None);
    assert!(t5.failure_intervals[1].is_regression);
    assert_eq!(t5.meaningfulness_score, 210);
    assert_eq!(t5.total_failed_runs, 8);

    // t6: fail then error at the tail; both count as failing.
    let t6 = insights.history(&"t6".into()).unwrap();
    assert_eq!(t6.recurs_count, 1);
    assert!(t6.is_lingering_failure);
    assert_eq!(t6.first_interval().unwrap().duration, 2);
    assert_eq!(t6.meaningfulness_score, 120);

    // t7: only ever skipped — a well-defined, empty history.
    let t7 = insights.history(&"t7".into()).unwrap();
    assert!(t7.failure_intervals.is_empty());
    assert_eq!(t7.total_failed_runs, 0);
    assert_eq!(t7.meaningfulness_score, 0);
    assert_eq!(t7.highlight_category, None);
}

#[test]
fn highlights_are_bounded_ranked_and_exclusive() {
    let insights = PlaybackInsights::from_json(&fixture_json()).unwrap();
    let highlights = insights.highlights();

    let ids = |list: &[TestId]| -> Vec<String> {
        list.iter().map(|id| id.as_str().to_owned()).collect()
    };
    assert_eq!(ids(&highlights.still_failing), ["t5", "t6"]);
    assert_eq!(ids(&highlights.regressions), ["t4"]);
    assert_eq!(ids(&highlights.costly_detours), ["t3"]);

    assert!(highlights.regressions.len() <= 3);
    assert!(highlights.costly_detours.len() <= 2);

    // No test appears in more than one list.
    let mut seen = std::collections::HashSet::new();
    for category in [
        HighlightCategory::StillFailing,
        HighlightCategory::Regression,
        HighlightCategory::CostlyDetour,
    ] {
        for test_id in highlights.ids_for(category) {
            assert!(seen.insert(test_id.clone()));
        }
    }

    // Quickly-fixed blips are not surfaced at all.
    assert!(!insights.is_highlighted(&"t1".into()));
    assert!(!insights.is_highlighted(&"t2".into()));
    assert_eq!(insights.total_highlights(), 4);
}

#[test]
fn origins_resolve_to_the_relevant_break_point() {
    let insights = PlaybackInsights::from_json(&fixture_json()).unwrap();

    // Lingering with a false recovery: jump to the regression at run 8, not
    // the original failure at run 1.
    let t5 = insights.failure_origin(&"t5".into()).unwrap();
    assert_eq!((t5.run_number, t5.episode_id.as_str()), (8, "ep-4"));
    assert!(t5.is_regression);

    // Fixed tests resolve to their latest interval.
    let t4 = insights.failure_origin(&"t4".into()).unwrap();
    assert_eq!((t4.run_number, t4.episode_id.as_str()), (6, "ep-3"));

    let t3 = insights.failure_origin(&"t3".into()).unwrap();
    assert_eq!((t3.run_number, t3.episode_id.as_str()), (2, "ep-2"));

    // A test that never failed has no origin.
    assert_eq!(insights.failure_origin(&"t7".into()), None);
}

#[test]
fn recomputation_is_deterministic() {
    let payload = fixture_json();
    let first = PlaybackInsights::from_json(&payload).unwrap();
    let second = PlaybackInsights::from_json(&payload).unwrap();

    assert_eq!(first, second);
    // Order-sensitive check through the serialized form.
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap(),
    );
}

#[test]
fn serialized_snapshot_matches_the_producer_shape() {
    let insights = PlaybackInsights::from_json(&fixture_json()).unwrap();
    let value = serde_json::to_value(&insights).unwrap();

    let histories = value["testHistories"].as_array().unwrap();
    assert_eq!(histories.len(), 7);
    assert_eq!(histories[0]["testId"], "t1");
    assert_eq!(histories[0]["testName"], "testInsertEmpty");
    assert_eq!(histories[0]["statusByRun"]["1"], "fail");
    assert_eq!(histories[0]["statusByRun"]["2"], "pass");
    assert_eq!(histories[0]["meaningfulnessScore"], -40);

    let t5 = &histories[4];
    assert_eq!(t5["highlightCategory"], "stillFailing");
    assert_eq!(t5["failureIntervals"][1]["endRun"], serde_json::Value::Null);
    assert_eq!(t5["failureIntervals"][1]["isLingering"], true);

    let highlights = &value["failureHighlights"];
    assert_eq!(highlights["stillFailing"], json!(["t5", "t6"]));
    assert_eq!(highlights["regressions"], json!(["t4"]));
    assert_eq!(highlights["costlyDetours"], json!(["t3"]));
}

#[test]
fn empty_payload_produces_empty_outputs_without_errors() {
    let insights = PlaybackInsights::from_json(r#"{"episodes": []}"#).unwrap();
    assert!(insights.timeline().is_empty());
    assert!(insights.histories().is_empty());
    assert!(insights.highlights().is_empty());
    assert!(!insights.has_highlights());
}
