// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::PayloadParseError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, de};
use smol_str::SmolStr;
use std::fmt;

/// A stable identifier for a test, unique within a single run.
///
/// The same `TestId` is expected to refer to the same logical test across all
/// runs in a payload; its display name is carried separately in
/// [`TestResult::name`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TestId(pub SmolStr);

impl TestId {
    /// Creates a new test ID.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An identifier for an episode: a labeled grouping of consecutive runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EpisodeId(pub SmolStr);

impl EpisodeId {
    /// Creates a new episode ID.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EpisodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The outcome of one test within one run.
///
/// On the wire this is one of the literal strings `"pass"`, `"fail"`,
/// `"error"` or `"skip"`. Any other string deserializes to
/// [`Unknown`](Self::Unknown), which behaves like a skip everywhere
/// downstream: it neither passes nor fails. This keeps payload consumption
/// total in the face of producers that grow new status values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TestStatus {
    /// The test passed.
    Pass,
    /// An assertion failed.
    Fail,
    /// The test aborted with an error rather than an assertion failure.
    Error,
    /// The test was not executed in this run.
    Skip,
    /// A status string this crate doesn't recognize.
    #[default]
    Unknown,
}

impl TestStatus {
    /// Returns true if this status counts as failing (`fail` or `error`).
    pub fn is_failing(self) -> bool {
        matches!(self, TestStatus::Fail | TestStatus::Error)
    }

    /// Returns true if this status is a pass.
    pub fn is_passing(self) -> bool {
        matches!(self, TestStatus::Pass)
    }

    /// Returns the canonical wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Error => "error",
            TestStatus::Skip => "skip",
            TestStatus::Unknown => "unknown",
        }
    }

    /// Parses a wire status string, mapping unrecognized values to
    /// [`Unknown`](Self::Unknown).
    pub fn from_wire(status: &str) -> Self {
        match status {
            "pass" => TestStatus::Pass,
            "fail" => TestStatus::Fail,
            "error" => TestStatus::Error,
            "skip" => TestStatus::Skip,
            _ => TestStatus::Unknown,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TestStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct StatusVisitor;

        impl de::Visitor<'_> for StatusVisitor {
            type Value = TestStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a test status string")
            }

            fn visit_str<E>(self, v: &str) -> Result<TestStatus, E>
            where
                E: de::Error,
            {
                Ok(TestStatus::from_wire(v))
            }
        }

        deserializer.deserialize_str(StatusVisitor)
    }
}

/// One test's outcome within a single run.
///
/// Beyond the id/name/status triple, producers may attach display metadata:
/// whether the status changed relative to the previous run, the prior status,
/// and failure text. That metadata is carried verbatim for the presentation
/// layer; nothing in testlight interprets it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// The stable test identifier.
    pub id: TestId,

    /// The display name, e.g. `testInsertDuplicate`.
    #[serde(default)]
    pub name: String,

    /// The outcome of this test in this run.
    #[serde(default)]
    pub status: TestStatus,

    /// True if the status changed relative to the previous run.
    #[serde(default)]
    pub changed_this_run: bool,

    /// The status in the previous run, if the producer recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<TestStatus>,

    /// A short failure summary, e.g. `Expected size 1, got 2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// The full stack trace text, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// Wall-clock duration of this test, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TestResult {
    /// Creates a new `TestResult` with no display metadata attached.
    pub fn new(id: impl Into<TestId>, name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            changed_this_run: false,
            previous_status: None,
            error_message: None,
            stack_trace: None,
            duration_ms: None,
        }
    }
}

/// Status counts reported by the producer for one run.
///
/// The counts are expected to sum to the number of entries in the run's
/// `results`, but this is not enforced: the engine recomputes its own tally
/// and warns on disagreement rather than rejecting the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Number of passing tests.
    #[serde(default)]
    pub passed: u32,

    /// Number of failing tests.
    #[serde(default)]
    pub failed: u32,

    /// Number of tests that errored.
    #[serde(default)]
    pub errored: u32,

    /// Number of skipped tests.
    #[serde(default)]
    pub skipped: u32,

    /// Total test count as reported by the producer, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl RunSummary {
    /// Sum of the four status counts.
    pub fn counted_total(&self) -> u32 {
        self.passed + self.failed + self.errored + self.skipped
    }
}

/// One execution of the test suite, as recorded by the producer.
///
/// The wire `runNumber` is episode-scoped display metadata and is *not*
/// trusted for ordering: the engine assigns global run numbers strictly in
/// traversal order when flattening the timeline.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    /// Producer-assigned run number, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_number: Option<u32>,

    /// When this run started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Producer-reported status counts.
    #[serde(default)]
    pub summary: RunSummary,

    /// Per-test outcomes, in the producer's order.
    #[serde(default)]
    pub results: Vec<TestResult>,
}

/// A labeled grouping of consecutive runs, e.g. one editing session.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// The episode identifier.
    pub id: EpisodeId,

    /// When the episode began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,

    /// When the episode ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,

    /// Human-readable label, e.g. `Fixed null check`.
    #[serde(default)]
    pub label: String,

    /// The dominant change category the producer attributed to this episode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_category: Option<String>,
}

impl Episode {
    /// Creates a new episode with the given id and label and no timestamps.
    pub fn new(id: impl Into<EpisodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time: None,
            end_time: None,
            label: label.into(),
            dominant_category: None,
        }
    }
}

/// The runs recorded during one episode.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeTestData {
    /// The episode these runs belong to.
    pub episode_id: EpisodeId,

    /// The runs, in execution order.
    #[serde(default)]
    pub runs: Vec<TestRun>,
}

/// The root playback payload.
///
/// Producers typically emit additional top-level fields (submission context,
/// precomputed feedback, code snapshots); those are ignored here. Missing
/// `episodes` or `episodeTestData` arrays deserialize as empty, but a value
/// of the wrong shape is a [`PayloadParseError`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackData {
    /// The episodes, in chronological order. Episode order drives global run
    /// numbering.
    #[serde(default)]
    pub episodes: Vec<Episode>,

    /// Per-episode run data. Entries are matched to episodes by id; an entry
    /// whose episode is absent from `episodes` is dropped downstream.
    #[serde(default)]
    pub episode_test_data: Vec<EpisodeTestData>,
}

impl PlaybackData {
    /// Deserializes a payload from a JSON string.
    pub fn from_json(input: &str) -> Result<Self, PayloadParseError> {
        let mut deserializer = serde_json::Deserializer::from_str(input);
        serde_path_to_error::deserialize(&mut deserializer).map_err(PayloadParseError::new)
    }

    /// Deserializes a payload from an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, PayloadParseError> {
        serde_path_to_error::deserialize(value).map_err(PayloadParseError::new)
    }
}
