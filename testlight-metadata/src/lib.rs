// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model for test-run playback payloads.
//!
//! A playback payload captures a student's debugging session as a sequence of
//! *episodes* (logical groupings of work, e.g. "added insert" or "fixed null
//! check"), each containing the test runs recorded during that episode. This
//! crate owns the wire format for that payload and nothing else; deriving
//! failure intervals, highlight classifications and scores from it is the job
//! of the `testlight-engine` crate.
//!
//! The payload is deliberately tolerant: missing arrays deserialize as empty,
//! unknown test statuses map to [`TestStatus::Unknown`], and unrecognized
//! fields are ignored. The only hard errors are structural — a field that is
//! supposed to be a sequence but isn't — and those are reported through
//! [`PayloadParseError`] with the exact JSON path that failed.

mod errors;
mod payload;

pub use errors::*;
pub use payload::*;
