// Copyright (c) The testlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error, fmt};

/// An error that occurs while deserializing a playback payload.
///
/// Produced by [`PlaybackData::from_json`](crate::PlaybackData::from_json) and
/// [`PlaybackData::from_json_value`](crate::PlaybackData::from_json_value).
/// The carried [`path`](Self::path) names the JSON location that failed to
/// deserialize, e.g. `episodeTestData[2].runs`.
#[derive(Debug)]
pub struct PayloadParseError {
    path: String,
    err: serde_json::Error,
}

impl PayloadParseError {
    pub(crate) fn new(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self {
            path: err.path().to_string(),
            err: err.into_inner(),
        }
    }

    /// Returns the JSON path at which deserialization failed.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for PayloadParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse playback payload at `{}`", self.path)
    }
}

impl error::Error for PayloadParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}
