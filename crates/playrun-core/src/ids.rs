//! Newtype wrappers for identifiers and validated inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a playback session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random SessionId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier of a video on the external provider.
///
/// Only produced by [`VideoRef::from_url`], so it is never empty and
/// always comes from a recognized URL shape:
///
/// - `https://www.youtube.com/watch?v=<id>` (any `*.youtube.com` host)
/// - `https://youtu.be/<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef(String);

impl VideoRef {
    /// Extract the video id from a user-supplied URL.
    pub fn from_url(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingVideoUrl);
        }

        let url = Url::parse(trimmed)
            .map_err(|e| ValidationError::InvalidUrl(format!("{} ({})", trimmed, e)))?;

        let host = url.host_str().unwrap_or_default();
        let id = if host == "youtu.be" {
            url.path_segments()
                .and_then(|mut segments| segments.next())
                .map(str::to_owned)
        } else if (host == "youtube.com" || host.ends_with(".youtube.com")) && url.path() == "/watch"
        {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        } else {
            None
        };

        match id {
            Some(id) if !id.is_empty() => Ok(Self(id)),
            _ => Err(ValidationError::UnrecognizedVideoUrl(trimmed.to_string())),
        }
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}

/// Number of runs in a session, validated against the policy ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct RunCount(u32);

impl RunCount {
    /// Smallest accepted run count.
    pub const MIN: u32 = 1;

    /// Largest accepted run count. Caps how much external playback one
    /// session may consume.
    pub const MAX: u32 = 5;

    /// Validate an integer run count.
    pub fn new(count: i64) -> Result<Self, ValidationError> {
        if count < i64::from(Self::MIN) || count > i64::from(Self::MAX) {
            return Err(ValidationError::RunCountOutOfRange {
                got: count,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(count as u32))
    }

    /// Get the run count.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RunCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunCount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let count: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::RunCountNotInteger(trimmed.to_string()))?;
        Self::new(count)
    }
}

impl TryFrom<i64> for RunCount {
    type Error = ValidationError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<RunCount> for u32 {
    fn from(count: RunCount) -> Self {
        count.0
    }
}
