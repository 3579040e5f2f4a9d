//! Upstream JSON envelope
//!
//! Every REST reply carries `status`/`reason`/`code` next to its payload
//! fields. Only the classifier interprets these.

use serde::{Deserialize, Deserializer};

use crate::constants::{STATUS_FALSE, STATUS_PENDING, STATUS_RESET, STATUS_TRUE};

/// The `status` field. The service sends strings, occasionally JSON booleans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeStatus {
    True,
    False,
    Pending,
    Reset,
    /// Missing, null or unrecognised value.
    Other(String),
}

impl EnvelopeStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            STATUS_TRUE => Self::True,
            STATUS_FALSE => Self::False,
            STATUS_PENDING => Self::Pending,
            STATUS_RESET => Self::Reset,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Default for EnvelopeStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl<'de> Deserialize<'de> for EnvelopeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Flag(true)) => Self::True,
            Some(Raw::Flag(false)) => Self::False,
            Some(Raw::Text(text)) => Self::parse(&text),
            None => Self::default(),
        })
    }
}

/// The classification fields of a reply; payload fields are ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamEnvelope {
    #[serde(default)]
    pub status: EnvelopeStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Non-error result of a classified call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    /// `pending` or `reset`: nothing committed yet, poll again later.
    Pending,
}

impl<T> Outcome<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ready(value) => Outcome::Ready(f(value)),
            Self::Pending => Outcome::Pending,
        }
    }
}
