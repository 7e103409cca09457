// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use thiserror::Error;

/// A generic application error carrying a human-readable message.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl std::error::Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(value.to_string())
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("invalid config file: {value}"))
    }
}

impl From<reqwest::Error> for ErrorReport {
    fn from(value: reqwest::Error) -> Self {
        ErrorReport::new(format!("HTTP error: {value}"))
    }
}

impl From<SessionError> for ErrorReport {
    fn from(value: SessionError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// Failure to fetch questions from the scoring service. Never surfaced to the
/// player: the question source recovers with the fallback list.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("scoring service is not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("no questions returned")]
    Empty,
}

/// Failure to submit answers. Distinct from a graded result that did not
/// pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),
    #[error("remote error: {0}")]
    Remote(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session needs at least one question")]
    Empty,
    #[error("no option selected for the current question")]
    NoSelection,
    #[error("session already completed")]
    Completed,
}

/// A screen expected data from an earlier screen that isn't in the store.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MissingSession {
    #[error("no user id in session")]
    UserId,
    #[error("no answers in session")]
    Answers,
}
