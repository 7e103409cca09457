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

use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const DEFAULT_PASS_THRESHOLD: u32 = 7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration flags shared by every subcommand. Each flag can also be set
/// through its environment variable.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long, env = "QUIZ_CONFIG")]
    pub config: Option<PathBuf>,
    /// Number of questions per game.
    #[arg(long, env = "QUIZ_QUESTION_COUNT")]
    pub question_count: Option<usize>,
    /// Number of correct answers needed to pass, shown on the home screen.
    #[arg(long, env = "QUIZ_PASS_THRESHOLD")]
    pub pass_threshold: Option<u32>,
    /// Base URL of the scoring service.
    #[arg(long, env = "QUIZ_SCORING_URL")]
    pub scoring_url: Option<String>,
    /// Timeout for requests to the scoring service, in seconds.
    #[arg(long, env = "QUIZ_TIMEOUT")]
    pub timeout: Option<u64>,
    /// Port to serve the game on.
    #[arg(long, env = "QUIZ_PORT")]
    pub port: Option<u16>,
}

/// The contents of the optional config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    question_count: Option<usize>,
    pass_threshold: Option<u32>,
    scoring_url: Option<String>,
    timeout_secs: Option<u64>,
    port: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub question_count: usize,
    pub pass_threshold: u32,
    /// When absent, every game is played with the fallback questions.
    pub scoring_url: Option<String>,
    pub timeout: Duration,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            scoring_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Resolve the configuration. Flags and environment variables take
    /// precedence over the config file, which takes precedence over the
    /// defaults.
    pub fn load(args: &ConfigArgs) -> Fallible<Self> {
        let file = match &args.config {
            Some(path) => {
                if !path.exists() {
                    return fail(format!("config file {} does not exist.", path.display()));
                }
                log::debug!("Loading config from {}", path.display());
                let content = read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => FileConfig::default(),
        };
        let defaults = Config::default();
        let timeout_secs = args
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return fail("timeout must be at least one second.");
        }
        let scoring_url = args
            .scoring_url
            .clone()
            .or(file.scoring_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Ok(Self {
            question_count: args
                .question_count
                .or(file.question_count)
                .unwrap_or(defaults.question_count),
            pass_threshold: args
                .pass_threshold
                .or(file.pass_threshold)
                .unwrap_or(defaults.pass_threshold),
            scoring_url,
            timeout: Duration::from_secs(timeout_secs),
            port: args.port.or(file.port).unwrap_or(defaults.port),
        })
    }
}
