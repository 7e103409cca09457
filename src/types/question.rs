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

use serde::Deserialize;
use serde::Serialize;

use crate::types::option_key::OptionKey;

/// A question identifier, kept in whatever JSON form the scoring service
/// used so it can be echoed back unchanged.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(serde_json::Number),
    Text(String),
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{n}"),
            QuestionId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for QuestionId {
    fn from(value: u64) -> Self {
        QuestionId::Number(value.into())
    }
}

/// A multiple-choice question. The wire format is
/// `{id, question, A, B, C, D}`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question")]
    prompt: String,
    #[serde(rename = "A")]
    a: String,
    #[serde(rename = "B")]
    b: String,
    #[serde(rename = "C")]
    c: String,
    #[serde(rename = "D")]
    d: String,
}

impl Question {
    pub fn new(id: u64, prompt: &str, options: [&str; 4]) -> Self {
        let [a, b, c, d] = options;
        Self {
            id: QuestionId::from(id),
            prompt: prompt.to_string(),
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
            d: d.to_string(),
        }
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn option(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::A => &self.a,
            OptionKey::B => &self.b,
            OptionKey::C => &self.c,
            OptionKey::D => &self.d,
        }
    }
}
