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

use serde::Deserialize;
use serde::Serialize;

/// The scoring service's verdict on a submitted answer sheet.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    pub pass_threshold: u32,
    pub user_id: String,
    /// Per-question review, in the order the questions were asked.
    #[serde(rename = "results", default)]
    pub per_question: Vec<QuestionReview>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub is_correct: bool,
    pub selected: String,
    #[serde(default)]
    pub selected_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}
