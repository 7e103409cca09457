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

use crate::types::graded::GradedResult;

/// A graded result, formatted for the result screen.
#[derive(Clone, PartialEq, Debug)]
pub struct ResultView {
    pub user_id: String,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub passed: bool,
    pub pass_threshold: u32,
    pub lines: Vec<ReviewLine>,
}

/// One row of the per-question review.
#[derive(Clone, PartialEq, Debug)]
pub struct ReviewLine {
    /// 1-based position of the question in the game.
    pub number: usize,
    pub is_correct: bool,
    pub question: Option<String>,
    pub selected: String,
    /// Only shown for incorrect answers, when the service sent it.
    pub correction: Option<String>,
}

impl From<&GradedResult> for ResultView {
    fn from(result: &GradedResult) -> Self {
        let lines = result
            .per_question
            .iter()
            .enumerate()
            .map(|(i, review)| {
                let correction = if review.is_correct {
                    None
                } else {
                    review.correct_answer.as_ref().map(|letter| {
                        labelled(letter, review.correct_answer_text.as_deref().unwrap_or(""))
                    })
                };
                ReviewLine {
                    number: i + 1,
                    is_correct: review.is_correct,
                    question: review.question.clone(),
                    selected: labelled(&review.selected, &review.selected_text),
                    correction,
                }
            })
            .collect();
        Self {
            user_id: result.user_id.clone(),
            score: result.score,
            total: result.total,
            percentage: percentage(result.score, result.total),
            passed: result.passed,
            pass_threshold: result.pass_threshold,
            lines,
        }
    }
}

/// `round(score / total * 100)`, or zero for an empty game.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

fn labelled(letter: &str, text: &str) -> String {
    if text.is_empty() {
        letter.to_string()
    } else {
        format!("{letter}. {text}")
    }
}
