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

use crate::client::ScoringClient;
use crate::error::FetchError;
use crate::types::question::Question;

/// Resolves the questions for a game: from the scoring service when it
/// answers with at least one question, otherwise from the built-in sample
/// list. The two are never mixed.
#[derive(Clone)]
pub struct QuestionSource {
    client: Option<ScoringClient>,
}

impl QuestionSource {
    pub fn new(client: Option<ScoringClient>) -> Self {
        Self { client }
    }

    /// Load up to `desired_count` questions. Never fails: the fallback list
    /// covers every remote failure. The remote set is returned as sent, even
    /// when its length differs from `desired_count`.
    pub async fn load(&self, desired_count: usize) -> Vec<Question> {
        if desired_count == 0 {
            return Vec::new();
        }
        match self.fetch(desired_count).await {
            Ok(questions) => {
                log::debug!("Loaded {} questions from the scoring service.", questions.len());
                questions
            }
            Err(e) => {
                log::warn!("Failed to load questions ({e}), using sample questions.");
                fallback_questions(desired_count)
            }
        }
    }

    async fn fetch(&self, desired_count: usize) -> Result<Vec<Question>, FetchError> {
        match &self.client {
            Some(client) => client.fetch_questions(desired_count).await,
            None => Err(FetchError::NotConfigured),
        }
    }
}

/// The first `count` built-in sample questions. Never padded.
pub fn fallback_questions(count: usize) -> Vec<Question> {
    sample_questions().into_iter().take(count).collect()
}

fn sample_questions() -> Vec<Question> {
    vec![
        Question::new(
            1,
            "What does HTML stand for?",
            [
                "Hyper Text Markup Language",
                "High Tech Modern Language",
                "Hyper Transfer Markup Language",
                "Home Tool Markup Language",
            ],
        ),
        Question::new(
            2,
            "What is CSS mainly used for?",
            [
                "Database management",
                "Styling web pages",
                "Server programs",
                "Game development",
            ],
        ),
        Question::new(
            3,
            "What kind of language is JavaScript?",
            [
                "A compiled language",
                "An interpreted language",
                "An assembly language",
                "A machine language",
            ],
        ),
        Question::new(
            4,
            "Which company created React?",
            ["Google", "Microsoft", "Meta (Facebook)", "Apple"],
        ),
        Question::new(
            5,
            "What is Git used for?",
            [
                "Version control",
                "Web design",
                "Database management",
                "Image editing",
            ],
        ),
    ]
}
