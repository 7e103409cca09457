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

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Fallible;
use crate::types::answer::Answer;
use crate::types::graded::GradedResult;

/// The keys the screens use to hand data to each other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StoreKey {
    /// Written by the home screen when a game starts.
    UserId,
    /// Written by the quiz screen on completion; removed once graded.
    UserAnswers,
    /// Written by the quiz screen on completion.
    QuestionCount,
    /// Written by the result screen after a successful submission, so a
    /// reload shows the result instead of submitting again.
    LastResult,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::UserId => "userId",
            StoreKey::UserAnswers => "userAnswers",
            StoreKey::QuestionCount => "questionCount",
            StoreKey::LastResult => "lastResult",
        }
    }
}

/// Key/value storage shared by every screen for the lifetime of the server
/// process. Values are kept as JSON text.
#[derive(Debug, Default)]
pub struct SessionStore {
    values: HashMap<StoreKey, String>,
}

impl SessionStore {
    pub fn contains(&self, key: StoreKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn remove(&mut self, key: StoreKey) {
        self.values.remove(&key);
    }

    /// Forget the previous game's answers and result, keeping the player.
    pub fn play_again(&mut self) {
        self.remove(StoreKey::UserAnswers);
        self.remove(StoreKey::QuestionCount);
        self.remove(StoreKey::LastResult);
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn set_user_id(&mut self, user_id: &str) -> Fallible<()> {
        self.put(StoreKey::UserId, &user_id)
    }

    pub fn user_id(&self) -> Option<String> {
        self.get(StoreKey::UserId)
    }

    pub fn set_answers(&mut self, answers: &[Answer]) -> Fallible<()> {
        self.put(StoreKey::UserAnswers, &answers)
    }

    pub fn answers(&self) -> Option<Vec<Answer>> {
        self.get(StoreKey::UserAnswers)
    }

    pub fn set_question_count(&mut self, count: usize) -> Fallible<()> {
        self.put(StoreKey::QuestionCount, &count)
    }

    pub fn question_count(&self) -> Option<usize> {
        self.get(StoreKey::QuestionCount)
    }

    pub fn set_last_result(&mut self, result: &GradedResult) -> Fallible<()> {
        self.put(StoreKey::LastResult, result)
    }

    pub fn last_result(&self) -> Option<GradedResult> {
        self.get(StoreKey::LastResult)
    }

    /// The result of a game that has already been graded: a stored result
    /// with no answers left to submit. When this is `Some`, no new
    /// submission may be attempted.
    pub fn cached_result(&self) -> Option<GradedResult> {
        if self.contains(StoreKey::UserAnswers) {
            return None;
        }
        self.last_result()
    }

    fn put<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) -> Fallible<()> {
        let json = serde_json::to_string(value)?;
        self.values.insert(key, json);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let json = self.values.get(&key)?;
        match serde_json::from_str(json) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring undecodable value for {}: {e}", key.as_str());
                None
            }
        }
    }

    #[cfg(test)]
    pub fn put_raw(&mut self, key: StoreKey, json: &str) {
        self.values.insert(key, json.to_string());
    }
}
