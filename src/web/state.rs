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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::avatar::AvatarCache;
use crate::client::ScoringClient;
use crate::config::Config;
use crate::error::Fallible;
use crate::session::QuizSlot;
use crate::session::SubmitGuard;
use crate::source::QuestionSource;
use crate::store::SessionStore;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub source: QuestionSource,
    pub client: Option<ScoringClient>,
    pub avatars: Arc<AvatarCache>,
    pub mutable: Arc<Mutex<MutableState>>,
}

#[derive(Default)]
pub struct MutableState {
    pub store: SessionStore,
    pub quiz: QuizSlot,
    pub submit: SubmitGuard,
    /// A message to show once on the next render of the home screen.
    pub home_error: Option<String>,
    /// Bumped whenever the current game is abandoned. Work started under an
    /// older generation must not be committed.
    pub generation: u64,
}

impl MutableState {
    /// Start over for a new game by the same player.
    pub fn play_again(&mut self) {
        self.store.play_again();
        self.quiz.reset();
        self.submit.reset();
        self.generation += 1;
    }

    /// Forget the player and the game.
    pub fn reset(&mut self) {
        self.store.clear();
        self.quiz.reset();
        self.submit.reset();
        self.generation += 1;
    }
}

impl ServerState {
    pub fn new(config: Config) -> Fallible<Self> {
        let client = match &config.scoring_url {
            Some(url) => Some(ScoringClient::new(url, config.timeout)?),
            None => {
                log::warn!("No scoring service configured: using sample questions.");
                None
            }
        };
        Ok(Self {
            config,
            source: QuestionSource::new(client.clone()),
            client,
            avatars: Arc::new(AvatarCache::init()),
            mutable: Arc::new(Mutex::new(MutableState::default())),
        })
    }

    /// Handlers never hold the lock across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, MutableState> {
        self.mutable.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
