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

use crate::error::SessionError;
use crate::types::answer::Answer;
use crate::types::option_key::OptionKey;
use crate::types::question::Question;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Questions are not loaded yet.
    NotStarted,
    /// The current question has no selection.
    InProgress,
    /// The current question has a selection; waiting for the player to move
    /// on.
    AwaitingNextOrSubmit,
    /// Every question is answered. The session no longer changes.
    Completed,
}

/// The outcome of a successful `advance`.
#[derive(Clone, PartialEq, Debug)]
pub enum Advance {
    Next,
    Completed {
        answers: Vec<Answer>,
        question_count: usize,
    },
}

/// An in-progress game: the question cursor, the pending selection, and the
/// answers captured so far.
#[derive(Clone, Debug)]
pub struct QuizSession {
    user_id: String,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    current_index: usize,
    pending: Option<OptionKey>,
    completed: bool,
}

impl QuizSession {
    pub fn new(user_id: &str, questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            user_id: user_id.to_string(),
            questions,
            answers: Vec::new(),
            current_index: 0,
            pending: None,
            completed: false,
        })
    }

    /// Record a selection for the current question. The first selection
    /// wins until `advance` is called. Returns whether it was recorded.
    pub fn select_option(&mut self, option: OptionKey) -> bool {
        if self.completed || self.pending.is_some() {
            return false;
        }
        self.pending = Some(option);
        true
    }

    /// Commit the pending selection and move to the next question, or
    /// complete the session after the last one.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.completed {
            return Err(SessionError::Completed);
        }
        let selected = self.pending.ok_or(SessionError::NoSelection)?;
        let question_id = self.questions[self.current_index].id().clone();
        self.answers.push(Answer {
            question_id,
            selected,
        });
        if self.current_index + 1 == self.questions.len() {
            self.completed = true;
            log::debug!("Session completed");
            Ok(Advance::Completed {
                answers: self.answers.clone(),
                question_count: self.questions.len(),
            })
        } else {
            self.current_index += 1;
            self.pending = None;
            Ok(Advance::Next)
        }
    }

    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else if self.pending.is_some() {
            Phase::AwaitingNextOrSubmit
        } else {
            Phase::InProgress
        }
    }

    /// Fraction of the game reached, counting the current question.
    pub fn progress(&self) -> f64 {
        (self.current_index + 1) as f64 / self.questions.len() as f64
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn pending(&self) -> Option<OptionKey> {
        self.pending
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Holds the quiz session and makes sure questions are loaded at most once
/// per game, however many times the quiz screen is rendered.
#[derive(Debug, Default)]
pub enum QuizSlot {
    #[default]
    Idle,
    Loading,
    Ready(QuizSession),
}

impl QuizSlot {
    /// Claim the load. Returns `true` exactly once until the next `reset`.
    pub fn begin_load(&mut self) -> bool {
        match self {
            QuizSlot::Idle => {
                *self = QuizSlot::Loading;
                true
            }
            _ => false,
        }
    }

    /// Install the loaded session. Ignored unless a load is in progress.
    pub fn finish_load(&mut self, session: QuizSession) {
        if let QuizSlot::Loading = self {
            *self = QuizSlot::Ready(session);
        }
    }

    pub fn reset(&mut self) {
        *self = QuizSlot::Idle;
    }

    pub fn phase(&self) -> Phase {
        match self {
            QuizSlot::Idle | QuizSlot::Loading => Phase::NotStarted,
            QuizSlot::Ready(session) => session.phase(),
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut QuizSession> {
        match self {
            QuizSlot::Ready(session) => Some(session),
            _ => None,
        }
    }
}

/// Ensures a completed session is submitted at most once. A failed attempt
/// releases the guard; a successful one holds it until the next game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SubmitGuard {
    #[default]
    Idle,
    InFlight,
    Succeeded,
}

impl SubmitGuard {
    /// Mark a submission as in flight. Must be called before the network
    /// call starts. Returns `false` if a submission is in flight or already
    /// succeeded.
    pub fn try_begin(&mut self) -> bool {
        match self {
            SubmitGuard::Idle => {
                *self = SubmitGuard::InFlight;
                true
            }
            _ => false,
        }
    }

    pub fn succeed(&mut self) {
        if *self == SubmitGuard::InFlight {
            *self = SubmitGuard::Succeeded;
        }
    }

    pub fn fail(&mut self) {
        if *self == SubmitGuard::InFlight {
            *self = SubmitGuard::Idle;
        }
    }

    pub fn reset(&mut self) {
        *self = SubmitGuard::Idle;
    }
}
