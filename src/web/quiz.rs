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

use axum::Form;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::html;
use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::session::Advance;
use crate::session::Phase;
use crate::session::QuizSession;
use crate::session::QuizSlot;
use crate::types::option_key::OptionKey;
use crate::web::state::ServerState;
use crate::web::template::page_template;
use crate::web::template::refresh_template;

#[derive(Debug, Deserialize)]
enum Action {
    Select,
    Next,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
    option: Option<OptionKey>,
}

pub async fn quiz_handler(State(state): State<ServerState>) -> Response {
    let (user_id, claimed, generation) = {
        let mut mutable = state.lock();
        let Some(user_id) = mutable.store.user_id() else {
            log::debug!("No player in session, back to the home screen.");
            return Redirect::to("/").into_response();
        };
        (user_id, mutable.quiz.begin_load(), mutable.generation)
    };

    if claimed {
        log::debug!("Loading questions...");
        let questions = state.source.load(state.config.question_count).await;
        let mut mutable = state.lock();
        if mutable.generation != generation {
            log::warn!("Discarding questions loaded for {user_id}: the game was abandoned.");
            return Redirect::to("/quiz").into_response();
        }
        match QuizSession::new(&user_id, questions) {
            Ok(session) => mutable.quiz.finish_load(session),
            Err(e) => {
                log::error!("Cannot start the game: {e}");
                mutable.quiz.reset();
                mutable.home_error = Some("No questions available, please try again.".to_string());
                return Redirect::to("/").into_response();
            }
        }
    }

    let mutable = state.lock();
    if mutable.quiz.phase() == Phase::Completed {
        return Redirect::to("/result").into_response();
    }
    match &mutable.quiz {
        QuizSlot::Idle => Redirect::to("/").into_response(),
        QuizSlot::Loading => {
            let body = html! {
                div.waiting {
                    p { "Loading questions..." }
                }
            };
            (StatusCode::OK, Html(refresh_template(body, 1).into_string())).into_response()
        }
        QuizSlot::Ready(session) => {
            let body = render_question(&state, session);
            (StatusCode::OK, Html(page_template(body).into_string())).into_response()
        }
    }
}

fn render_question(state: &ServerState, session: &QuizSession) -> Markup {
    let level = session.current_index() + 1;
    let avatar = state.avatars.for_level(level);
    let question = session.current_question();
    let pending = session.pending();
    let progress_style = format!("width: {:.0}%;", session.progress() * 100.0);
    let answered = format!(
        "Answered: {} / {}",
        session.answers().len(),
        session.question_count()
    );
    let next_label = if session.is_last_question() {
        "Submit ★"
    } else {
        "Next ▶"
    };
    html! {
        div.quiz {
            div.progress-bar {
                div.progress-fill style=(progress_style) {}
            }
            div.boss {
                img.avatar src=(avatar) alt="boss";
                h2 { "Boss #" (level) }
                p.player { "Player: " (session.user_id()) }
            }
            div.panel {
                p.prompt { (question.prompt()) }
                form.options action="/quiz" method="post" {
                    input type="hidden" name="action" value="Select";
                    @for key in OptionKey::ALL {
                        @if pending == Some(key) {
                            button.option.selected type="submit" name="option" value=(key.as_str()) disabled {
                                span.key { (key.as_str()) } (question.option(key))
                            }
                        } @else if pending.is_some() {
                            button.option type="submit" name="option" value=(key.as_str()) disabled {
                                span.key { (key.as_str()) } (question.option(key))
                            }
                        } @else {
                            button.option type="submit" name="option" value=(key.as_str()) {
                                span.key { (key.as_str()) } (question.option(key))
                            }
                        }
                    }
                }
                @if pending.is_some() {
                    form.next action="/quiz" method="post" {
                        input type="hidden" name="action" value="Next";
                        input #next type="submit" value=(next_label);
                    }
                }
            }
            p.answered { (answered) }
        }
    }
}

pub async fn quiz_action_handler(
    State(state): State<ServerState>,
    form: Result<Form<FormData>, FormRejection>,
) -> Redirect {
    let result = match form {
        Ok(Form(form)) => action_handler(&state, form),
        Err(e) => fail(format!("malformed quiz form: {e}")),
    };
    match result {
        Ok(target) => Redirect::to(target),
        Err(e) => {
            log::error!("{e}");
            Redirect::to("/quiz")
        }
    }
}

fn action_handler(state: &ServerState, form: FormData) -> Fallible<&'static str> {
    let mut mutable = state.lock();
    let mutable = &mut *mutable;
    let Some(session) = mutable.quiz.session_mut() else {
        return Ok("/quiz");
    };
    match form.action {
        Action::Select => {
            let Some(option) = form.option else {
                return fail("no option selected.");
            };
            if !session.select_option(option) {
                log::debug!("Ignoring selection {option}: already selected.");
            }
            Ok("/quiz")
        }
        Action::Next => match session.advance()? {
            Advance::Next => Ok("/quiz"),
            Advance::Completed {
                answers,
                question_count,
            } => {
                mutable.store.set_answers(&answers)?;
                mutable.store.set_question_count(question_count)?;
                Ok("/result")
            }
        },
    }
}
