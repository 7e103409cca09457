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

use crate::error::MissingSession;
use crate::error::SubmitError;
use crate::present::ResultView;
use crate::store::StoreKey;
use crate::types::graded::GradedResult;
use crate::web::state::ServerState;
use crate::web::template::page_template;
use crate::web::template::refresh_template;

/// Where the current game's submission stands.
#[derive(Debug, PartialEq)]
pub enum SubmitStatus {
    Graded(GradedResult),
    /// Another request is submitting these answers.
    InFlight,
    Failed(SubmitError),
    Missing(MissingSession),
    /// The game was abandoned while its answers were being submitted.
    Superseded,
}

/// Submit the stored answers, unless they were already graded or are being
/// submitted by another request. Reading the store and claiming the guard
/// happen under one lock, so each completed game reaches the scoring
/// service at most once.
pub async fn submit_pending(state: &ServerState) -> SubmitStatus {
    let (user_id, answers, generation) = {
        let mut mutable = state.lock();
        if let Some(result) = mutable.store.cached_result() {
            return SubmitStatus::Graded(result);
        }
        let Some(user_id) = mutable.store.user_id() else {
            return SubmitStatus::Missing(MissingSession::UserId);
        };
        let Some(answers) = mutable.store.answers() else {
            return SubmitStatus::Missing(MissingSession::Answers);
        };
        if !mutable.submit.try_begin() {
            return SubmitStatus::InFlight;
        }
        (user_id, answers, mutable.generation)
    };

    log::debug!("Submitting {} answers for {user_id}", answers.len());
    let outcome = match &state.client {
        Some(client) => client.submit(&user_id, &answers).await,
        None => Err(SubmitError::Network(
            "scoring service is not configured".to_string(),
        )),
    };

    let mut mutable = state.lock();
    if mutable.generation != generation {
        log::warn!("Discarding the submission for {user_id}: the game was abandoned.");
        return SubmitStatus::Superseded;
    }
    match outcome {
        Ok(result) => {
            mutable.submit.succeed();
            mutable.store.remove(StoreKey::UserAnswers);
            if let Err(e) = mutable.store.set_last_result(&result) {
                log::error!("Failed to cache the result: {e}");
            }
            SubmitStatus::Graded(result)
        }
        Err(e) => {
            log::error!("Failed to submit answers: {e}");
            mutable.submit.fail();
            SubmitStatus::Failed(e)
        }
    }
}

pub async fn result_handler(State(state): State<ServerState>) -> Response {
    match submit_pending(&state).await {
        SubmitStatus::Graded(result) => {
            let body = render_result(&state, &ResultView::from(&result));
            (StatusCode::OK, Html(page_template(body).into_string())).into_response()
        }
        SubmitStatus::InFlight => {
            let body = html! {
                div.waiting {
                    p { "Submitting your answers..." }
                }
            };
            (StatusCode::OK, Html(refresh_template(body, 1).into_string())).into_response()
        }
        SubmitStatus::Failed(e) => {
            let message = match e {
                SubmitError::Network(_) => {
                    "Cannot reach the scoring server, please try again later.".to_string()
                }
                SubmitError::Remote(message) => message,
            };
            let kept = state.lock().store.question_count();
            let body = html! {
                div.failed {
                    h1 { "Submission failed" }
                    p.error { (message) }
                    @if let Some(count) = kept {
                        p.kept { "Your " (count) " answers are kept, you can retry." }
                    }
                    form action="/result" method="post" {
                        input #retry type="submit" name="action" value="Retry";
                        input #home type="submit" name="action" value="Home";
                    }
                }
            };
            (StatusCode::OK, Html(page_template(body).into_string())).into_response()
        }
        SubmitStatus::Missing(missing) => {
            log::debug!("{missing}, back to the home screen.");
            Redirect::to("/").into_response()
        }
        SubmitStatus::Superseded => Redirect::to("/").into_response(),
    }
}

fn render_result(state: &ServerState, view: &ResultView) -> Markup {
    let avatar = state.avatars.get(&view.user_id);
    let score_style = format!("width: {}%;", view.percentage);
    html! {
        div.result .passed[view.passed] .failed[!view.passed] {
            div.boss {
                img.avatar src=(avatar) alt="player";
                @if view.passed {
                    h1 { "🎉 Stage Cleared!" }
                } @else {
                    h1 { "💀 Challenge Failed" }
                }
                p.player { "Player: " (view.user_id) }
            }
            div.panel.score {
                p.label { "YOUR SCORE" }
                p.value { (view.score) " / " (view.total) }
                div.progress-bar {
                    div.progress-fill style=(score_style) {}
                }
                p.percentage { (view.percentage) "%" }
                p.threshold { "Pass threshold: " (view.pass_threshold) " questions" }
            }
            details.panel.review open {
                summary { "Review" }
                @for line in &view.lines {
                    div.line .correct[line.is_correct] .incorrect[!line.is_correct] {
                        p.verdict {
                            "Q" (line.number) " "
                            @if line.is_correct { "✓ Correct" } @else { "✗ Wrong" }
                        }
                        @if let Some(question) = &line.question {
                            p.question { (question) }
                        }
                        p.selected { "Your answer: " (line.selected) }
                        @if let Some(correction) = &line.correction {
                            p.correction { "Correct answer: " (correction) }
                        }
                    }
                }
            }
            form.controls action="/result" method="post" {
                input #play-again type="submit" name="action" value="PlayAgain";
                input #home type="submit" name="action" value="Home";
            }
            @if view.passed {
                p.banner { "★ Congratulations! ★" }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
enum Action {
    PlayAgain,
    Home,
    Retry,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
}

pub async fn result_action_handler(
    State(state): State<ServerState>,
    form: Result<Form<FormData>, FormRejection>,
) -> Redirect {
    let action = match form {
        Ok(Form(form)) => form.action,
        Err(e) => {
            log::error!("Malformed result form: {e}");
            return Redirect::to("/result");
        }
    };
    let mut mutable = state.lock();
    match action {
        Action::PlayAgain => {
            mutable.play_again();
            Redirect::to("/quiz")
        }
        Action::Home => {
            mutable.reset();
            Redirect::to("/")
        }
        Action::Retry => Redirect::to("/result"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::error::Fallible;
    use crate::helper::FakeHandle;
    use crate::helper::FakeService;
    use crate::helper::graded_json;
    use crate::helper::spawn_fake_service;
    use crate::session::SubmitGuard;
    use crate::types::answer::Answer;
    use crate::types::option_key::OptionKey;
    use crate::types::question::QuestionId;

    async fn setup(service: FakeService) -> Fallible<(ServerState, FakeHandle)> {
        let fake = spawn_fake_service(service).await;
        let config = Config {
            scoring_url: Some(fake.url.clone()),
            timeout: Duration::from_secs(5),
            ..Config::default()
        };
        let state = ServerState::new(config)?;
        {
            let mut mutable = state.lock();
            mutable.store.set_user_id("mario")?;
            mutable.store.set_answers(&[Answer {
                question_id: QuestionId::from(1),
                selected: OptionKey::A,
            }])?;
            mutable.store.set_question_count(1)?;
        }
        Ok((state, fake))
    }

    #[tokio::test]
    async fn test_successful_submission_is_cached() -> Fallible<()> {
        let (state, fake) = setup(FakeService::new()).await?;
        let status = submit_pending(&state).await;
        let expected: GradedResult = serde_json::from_value(graded_json(7, 10, true))?;
        assert_eq!(status, SubmitStatus::Graded(expected.clone()));
        {
            let mutable = state.lock();
            assert!(!mutable.store.contains(StoreKey::UserAnswers));
            assert_eq!(mutable.store.last_result(), Some(expected.clone()));
        }
        // A reload shows the cached result without calling the service.
        assert_eq!(submit_pending(&state).await, SubmitStatus::Graded(expected));
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_result_skips_the_service() -> Fallible<()> {
        let (state, fake) = setup(FakeService::new()).await?;
        let cached: GradedResult = serde_json::from_value(graded_json(3, 10, false))?;
        {
            let mut mutable = state.lock();
            mutable.store.remove(StoreKey::UserAnswers);
            mutable.store.set_last_result(&cached)?;
        }
        assert_eq!(submit_pending(&state).await, SubmitStatus::Graded(cached));
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_failure_allows_retry() -> Fallible<()> {
        let (state, fake) = setup(
            FakeService::new().with_submit(json!({"success": false, "error": "quota exceeded"})),
        )
        .await?;
        assert_eq!(
            submit_pending(&state).await,
            SubmitStatus::Failed(SubmitError::Remote("quota exceeded".to_string()))
        );
        assert!(state.lock().store.contains(StoreKey::UserAnswers));
        assert_eq!(
            submit_pending(&state).await,
            SubmitStatus::Failed(SubmitError::Remote("quota exceeded".to_string()))
        );
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_submissions_reach_the_service_once() -> Fallible<()> {
        let (state, fake) =
            setup(FakeService::new().with_delay(Duration::from_millis(200))).await?;
        let (first, second) = tokio::join!(submit_pending(&state), submit_pending(&state));
        let graded = [&first, &second]
            .iter()
            .filter(|s| matches!(s, SubmitStatus::Graded(_)))
            .count();
        let in_flight = [&first, &second]
            .iter()
            .filter(|s| matches!(s, SubmitStatus::InFlight))
            .count();
        assert_eq!(graded, 1);
        assert_eq!(in_flight, 1);
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_abandoned_game_is_not_committed() -> Fallible<()> {
        let (state, fake) =
            setup(FakeService::new().with_delay(Duration::from_millis(300))).await?;
        let pending = tokio::spawn({
            let state = state.clone();
            async move { submit_pending(&state).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let mut mutable = state.lock();
            mutable.reset();
            mutable.store.set_user_id("luigi")?;
            mutable.store.set_answers(&[Answer {
                question_id: QuestionId::from(2),
                selected: OptionKey::C,
            }])?;
            mutable.store.set_question_count(1)?;
        }
        assert_eq!(pending.await.unwrap(), SubmitStatus::Superseded);
        {
            let mutable = state.lock();
            assert!(mutable.store.contains(StoreKey::UserAnswers));
            assert_eq!(mutable.store.last_result(), None);
            assert_eq!(mutable.submit, SubmitGuard::Idle);
        }
        // The new player's answers still reach the service.
        assert!(matches!(
            submit_pending(&state).await,
            SubmitStatus::Graded(_)
        ));
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 2);
        let body = fake.last_submit.lock().unwrap().clone().unwrap();
        assert_eq!(body["userId"], "luigi");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_session() -> Fallible<()> {
        let (state, fake) = setup(FakeService::new()).await?;
        state.lock().store.remove(StoreKey::UserAnswers);
        assert_eq!(
            submit_pending(&state).await,
            SubmitStatus::Missing(MissingSession::Answers)
        );
        state.lock().store.clear();
        assert_eq!(
            submit_pending(&state).await,
            SubmitStatus::Missing(MissingSession::UserId)
        );
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unconfigured_service_fails_without_locking_out() -> Fallible<()> {
        let state = ServerState::new(Config::default())?;
        {
            let mut mutable = state.lock();
            mutable.store.set_user_id("mario")?;
            mutable.store.set_answers(&[])?;
        }
        assert!(matches!(
            submit_pending(&state).await,
            SubmitStatus::Failed(SubmitError::Network(_))
        ));
        assert!(state.lock().submit.try_begin());
        Ok(())
    }
}
