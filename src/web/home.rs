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
use maud::html;
use serde::Deserialize;

use crate::web::state::ServerState;
use crate::web::template::page_template;

#[derive(Deserialize)]
pub struct StartForm {
    user_id: String,
}

pub async fn home_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let error = state.lock().home_error.take();
    render_home(&state, error.as_deref())
}

pub async fn start_handler(
    State(state): State<ServerState>,
    form: Result<Form<StartForm>, FormRejection>,
) -> Response {
    let user_id = match form {
        Ok(Form(form)) => form.user_id.trim().to_string(),
        Err(e) => {
            log::error!("Malformed start form: {e}");
            String::new()
        }
    };
    if user_id.is_empty() {
        return render_home(&state, Some("Please enter your ID!")).into_response();
    }
    let mut mutable = state.lock();
    mutable.reset();
    if let Err(e) = mutable.store.set_user_id(&user_id) {
        log::error!("{e}");
        drop(mutable);
        return render_home(&state, Some("Something went wrong, please try again.")).into_response();
    }
    log::debug!("Starting a game for {user_id}");
    Redirect::to("/quiz").into_response()
}

fn render_home(state: &ServerState, error: Option<&str>) -> (StatusCode, Html<String>) {
    let rules = format!(
        "Answer {} questions. Get {} right to clear the stage.",
        state.config.question_count, state.config.pass_threshold
    );
    let body = html! {
        div.home {
            h1.title { "PIXEL QUIZ" }
            p.subtitle { "Beat every boss!" }
            div.panel {
                form action="/" method="post" {
                    label for="user_id" { "Enter your ID" }
                    input #user_id type="text" name="user_id" placeholder="YOUR ID" autofocus;
                    @if let Some(error) = error {
                        p.error { (error) }
                    }
                    input #start type="submit" value="START";
                }
            }
            p.rules { (rules) }
            // Warm the browser cache with the boss avatars.
            @for url in state.avatars.urls() {
                link rel="prefetch" href=(url);
            }
        }
    };
    (StatusCode::OK, Html(page_template(body).into_string()))
}
