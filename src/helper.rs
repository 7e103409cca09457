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

//! A fake scoring service for tests, served by a real axum router on a free
//! local port.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::sleep;

use crate::types::question::Question;

#[derive(Clone)]
pub struct FakeService {
    questions: Value,
    submit: Value,
    submit_status: u16,
    history: Value,
    delay: Duration,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            questions: json!({ "questions": fake_questions(5) }),
            submit: graded_json(7, 10, true),
            submit_status: 200,
            history: Value::Null,
            delay: Duration::ZERO,
        }
    }
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = json!({ "questions": questions });
        self
    }

    pub fn with_questions_payload(mut self, payload: Value) -> Self {
        self.questions = payload;
        self
    }

    pub fn with_submit(mut self, payload: Value) -> Self {
        self.submit = payload;
        self
    }

    pub fn with_submit_status(mut self, status: u16) -> Self {
        self.submit_status = status;
        self
    }

    pub fn with_history(mut self, payload: Value) -> Self {
        self.history = payload;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Handle to a running fake service, with counters of what it received.
#[derive(Clone)]
pub struct FakeHandle {
    pub url: String,
    pub question_calls: Arc<AtomicUsize>,
    pub submit_calls: Arc<AtomicUsize>,
    pub last_count: Arc<Mutex<Option<String>>>,
    pub last_submit: Arc<Mutex<Option<Value>>>,
    pub last_user_id: Arc<Mutex<Option<String>>>,
}

#[derive(Clone)]
struct FakeState {
    service: FakeService,
    handle: FakeHandle,
}

pub async fn spawn_fake_service(service: FakeService) -> FakeHandle {
    let port = portpicker::pick_unused_port().unwrap();
    let handle = FakeHandle {
        url: format!("http://127.0.0.1:{port}/exec"),
        question_calls: Arc::new(AtomicUsize::new(0)),
        submit_calls: Arc::new(AtomicUsize::new(0)),
        last_count: Arc::new(Mutex::new(None)),
        last_submit: Arc::new(Mutex::new(None)),
        last_user_id: Arc::new(Mutex::new(None)),
    };
    let state = FakeState {
        service,
        handle: handle.clone(),
    };
    let app = Router::new()
        .route("/exec", get(fake_get).post(fake_post))
        .with_state(state);
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await.unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    handle
}

/// A URL nothing is listening on.
pub fn unreachable_url() -> String {
    let port = portpicker::pick_unused_port().unwrap();
    format!("http://127.0.0.1:{port}/exec")
}

async fn fake_get(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    sleep(state.service.delay).await;
    match params.get("action").map(String::as_str) {
        Some("getQuestions") => {
            state.handle.question_calls.fetch_add(1, Ordering::SeqCst);
            *state.handle.last_count.lock().unwrap() = params.get("count").cloned();
            (StatusCode::OK, state.service.questions.to_string())
        }
        Some("getUserHistory") => {
            *state.handle.last_user_id.lock().unwrap() = params.get("userId").cloned();
            (StatusCode::OK, state.service.history.to_string())
        }
        _ => (
            StatusCode::OK,
            json!({ "error": "unknown action" }).to_string(),
        ),
    }
}

async fn fake_post(State(state): State<FakeState>, body: String) -> (StatusCode, String) {
    state.handle.submit_calls.fetch_add(1, Ordering::SeqCst);
    *state.handle.last_submit.lock().unwrap() = serde_json::from_str(&body).ok();
    sleep(state.service.delay).await;
    let status = StatusCode::from_u16(state.service.submit_status).unwrap();
    (status, state.service.submit.to_string())
}

pub fn fake_questions(n: usize) -> Vec<Question> {
    (1..=n)
        .map(|i| {
            Question::new(
                i as u64,
                &format!("Remote question {i}?"),
                ["alpha", "bravo", "charlie", "delta"],
            )
        })
        .collect()
}

/// A successful grading payload whose first `score` answers are correct.
pub fn graded_json(score: u32, total: u32, passed: bool) -> Value {
    let results: Vec<Value> = (0..total)
        .map(|i| {
            if i < score {
                json!({ "isCorrect": true, "selected": "A", "selectedText": "alpha" })
            } else {
                json!({
                    "isCorrect": false,
                    "selected": "B",
                    "selectedText": "bravo",
                    "correctAnswer": "A",
                    "correctAnswerText": "alpha",
                    "question": format!("Remote question {}?", i + 1),
                })
            }
        })
        .collect();
    json!({
        "success": true,
        "score": score,
        "total": total,
        "passed": passed,
        "passThreshold": 7,
        "userId": "mario",
        "results": results,
    })
}
