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

use std::time::Duration;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::FetchError;
use crate::error::SubmitError;
use crate::types::answer::Answer;
use crate::types::graded::GradedResult;
use crate::types::question::Question;
use crate::types::timestamp::Timestamp;

/// The characters `encodeURIComponent` leaves alone.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// HTTP client for the spreadsheet-backed scoring service. Every call is a
/// single request with no retries, bounded by the client's timeout.
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    action: &'static str,
    user_id: &'a str,
    answers: &'a [Answer],
    timestamp: Timestamp,
}

#[derive(Deserialize)]
struct QuestionsResponse {
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    error: Option<Value>,
}

impl ScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> Fallible<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ErrorReport::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch a random set of questions, without their answers.
    pub async fn fetch_questions(&self, count: usize) -> Result<Vec<Question>, FetchError> {
        let url = format!("{}?action=getQuestions&count={count}", self.base_url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP status {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let payload: QuestionsResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        if let Some(error) = payload.error {
            return Err(FetchError::Remote(error_message(&error)));
        }
        if payload.questions.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(payload.questions)
    }

    /// Submit a completed answer sheet for grading. A graded result that did
    /// not pass is still `Ok`.
    pub async fn submit(
        &self,
        user_id: &str,
        answers: &[Answer],
    ) -> Result<GradedResult, SubmitError> {
        let request = SubmitRequest {
            action: "submitScore",
            user_id,
            answers,
            timestamp: Timestamp::now(),
        };
        let body =
            serde_json::to_string(&request).map_err(|e| SubmitError::Network(e.to_string()))?;
        // The service rejects preflighted content types, so JSON is sent as
        // plain text.
        let response = self
            .client
            .post(&self.base_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Network(format!("HTTP status {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|e| SubmitError::Network(e.to_string()))?;
        decode_submit_payload(payload)
    }

    /// Fetch a player's history. Purely informational: any failure yields
    /// `None`.
    pub async fn history(&self, user_id: &str) -> Option<Value> {
        let user_id = utf8_percent_encode(user_id, URI_COMPONENT);
        let url = format!("{}?action=getUserHistory&userId={user_id}", self.base_url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Failed to fetch history: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            log::warn!("Failed to fetch history: HTTP status {}", response.status());
            return None;
        }
        match response.text().await {
            Ok(body) => match serde_json::from_str::<Value>(&body) {
                Ok(Value::Null) => None,
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Failed to decode history: {e}");
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read history: {e}");
                None
            }
        }
    }
}

fn decode_submit_payload(payload: Value) -> Result<GradedResult, SubmitError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        return Err(SubmitError::Remote(error_message(error)));
    }
    let success = payload
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        return Err(SubmitError::Remote("submission failed".to_string()));
    }
    serde_json::from_value(payload).map_err(|e| SubmitError::Network(e.to_string()))
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::helper::FakeService;
    use crate::helper::fake_questions;
    use crate::helper::graded_json;
    use crate::helper::spawn_fake_service;
    use crate::helper::unreachable_url;
    use crate::types::option_key::OptionKey;
    use crate::types::question::QuestionId;

    fn answers() -> Vec<Answer> {
        vec![
            Answer {
                question_id: QuestionId::from(1),
                selected: OptionKey::A,
            },
            Answer {
                question_id: QuestionId::from(2),
                selected: OptionKey::C,
            },
        ]
    }

    fn client(url: &str) -> ScoringClient {
        ScoringClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_questions() -> Fallible<()> {
        let service = FakeService::new().with_questions(fake_questions(3));
        let fake = spawn_fake_service(service).await;
        let questions = client(&fake.url).fetch_questions(10).await.unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(fake.question_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fake.last_count.lock().unwrap().as_deref(),
            Some("10")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_questions_failures() -> Fallible<()> {
        let empty = spawn_fake_service(FakeService::new().with_questions(vec![])).await;
        assert!(matches!(
            client(&empty.url).fetch_questions(10).await,
            Err(FetchError::Empty)
        ));

        let remote = spawn_fake_service(
            FakeService::new().with_questions_payload(json!({"error": "sheet missing"})),
        )
        .await;
        match client(&remote.url).fetch_questions(10).await {
            Err(FetchError::Remote(message)) => assert_eq!(message, "sheet missing"),
            _ => panic!("expected a remote error"),
        }

        let malformed = spawn_fake_service(
            FakeService::new().with_questions_payload(json!({"questions": [{"id": 1}]})),
        )
        .await;
        assert!(matches!(
            client(&malformed.url).fetch_questions(10).await,
            Err(FetchError::Malformed(_))
        ));

        assert!(matches!(
            client(&unreachable_url()).fetch_questions(10).await,
            Err(FetchError::Network(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_success() -> Fallible<()> {
        let fake = spawn_fake_service(FakeService::new().with_submit(graded_json(7, 10, true))).await;
        let result = client(&fake.url).submit("mario", &answers()).await.unwrap();
        assert_eq!(result.score, 7);
        assert!(result.passed);
        assert_eq!(fake.submit_calls.load(Ordering::SeqCst), 1);

        let body = fake.last_submit.lock().unwrap().clone().unwrap();
        assert_eq!(body["action"], "submitScore");
        assert_eq!(body["userId"], "mario");
        assert_eq!(body["answers"][1]["questionId"], 2);
        assert_eq!(body["answers"][1]["selected"], "C");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_score_is_not_an_error() -> Fallible<()> {
        let fake = spawn_fake_service(FakeService::new().with_submit(graded_json(2, 10, false))).await;
        let result = client(&fake.url).submit("luigi", &answers()).await.unwrap();
        assert!(!result.passed);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_errors() -> Fallible<()> {
        let remote = spawn_fake_service(
            FakeService::new().with_submit(json!({"success": false, "error": "quota exceeded"})),
        )
        .await;
        assert_eq!(
            client(&remote.url).submit("mario", &answers()).await,
            Err(SubmitError::Remote("quota exceeded".to_string()))
        );

        let rejected =
            spawn_fake_service(FakeService::new().with_submit(json!({"success": false}))).await;
        assert_eq!(
            client(&rejected.url).submit("mario", &answers()).await,
            Err(SubmitError::Remote("submission failed".to_string()))
        );

        let status = spawn_fake_service(FakeService::new().with_submit_status(500)).await;
        assert!(matches!(
            client(&status.url).submit("mario", &answers()).await,
            Err(SubmitError::Network(_))
        ));

        assert!(matches!(
            client(&unreachable_url()).submit("mario", &answers()).await,
            Err(SubmitError::Network(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_timeout_is_a_network_error() -> Fallible<()> {
        let fake = spawn_fake_service(
            FakeService::new()
                .with_submit(graded_json(7, 10, true))
                .with_delay(Duration::from_millis(500)),
        )
        .await;
        let client = ScoringClient::new(&fake.url, Duration::from_millis(100))?;
        assert!(matches!(
            client.submit("mario", &answers()).await,
            Err(SubmitError::Network(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_a_network_error() -> Fallible<()> {
        let fake =
            spawn_fake_service(FakeService::new().with_delay(Duration::from_millis(500))).await;
        let client = ScoringClient::new(&fake.url, Duration::from_millis(100))?;
        assert!(matches!(
            client.fetch_questions(10).await,
            Err(FetchError::Network(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_history() -> Fallible<()> {
        let fake = spawn_fake_service(
            FakeService::new().with_history(json!({"plays": 3, "best": 9})),
        )
        .await;
        let history = client(&fake.url).history("mario bros").await;
        assert_eq!(history, Some(json!({"plays": 3, "best": 9})));
        assert_eq!(
            fake.last_user_id.lock().unwrap().as_deref(),
            Some("mario bros")
        );

        assert_eq!(client(&unreachable_url()).history("mario").await, None);
        Ok(())
    }
}
