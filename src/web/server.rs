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

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::signal::ctrl_c;
use tokio::time::sleep;

use crate::config::Config;
use crate::error::Fallible;
use crate::web::home::home_handler;
use crate::web::home::start_handler;
use crate::web::quiz::quiz_action_handler;
use crate::web::quiz::quiz_handler;
use crate::web::result::result_action_handler;
use crate::web::result::result_handler;
use crate::web::state::ServerState;

pub async fn start_server(config: Config, open_browser: bool) -> Fallible<()> {
    let bind = format!("127.0.0.1:{}", config.port);
    let state = ServerState::new(config)?;
    let app = router(state);

    if open_browser {
        // Start a separate task to open the browser.
        let url = format!("http://{bind}/");
        let target = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&target).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            if let Err(e) = open::that(&url) {
                log::warn!("Failed to open the browser: {e}");
            }
        });
    }

    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    println!("Serving on http://{bind}/");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/", get(home_handler).post(start_handler));
    let app = app.route("/quiz", get(quiz_handler).post(quiz_action_handler));
    let app = app.route("/result", get(result_handler).post(result_action_handler));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
    }
    log::debug!("Shutting down.");
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
