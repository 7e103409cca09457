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

use clap::Parser;

use crate::client::ScoringClient;
use crate::config::Config;
use crate::config::ConfigArgs;
use crate::error::Fallible;
use crate::error::fail;
use crate::source::QuestionSource;
use crate::web::server::start_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the game and open it in the browser.
    Play {
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the questions a new game would use, as JSON.
    Questions {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print a player's history from the scoring service, as JSON.
    History {
        /// The player's ID.
        user_id: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Play { no_open, config } => {
            let config = Config::load(&config)?;
            start_server(config, !no_open).await
        }
        Command::Questions { config } => {
            let config = Config::load(&config)?;
            let source = QuestionSource::new(scoring_client(&config)?);
            let questions = source.load(config.question_count).await;
            println!("{}", serde_json::to_string_pretty(&questions)?);
            Ok(())
        }
        Command::History { user_id, config } => {
            let config = Config::load(&config)?;
            let Some(client) = scoring_client(&config)? else {
                return fail("no scoring service configured.");
            };
            match client.history(&user_id).await {
                Some(history) => println!("{}", serde_json::to_string_pretty(&history)?),
                None => println!("No history available."),
            }
            Ok(())
        }
    }
}

fn scoring_client(config: &Config) -> Fallible<Option<ScoringClient>> {
    match &config.scoring_url {
        Some(url) => Ok(Some(ScoringClient::new(url, config.timeout)?)),
        None => Ok(None),
    }
}
