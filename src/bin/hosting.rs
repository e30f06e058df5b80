//! hosting Server Binary
//!
//! Runs the HTTP server for hosting live game rooms.
//! Supports WebSocket connections for real-time play.

use clap::Parser;
use partyquiz_server::config::Config;
use partyquiz_server::fuzzy::LevenshteinMatcher;
use partyquiz_server::room_actor::RoomDeps;
use partyquiz_server::store::questions::JsonFileQuestionStore;
use partyquiz_server::transport::server::Server;
use partyquiz_server::tts::{NullTts, TtsCache};
use std::sync::Arc;

#[derive(Parser)]
struct Cli {
    /// Path to the JSON question bank.
    #[arg(long, env = "QUESTIONS_PATH", default_value = "questions.json")]
    questions: String,
}

#[tokio::main]
async fn main() {
    partyquiz_server::init();
    let cli = Cli::parse();
    let config = Config::from_env();
    let questions = JsonFileQuestionStore::load(&cli.questions).expect("load question bank");
    let deps = RoomDeps {
        questions: Arc::new(questions),
        fuzzy: Arc::new(LevenshteinMatcher),
        tts: Arc::new(TtsCache::new(Arc::new(NullTts))),
    };
    Server::run(config, deps).await.unwrap();
}
