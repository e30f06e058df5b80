//! Authoritative real-time game server for a multiplayer quiz/party game.
//!
//! Every room is a single-threaded actor task holding all match truth
//! (scores, timers, question selection, turn order, elimination). Clients
//! never mutate state directly: they send intents over a transport, the
//! phase machine validates and mutates, and the room broadcasts a fresh
//! snapshot. See `phase::machine` for the dispatch entrypoint.

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod ids;
pub mod model;
pub mod phase;
pub mod room_actor;
pub mod store;
pub mod time;
pub mod transport;
pub mod tts;

/// Initializes logging and installs a ctrl-c force-exit handler.
///
/// Mirrors the earlier `lib.rs::init()`: a combined term+file logger
/// under `logs/`, plus a background task that force-exits on ctrl-c.
pub fn init() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        println!();
        log::warn!("forcing exit");
        std::process::exit(0);
    });
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
