use std::collections::HashMap;
use std::sync::Arc;

use dotenv::dotenv;
use photo_quiz_frame::config::FrameConfig;
use photo_quiz_frame::quiz::{Quiz, PROJECT_ID, PROJECT_TITLE};
use photo_quiz_frame::telegram::{self, MembershipStorage, Sessions};
use teloxide::{
    dispatching::dialogue::{serializer::Json, SqliteStorage, Storage},
    prelude::*,
};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Err(err) = dotenv() {
        eprintln!("No .env file loaded: {}", err);
    }

    pretty_env_logger::init();
    log::info!("Starting {} ({})...", PROJECT_TITLE, PROJECT_ID);

    let config = FrameConfig::from_env()?;
    if let Err(err) = config.manifest.validate() {
        log::warn!("Frame manifest is invalid, add requests will be refused: {}", err);
    }

    let bot = Bot::from_env();

    log::info!("Opening membership storage at {}", config.db_path);
    let storage: MembershipStorage = SqliteStorage::open(&config.db_path, Json)
        .await?
        .erase();

    let quiz = Arc::new(Quiz::builtin());
    log::info!("Loaded {} questions", quiz.len());

    let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));
    let config = Arc::new(config);

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![storage, sessions, config, quiz])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
