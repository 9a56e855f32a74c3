use dotenvy::dotenv;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use tunebot_rs::config::Settings;
use tunebot_rs::telegram::{ChatApi, TelegramApi};

#[tokio::test]
#[ignore = "Requires real credentials"]
async fn test_credentials_validation() {
    // 1. Load .env file correctly
    let env_path = Path::new(".env");
    if env_path.exists() {
        dotenvy::from_path(env_path).ok();
    } else {
        dotenv().ok();
    }

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting integration test for credentials validation...");

    // 2. Validate settings load
    let settings = Settings::new().expect("Failed to load settings (check .env)");
    assert!(
        !settings.telegram_token.is_empty(),
        "TELEGRAM_TOKEN is missing (check .env file or loading logic)"
    );
    assert_ne!(
        settings.forward_chat_id, 0,
        "FORWARD_CHAT_ID is missing or zero"
    );
    info!(
        forward_chat_id = settings.forward_chat_id,
        downloader = %settings.downloader_bin,
        "Settings loaded."
    );

    // 3. Validate the bot token against the live API with a zero-wait poll
    let api = TelegramApi::new(&settings.telegram_token).expect("Failed to build client");
    match api.get_updates(0, 0).await {
        Ok(updates) => info!(count = updates.len(), "getUpdates succeeded."),
        Err(e) => panic!("getUpdates failed, token likely invalid: {e}"),
    }

    info!("Credentials validation test passed successfully.");
}
