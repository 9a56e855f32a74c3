use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};
use tunebot_rs::bot::{Poller, Router};
use tunebot_rs::config::Settings;
use tunebot_rs::downloader::YtDlp;
use tunebot_rs::lookup::{AniListClient, LyricsClient};
use tunebot_rs::telegram::TelegramApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Music & Anime relay bot...");

    let settings = match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let api = Arc::new(TelegramApi::new(&settings.telegram_token)?);
    let lyrics = Arc::new(LyricsClient::new(&settings.lyrics_api_url)?);
    let anime = Arc::new(AniListClient::new(&settings.anilist_api_url)?);
    let fetcher = Arc::new(YtDlp::new(&settings.downloader_bin, settings.download_dir()));

    let router = Router::new(
        api.clone(),
        lyrics,
        anime,
        fetcher,
        settings.forward_chat_id,
    );
    let poller = Poller::new(
        api,
        router,
        settings.long_poll_timeout_secs,
        Duration::from_secs(settings.idle_delay_secs),
    );

    info!("Bot is running...");
    poller.run().await?;

    Ok(())
}
