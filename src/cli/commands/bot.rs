//! Telegram bot command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;

/// Run the Telegram bot until interrupted.
pub async fn run_bot(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Bot, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    Output::info(&format!("Relaying to {}", settings.bot.api_url));
    Output::info("Press Ctrl+C to stop the bot.");
    crate::bot::run_bot(&settings.bot).await?;

    Ok(())
}
