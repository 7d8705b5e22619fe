//! Telegram front-end.
//!
//! Long-polls Telegram and relays `/events` and free text to the HTTP API.

mod client;
mod format;

pub use client::ApiClient;
pub use format::{format_events, split_message};

use crate::config::BotSettings;
use crate::error::{HelperError, Result};
use format::{EMPTY_ANSWER_TEXT, HELP_TEXT, NON_TEXT_REPLY, START_TEXT};
use std::sync::Arc;
use std::time::Duration;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ParseMode};
use tracing::{debug, info};

/// A parsed bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Events,
    Unknown,
}

/// Parse `/command` or `/command@botname`. `None` means plain text.
fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    Some(match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "events" => Command::Events,
        _ => Command::Unknown,
    })
}

struct BotContext {
    api: ApiClient,
    max_message_chars: usize,
}

/// Run the bot until Ctrl+C.
pub async fn run_bot(settings: &BotSettings) -> Result<()> {
    let token = settings
        .token
        .clone()
        .ok_or_else(|| HelperError::Bot("TELEGRAM_BOT_TOKEN is not set".to_string()))?;

    let ctx = Arc::new(BotContext {
        api: ApiClient::new(&settings.api_url, Duration::from_secs(settings.chat_timeout_secs)),
        max_message_chars: settings.max_message_chars,
    });

    info!("Starting Telegram bot against {}", settings.api_url);
    let bot = Bot::new(token);
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let ctx = Arc::clone(&ctx);
        async move { handle_message(bot, msg, &ctx).await }
    })
    .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, ctx: &BotContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, NON_TEXT_REPLY).await?;
        return Ok(());
    };

    match parse_command(text) {
        Some(Command::Start) => {
            bot.send_message(chat_id, START_TEXT).await?;
        }
        Some(Command::Help) => {
            bot.send_message(chat_id, HELP_TEXT)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Some(Command::Events) => match ctx.api.events_reply().await {
            Ok(events) => {
                for part in split_message(&format_events(&events), ctx.max_message_chars) {
                    bot.send_message(chat_id, part)
                        .parse_mode(ParseMode::Markdown)
                        .await?;
                }
            }
            Err(apology) => {
                bot.send_message(chat_id, apology).await?;
            }
        },
        Some(Command::Unknown) => debug!("Ignoring unknown command {:?}", text),
        None => {
            info!("Message in chat {}: {}", chat_id.0, text);
            bot.send_chat_action(chat_id, ChatAction::Typing).await?;

            let answer = ctx.api.chat_reply(text).await;
            let parts = split_message(&answer, ctx.max_message_chars);
            if parts.is_empty() {
                bot.send_message(chat_id, EMPTY_ANSWER_TEXT).await?;
            }
            for part in parts {
                bot.send_message(chat_id, part).await?;
            }
        }
    }

    Ok(())
}
