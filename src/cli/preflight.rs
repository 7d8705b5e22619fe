//! Pre-flight checks before operations that call external services.
//!
//! Fails fast with a hint instead of erroring halfway through a request.

use crate::config::Settings;
use crate::error::{HelperError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving, reindexing, searching and asking embed text.
    Embed,
    /// The Telegram bot needs its token.
    Bot,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Embed => check_api_key(settings),
        Operation::Bot => check_bot_token(settings),
    }
}

/// Check that the provider API key variable is set.
fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.provider.api_key_env;
    match settings.provider.api_key() {
        Some(_) => Ok(()),
        None => Err(HelperError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

fn check_bot_token(settings: &Settings) -> Result<()> {
    match settings.bot.token.as_deref() {
        Some(token) if !token.trim().is_empty() => Ok(()),
        _ => Err(HelperError::Config(
            "TELEGRAM_BOT_TOKEN not set. Set it with: export TELEGRAM_BOT_TOKEN='...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_variable() {
        let mut settings = Settings::default();
        settings.provider.api_key_env = "CAMPUS_HELPER_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let err = check(Operation::Embed, &settings).unwrap_err();
        assert!(err.to_string().contains("CAMPUS_HELPER_TEST_KEY_THAT_IS_NEVER_SET not set"));
    }

    #[test]
    fn test_bot_token() {
        let mut settings = Settings::default();
        settings.bot.token = None;
        assert!(check(Operation::Bot, &settings).is_err());

        settings.bot.token = Some("123:abc".to_string());
        assert!(check(Operation::Bot, &settings).is_ok());
    }
}
