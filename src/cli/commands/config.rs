//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            shown.auth.admin_password = mask(&shown.auth.admin_password);
            shown.auth.secret_key = mask(&shown.auth.secret_key);
            shown.bot.token = shown.bot.token.as_deref().map(mask);

            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => {
            if config_path.exists() {
                Output::warning(&format!("Config already exists at {}", config_path.display()));
            } else {
                settings.save_to(&config_path)?;
                Output::success(&format!("Created config at {}", config_path.display()));
                Output::info("Secrets are best supplied through ADMIN_PASSWORD, SECRET_KEY and TELEGRAM_BOT_TOKEN.");
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Hide all but the last few characters of a secret.
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        "****".to_string()
    } else {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}
