//! Doctor command - verify configuration and local state.

use crate::cli::Output;
use crate::config::Settings;
use crate::documents::DocumentFormat;
use crate::vector_store::INDEX_FILE_NAME;
use console::style;
use std::path::Path;
use walkdir::WalkDir;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    Output::header("Campus Helper Doctor");
    println!();
    println!("Checking configuration and local state...\n");

    let mut checks = Vec::new();

    let credentials = vec![
        check_api_key(settings),
        check_bot_token(settings),
        check_admin_secrets(settings),
    ];
    print_section("Credentials", &credentials);
    checks.extend(credentials);

    let storage = vec![
        check_documents(&settings.documents_dir()),
        check_index(&settings.index_dir()),
        check_events(&settings.events_file()),
    ];
    print_section("Knowledge Base", &storage);
    checks.extend(storage);

    let config = vec![check_config_file(config_path)];
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before serving.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Campus Helper is ready to serve.");
    }

    Ok(())
}

fn check_api_key(settings: &Settings) -> CheckResult {
    let var = settings.provider.api_key_env.as_str();
    let hint = format!("Set with: export {}='sk-...'", var);
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Ok(key) if key.chars().count() > 12 => {
            let head: String = key.chars().take(3).collect();
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            CheckResult::ok(var, &format!("configured ({}...{})", head, tail))
        }
        Ok(_) => CheckResult::warning(
            var,
            "set but looks too short",
            "Check that the whole key was copied",
        ),
        Err(_) => CheckResult::error(var, "not set", &hint),
    }
}

fn check_bot_token(settings: &Settings) -> CheckResult {
    match settings.bot.token.as_deref() {
        Some(token) if !token.trim().is_empty() => {
            CheckResult::ok("TELEGRAM_BOT_TOKEN", "configured")
        }
        _ => CheckResult::warning(
            "TELEGRAM_BOT_TOKEN",
            "not set (only needed for the bot)",
            "Set with: export TELEGRAM_BOT_TOKEN='...'",
        ),
    }
}

fn check_admin_secrets(settings: &Settings) -> CheckResult {
    if settings.auth.uses_default_secrets() {
        CheckResult::warning(
            "Admin secrets",
            "default password or signing key in use",
            "Set ADMIN_PASSWORD and SECRET_KEY before exposing the server",
        )
    } else {
        CheckResult::ok(
            "Admin secrets",
            &format!("custom (user '{}')", settings.auth.admin_username),
        )
    }
}

/// Count indexable files under the knowledge base directory.
fn count_documents(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| DocumentFormat::from_path(entry.path()).is_some())
        .count()
}

fn check_documents(dir: &Path) -> CheckResult {
    if !dir.exists() {
        return CheckResult::error(
            "Documents",
            &format!("{} does not exist", dir.display()),
            "Create it and add .txt, .md, .pdf, .docx, .html or .json files",
        );
    }

    match count_documents(dir) {
        0 => CheckResult::warning(
            "Documents",
            &format!("{} (no supported files)", dir.display()),
            "Add .txt, .md, .pdf, .docx, .html or .json files",
        ),
        n => CheckResult::ok("Documents", &format!("{} ({} files)", dir.display(), n)),
    }
}

fn check_index(dir: &Path) -> CheckResult {
    let path = dir.join(INDEX_FILE_NAME);
    if path.exists() {
        let size = std::fs::metadata(&path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        CheckResult::ok("Index", &format!("{} ({})", path.display(), size))
    } else {
        CheckResult::warning(
            "Index",
            &format!("{} (not built yet)", path.display()),
            "Build with: campus-helper reindex",
        )
    }
}

fn check_events(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning(
            "Events",
            &format!("{} (will be seeded)", path.display()),
            "Sample events are written on first serve",
        );
    }

    let parsed = std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Vec<serde_json::Value>>(&content).ok());
    match parsed {
        Some(events) => CheckResult::ok(
            "Events",
            &format!("{} ({} events)", path.display(), events.len()),
        ),
        None => CheckResult::error(
            "Events",
            &format!("{} is not a JSON list", path.display()),
            "Fix or remove the file; it is read as empty until then",
        ),
    }
}

fn check_config_file(config_path: Option<&Path>) -> CheckResult {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Settings::default_config_path);
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: campus-helper config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
