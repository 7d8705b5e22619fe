//! HTTP API server command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::server;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, no_watch: bool, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Embed, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'campus-helper doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or(settings.server.host.as_str()).to_string();
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Preparing knowledge base...");
    orchestrator.startup().await?;
    spinner.finish_and_clear();

    let status = orchestrator.index().status();
    if status.installed {
        Output::success(&format!("Index ready ({} chunks)", status.chunks));
    } else {
        Output::warning(&format!(
            "No index yet. Add documents to {} and they will be indexed.",
            orchestrator.index().documents_dir().display()
        ));
    }

    let _watcher = if no_watch {
        None
    } else {
        orchestrator.spawn_watcher()?
    };

    if orchestrator.settings().auth.uses_default_secrets() {
        Output::warning("Using the default admin password or signing key. Set ADMIN_PASSWORD and SECRET_KEY.");
    }

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Campus Helper API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Chat", "POST   /chat");
    Output::kv("List events", "GET    /events");
    Output::kv("Create event", "POST   /events (admin)");
    Output::kv("Delete event", "DELETE /events/{id} (admin)");
    Output::kv("Login", "POST   /login");
    Output::kv("Reindex", "POST   /admin/reindex (admin)");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(listener, orchestrator.app_state()).await?;

    Ok(())
}
