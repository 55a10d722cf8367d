//! Fleetmon - dashboard client for phone-bank fleet monitoring
//!
//! A CLI that authenticates against the fleet backend, fetches the
//! institution/phone-bank dashboard, renders derived map locations,
//! and manages phone banks, phones, and scheduled tasks.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, rejected request, etc.)
//!   2 - Authentication required (no session, or session expired)

mod api;
mod auth;
mod cli;
mod config;
mod dashboard;
mod models;
mod render;

use anyhow::{Context, Result};
use api::{ApiClient, ApiError};
use auth::{CredentialStore, Credentials, FileCredentialStore};
use chrono::Utc;
use cli::{Args, Command, CrudAction, InstitutionAction, PolicyArg, TaskAction};
use config::Config;
use dashboard::normalize::StatusPolicy;
use dashboard::DashboardStore;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("Fleetmon v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fleetmon.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".fleetmon.toml");

    if path.exists() {
        eprintln!("⚠️  .fleetmon.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .fleetmon.toml")?;

    println!("✅ Created .fleetmon.toml with default settings.");
    println!("   Edit it to set the backend URL and status policy.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the parsed command. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let store = FileCredentialStore::new(
        config
            .auth
            .credentials_path
            .clone()
            .unwrap_or_else(FileCredentialStore::default_path),
    );
    let client = ApiClient::new(&config.api.base_url, config.api.timeout_seconds);

    let Some(command) = args.command.clone() else {
        return Ok(1); // Unreachable after validate(), kept for safety.
    };

    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };

            match client.login(&username, &password).await {
                Ok(token) => {
                    // Backends that omit the user object still get a
                    // minimal record so `whoami` has something to show.
                    let user = token
                        .user
                        .clone()
                        .or_else(|| Some(json!({ "username": username })));
                    store.set(&Credentials {
                        token: token.access_token,
                        user,
                    })?;
                    println!("✅ Logged in. Session stored at {}", store.path().display());
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    Ok(1)
                }
            }
        }

        Command::Logout => {
            store.clear()?;
            println!("Logged out.");
            Ok(0)
        }

        Command::Whoami => match store.get()? {
            Some(creds) => {
                let name = creds
                    .user
                    .as_ref()
                    .and_then(|u| u.get("username"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                println!("Logged in as {}", name);
                Ok(0)
            }
            None => {
                println!("Not logged in.");
                Ok(2)
            }
        },

        Command::Dashboard { search, policy } => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };

            let policy = match policy {
                Some(PolicyArg::Simple) => StatusPolicy::Simple,
                Some(PolicyArg::Recursive) => StatusPolicy::Recursive,
                None => config.dashboard.status_policy,
            };

            run_dashboard(&client, &store, &args, policy, search).await
        }

        Command::Institutions { action } => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };
            let InstitutionAction::Get { id } = action;
            report(client.get_institution(id).await, &store)
        }

        Command::PhoneBanks { action } => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };
            let result = crud_request(&client, "phone-banks", action).await?;
            report(result, &store)
        }

        Command::Phones { action } => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };
            let result = crud_request(&client, "phones", action).await?;
            report(result, &store)
        }

        Command::Tasks { action } => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };
            let result = match action {
                TaskAction::List => client.get("tasks").await,
                TaskAction::Get { id } => client.get(&format!("tasks/{}", id)).await,
                TaskAction::Create { data } => client.post("tasks", Some(parse_data(&data)?)).await,
                TaskAction::Update { id, data } => {
                    client
                        .put(&format!("tasks/{}", id), Some(parse_data(&data)?))
                        .await
                }
                TaskAction::Delete { id } => client.delete(&format!("tasks/{}", id)).await,
                TaskAction::Toggle { id } => client.toggle_task(id).await,
                TaskAction::Execute { id } => client.execute_task(id).await,
                TaskAction::Logs { id } => client.task_logs(id).await,
                TaskAction::UploadMedia { id, file } => {
                    client.upload_task_media(id, &file).await
                }
                TaskAction::UploadProfileImage { id, file } => {
                    client.upload_profile_image(id, &file).await
                }
            };
            report(result, &store)
        }

        Command::Notifications => {
            let client = match require_session(client, &store)? {
                Ok(client) => client,
                Err(code) => return Ok(code),
            };
            report(client.list_notifications().await, &store)
        }
    }
}

/// Fetch, aggregate, filter, and render the dashboard.
async fn run_dashboard(
    client: &ApiClient,
    store: &FileCredentialStore,
    args: &Args,
    policy: StatusPolicy,
    search: Option<String>,
) -> Result<i32> {
    let mut dashboard = DashboardStore::new(policy);
    dashboard.subscribe(|state| {
        debug!(
            loading = state.loading,
            query = %state.search_query,
            "dashboard state changed"
        );
    });

    dashboard.begin_fetch();
    let progress = spinner(args.quiet, "Fetching dashboard...");
    let result = client.get_dashboard().await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if let Err(ApiError::Unauthorized) = result {
        return handle_unauthorized(store);
    }
    dashboard.apply_fetch(result.map_err(|e| e.to_string()));

    if let Some(message) = dashboard.state().error.clone() {
        eprintln!("❌ Error: {}", message);
        return Ok(1);
    }

    if let Some(query) = search {
        dashboard.set_search_query(query);
    }

    let locations = dashboard.filtered_locations();
    info!(
        "Showing {} of {} locations",
        locations.len(),
        dashboard.locations().len()
    );
    println!(
        "{}",
        render::render_dashboard(
            &dashboard.state().summary,
            &locations,
            Utc::now(),
            args.format
        )
    );
    Ok(0)
}

/// Run a standard CRUD action against a resource family.
async fn crud_request(
    client: &ApiClient,
    resource: &str,
    action: CrudAction,
) -> Result<std::result::Result<Value, ApiError>> {
    Ok(match action {
        CrudAction::List => client.get(resource).await,
        CrudAction::Get { id } => client.get(&format!("{}/{}", resource, id)).await,
        CrudAction::Create { data } => client.post(resource, Some(parse_data(&data)?)).await,
        CrudAction::Update { id, data } => {
            client
                .put(&format!("{}/{}", resource, id), Some(parse_data(&data)?))
                .await
        }
        CrudAction::Delete { id } => client.delete(&format!("{}/{}", resource, id)).await,
    })
}

/// Print a pass-through response, mapping authorization failures to
/// the session-expired recovery.
fn report(
    result: std::result::Result<Value, ApiError>,
    store: &FileCredentialStore,
) -> Result<i32> {
    match result {
        Ok(value) => {
            println!("{}", render::render_value(&value));
            Ok(0)
        }
        Err(ApiError::Unauthorized) => handle_unauthorized(store),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            Ok(1)
        }
    }
}

/// A 401 outside of login: drop the stored session and ask the user to
/// log in again.
fn handle_unauthorized(store: &FileCredentialStore) -> Result<i32> {
    store.clear()?;
    warn!("Server returned 401, stored credentials cleared");
    eprintln!("⛔ Session expired. Run `fleetmon login <username>` to sign in again.");
    Ok(2)
}

/// Attach the stored session token, or explain how to get one.
fn require_session(
    client: ApiClient,
    store: &FileCredentialStore,
) -> Result<std::result::Result<ApiClient, i32>> {
    match store.get()? {
        Some(creds) => Ok(Ok(client.with_token(creds.token))),
        None => {
            eprintln!("Not logged in. Run `fleetmon login <username>` first.");
            Ok(Err(2))
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            debug!("Loaded default config from .fleetmon.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Parse a `--data` JSON body.
fn parse_data(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("Invalid JSON in --data")
}

/// Read a password from stdin.
fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Spinner shown while a fetch is in flight.
fn spinner(quiet: bool, message: &str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner());
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(120));
    Some(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data() {
        assert!(parse_data(r#"{"ip": "10.0.0.1"}"#).is_ok());
        assert!(parse_data("not json").is_err());
    }
}
