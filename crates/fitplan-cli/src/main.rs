//! fitplan - command-line client for the diet and fitness service.
//!
//! Logs in, registers, and talks to the protected API endpoints
//! (dashboard, image upload, plans) using a session persisted between runs.

mod prompt;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fitplan_core::models::ImageUpload;
use fitplan_core::{
    ApiClient, AuthError, Config, SessionController, SessionPhase, ThemeController, ThemeMode,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the configured API base URL
const API_URL_ENV: &str = "FITPLAN_API_URL";

/// Log file name in the data directory
const LOG_FILE: &str = "fitplan.log";

const USAGE: &str = "\
Usage: fitplan <command> [args]

Commands:
  login [email]            Log in and remember the session
  register [email]         Create an account
  logout                   Forget the session
  status                   Show session and theme state
  dashboard                Show your fitness dashboard
  upload <path>            Upload a JPG or PNG progress image (max 5MB)
  plan                     Show your current diet and workout plans
  generate-plan <prompt>   Generate plans for a goal description
  theme [toggle|light|dark]
                           Show or change the theme mode";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so command output on stdout stays clean.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

/// Everything a command needs
struct App {
    config: Config,
    session: SessionController,
    theme: ThemeController,
}

impl App {
    fn open(config: Config) -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| config.base_url().to_string());
        info!(%base_url, storage = ?config.storage, "Opening session");

        let store = config.open_store()?;
        let api = ApiClient::new(base_url)?;
        let session = SessionController::new(api, store.clone());
        session.initialize();
        let theme = ThemeController::load(store, system_theme());

        Ok(Self {
            config,
            session,
            theme,
        })
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return;
    }

    if let Err(e) = run(&args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            Config::default()
        }
    };

    let log_dir = config
        .data_dir()
        .unwrap_or_else(|_| PathBuf::from("./fitplan-data"));
    let _guard = init_tracing(&log_dir)?;
    info!(command = %args[0], "fitplan starting");

    let mut app = App::open(config)?;
    let rest = &args[1..];

    match args[0].as_str() {
        "login" => login(&mut app, rest.first().map(String::as_str)).await,
        "register" => register(&app, rest.first().map(String::as_str)).await,
        "logout" => {
            app.session.logout();
            println!("Logged out.");
            Ok(())
        }
        "status" => {
            status(&app);
            Ok(())
        }
        "dashboard" => dashboard(&app).await,
        "upload" => match rest.first() {
            Some(path) => upload(&app, Path::new(path)).await,
            None => bail!("Please select a file to upload: fitplan upload <path>"),
        },
        "plan" => plan(&app).await,
        "generate-plan" => {
            let prompt = rest.join(" ");
            if prompt.trim().is_empty() {
                bail!("Describe your goals: fitplan generate-plan <prompt>");
            }
            generate_plan(&app, &prompt).await
        }
        "theme" => theme(&mut app, rest.first().map(String::as_str)),
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

// ============================================================================
// Account commands
// ============================================================================

async fn login(app: &mut App, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt::email(app.config.last_email.as_deref())?,
    };
    let password = prompt::password("Password: ")?;

    if email.is_empty() || password.is_empty() {
        bail!("Email and password are required");
    }

    println!("Logging in...");
    app.session.login(&email, &password).await?;

    app.config.last_email = Some(email);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let who = app.session.subject().unwrap_or_default();
    println!("Welcome back, {}!", who);
    Ok(())
}

async fn register(app: &App, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt::email(None)?,
    };
    let password = prompt::password("Password: ")?;
    let confirm = prompt::password("Confirm Password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }
    if email.is_empty() || password.is_empty() {
        bail!("Email and password are required");
    }

    println!("Registering...");
    let message = app.session.register(&email, &password).await?;
    println!("{}", message);
    println!("Log in with `fitplan login {}`.", email);
    Ok(())
}

fn status(app: &App) {
    match app.session.phase() {
        SessionPhase::Authenticated => {
            let who = app.session.subject().unwrap_or_default();
            println!("Logged in as {}", who);
        }
        SessionPhase::Anonymous | SessionPhase::Unknown => println!("Not logged in"),
    }
    println!("Theme: {}", app.theme.mode());
}

fn theme(app: &mut App, arg: Option<&str>) -> Result<()> {
    let mode = match arg {
        None => app.theme.mode(),
        Some("toggle") => app.theme.toggle(),
        Some(value) => {
            let mode: ThemeMode = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            app.theme.set(mode)
        }
    };
    println!("Theme: {}", mode);
    Ok(())
}

// ============================================================================
// Protected commands
// ============================================================================

/// Stop early when there is no session
fn require_login(app: &App) -> Result<()> {
    if !app.session.is_authenticated() {
        bail!("Not logged in. Run `fitplan login` first.");
    }
    Ok(())
}

/// Turn a forced logout into a prompt to log in again
fn explain(err: AuthError) -> anyhow::Error {
    if err.forces_logout() {
        anyhow::anyhow!("{}. Run `fitplan login` to sign in again.", err)
    } else {
        err.into()
    }
}

async fn dashboard(app: &App) -> Result<()> {
    require_login(app)?;
    let data = app
        .session
        .authenticated()
        .fetch_dashboard()
        .await
        .map_err(explain)?;

    println!("{}", data.title());
    println!();
    if !data.message.is_empty() {
        println!("{}", data.message);
    }
    if !data.progress.is_empty() {
        println!("Progress: {}", data.progress);
    }
    println!("Last Updated: {}", data.last_update_display());
    Ok(())
}

async fn upload(app: &App, path: &Path) -> Result<()> {
    require_login(app)?;
    let image = ImageUpload::from_path(path)?;

    println!("Uploading {}...", image.file_name());
    let receipt = app
        .session
        .authenticated()
        .upload_image(image)
        .await
        .map_err(explain)?;

    println!("{}", receipt.message);
    if !receipt.filename.is_empty() {
        println!("Stored as {}", receipt.filename);
    }
    Ok(())
}

async fn plan(app: &App) -> Result<()> {
    require_login(app)?;
    let plans = app
        .session
        .authenticated()
        .fetch_plan()
        .await
        .map_err(explain)?;
    print_plans(&plans);
    Ok(())
}

async fn generate_plan(app: &App, prompt: &str) -> Result<()> {
    require_login(app)?;
    println!("Generating plan...");
    let plans = app
        .session
        .authenticated()
        .generate_plan(prompt)
        .await
        .map_err(explain)?;
    print_plans(&plans);
    Ok(())
}

fn print_plans(plans: &[fitplan_core::models::FitnessPlan]) {
    if plans.is_empty() {
        println!("No plans yet.");
        return;
    }
    for plan in plans {
        println!("[{}] {}", plan.kind, plan.title);
        if !plan.description.is_empty() {
            println!("  {}", plan.description);
        }
        println!();
    }
}

// ============================================================================
// Theme detection
// ============================================================================

/// System theme preference from the terminal, light if unknown
fn system_theme() -> ThemeMode {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| theme_from_colorfgbg(&value))
        .unwrap_or(ThemeMode::Light)
}

/// Parse `COLORFGBG` ("fg;bg" or "fg;other;bg"). Background 0-6 and 8 are dark.
fn theme_from_colorfgbg(value: &str) -> Option<ThemeMode> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match bg {
        0..=6 | 8 => Some(ThemeMode::Dark),
        _ => Some(ThemeMode::Light),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_colorfgbg() {
        assert_eq!(theme_from_colorfgbg("15;0"), Some(ThemeMode::Dark));
        assert_eq!(theme_from_colorfgbg("0;15"), Some(ThemeMode::Light));
        assert_eq!(theme_from_colorfgbg("15;default;8"), Some(ThemeMode::Dark));
        assert_eq!(theme_from_colorfgbg("garbage"), None);
        assert_eq!(theme_from_colorfgbg(""), None);
    }

    #[test]
    fn test_explain_forced_logout() {
        let msg = explain(AuthError::SessionExpired).to_string();
        assert!(msg.contains("fitplan login"));

        let msg = explain(AuthError::ServerRejected("Bad upload".into())).to_string();
        assert_eq!(msg, "Bad upload");
    }
}
