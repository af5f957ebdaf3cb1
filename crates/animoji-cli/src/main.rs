//! Animoji - generate and browse AI animal images from the terminal.
//!
//! Logs in against the Animoji API (password, signup, or a Google ID
//! token), keeps the session token between runs, and drives the gallery:
//! list, generate, like, delete and download images.

mod app;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use animoji_core::config::{Config, APP_NAME};
use animoji_core::views::ViewError;
use app::App;

/// Set to write a daily rolling debug log into the cache directory
const ENV_LOG_FILE: &str = "ANIMOJI_LOG_FILE";

const USAGE: &str = "\
Usage: animoji <command> [args]

Commands:
  login [username]        Log in with username and password
  signup [username]       Create an account and log in
  google <id-token>       Log in with a Google ID token
  logout                  Forget the saved session
  whoami                  Show the logged in user
  check-username <name>   Check whether a username is free
  images                  List the gallery
  generate <animal>       Generate an image of an animal
  like <id>               Like an image
  delete <id>             Delete an image
  download <id> [dir]     Save an image to disk (default: current directory)
  animals                 List the animals that can be generated
  help                    Show this message";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    let log_dir = std::env::var(ENV_LOG_FILE)
        .ok()
        .filter(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .and_then(|_| Config::default().cache_dir().ok());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", APP_NAME));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // View failures were already shown as notices
            if e.downcast_ref::<ViewError>().is_none() {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    let arg = |i: usize, name: &str| -> Result<String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| anyhow!("Missing <{}>\n\n{}", name, USAGE))
    };

    if matches!(command, "help" | "-h" | "--help") {
        println!("{}", USAGE);
        return Ok(());
    }
    if command == "animals" {
        app::print_animals();
        return Ok(());
    }

    let mut app = App::new()?;
    info!(command, "animoji starting");

    match command {
        "login" => app.login(args.get(1).cloned()).await,
        "signup" => app.signup(args.get(1).cloned()).await,
        "google" => app.google(&arg(1, "id-token")?).await,
        "logout" => {
            app.logout();
            Ok(())
        }
        "whoami" => {
            app.print_whoami();
            Ok(())
        }
        "check-username" => app.check_username(&arg(1, "name")?).await,
        "images" => app.list_images().await,
        "generate" => {
            let prompt = args[1..].join(" ");
            if prompt.trim().is_empty() {
                return Err(anyhow!("Missing <animal>\n\n{}", USAGE));
            }
            app.generate(&prompt).await
        }
        "like" => app.like(&arg(1, "id")?).await,
        "delete" => app.delete(&arg(1, "id")?).await,
        "download" => {
            let dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            app.download(&arg(1, "id")?, &dir).await
        }
        other => Err(anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
    }
}
