//! inde - command-line access to the inde content platform.
//!
//! Signs in against the REST API, keeps the session in an encrypted cookie
//! jar and caches system codes (regions, positions) for a day.

mod commands;

use std::io;
use std::path::Path;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use inde_core::config::Config;

const USAGE: &str = "\
Usage: inde <command> [args]

Commands:
  login [email] [--remember]   Sign in with email and password
  logout                       Sign out and remove local cookies
  whoami                       Show the signed-in user
  oauth <access> <refresh>     Finish a social login with issued tokens
  social-url <provider> [--signup]
                               Print the social login start URL
  codes <parent_id>            List selectable system codes
  warm                         Load every known code group into the cache
  clear-cache                  Drop cached system codes
  notices [page]               List notices
  faqs [page]                  List FAQ entries
  inquiries [page]             List your inquiries
";

/// Log to stderr, plus a daily file under the cache directory when one is
/// available. The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "inde.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let log_dir = config
        .cache_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());
    let _guard = init_tracing(log_dir.as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprint!("{}", USAGE);
        return Ok(());
    };
    if command == "--help" || command == "-h" {
        print!("{}", USAGE);
        return Ok(());
    }

    info!(command = %command, "inde starting");
    let ctx = commands::Context::new(config, command)?;
    let result = commands::run(&ctx, command, &args[1..]).await;
    ctx.report_redirect();

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
