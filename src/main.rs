//! `frotzsup` — supervise an interactive fiction interpreter.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use libfrotz::{Supervisor, SupervisorConfig};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "frotzsup",
    version,
    about = "Supervise a line-oriented interactive fiction interpreter over its stdio pipes."
)]
struct Cli {
    /// Path to the interpreter executable (e.g. dfrotz).
    interpreter: PathBuf,

    /// Story file passed to the interpreter as its sole argument.
    story_file: PathBuf,

    /// Quiet window in milliseconds: a pause this long on the output pipe
    /// ends a reply.
    #[arg(long, value_name = "MS", default_value_t = 300)]
    quiet_ms: u64,
}

#[tokio::main]
async fn main() {
    // Usage errors exit with code 2 via clap before we get here.
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = run(cli).await {
        tracing::error!(%err, "supervision ended");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> libfrotz::Result<()> {
    let config = SupervisorConfig::builder()
        .interpreter(cli.interpreter)
        .story_file(cli.story_file)
        .quiet_window(Duration::from_millis(cli.quiet_ms))
        .build()?;

    Supervisor::new(config).run().await
}

/// Logs go to stderr so they never interleave with the interpreter's
/// reply text on stdout. `RUST_LOG` overrides the default level.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
