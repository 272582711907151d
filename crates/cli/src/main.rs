use anyhow::Context;
use clap::{Parser, Subcommand};

/// Car Zone listings service
#[derive(Parser, Debug)]
#[command(name = "carzone")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Connect to the configured store and ping it
    Ping,
    /// Create every index the modules declare, then exit
    EnsureIndexes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = carzone_kernel::settings::Settings::load()
        .with_context(|| "failed to load carzone settings")?;
    carzone_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => carzone_app::bootstrap::serve(settings).await,
        Command::Ping => {
            carzone_app::bootstrap::ping(&settings).await?;
            tracing::info!(db = %settings.database.name, "store answered ping");
            Ok(())
        }
        Command::EnsureIndexes => {
            let count = carzone_app::bootstrap::ensure_indexes(&settings).await?;
            tracing::info!(count, "indexes ensured");
            Ok(())
        }
    }
}
