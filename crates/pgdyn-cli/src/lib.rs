mod cli;
mod config;
pub mod entities;
mod query;
mod schema;
mod status;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    if let cli::Command::Help(topic) = cmd {
        cli::print_help(topic);
        return Ok(());
    }

    // Missing .env is not an error.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            anyhow::bail!("failed to load .env: {e}");
        }
    }
    init_tracing();

    match cmd {
        cli::Command::Help(_) => Ok(()),
        cli::Command::Query(args) => query::run(args).await,
        cli::Command::Schema(cmd) => match cmd {
            cli::SchemaCommand::Print(args) => schema::print(args),
            cli::SchemaCommand::Apply(args) => schema::apply(args).await,
        },
        cli::Command::Status(args) => status::run(args).await,
    }
}

/// Log to stderr so command output on stdout stays machine-readable.
fn init_tracing() {
    // A subscriber installed by an embedding process stays in place.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgdyn=info,pgdyn_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
