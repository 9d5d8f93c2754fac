mod demos;
mod settings;

use anyhow::bail;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use settings::{Cli, Selection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cli.settings.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(selection) = cli.example else {
        demos::print_menu();
        return Ok(());
    };

    match selection {
        Selection::One(number) => demos::run(number, &cli.settings).await,
        Selection::All => {
            let mut failed = Vec::new();
            for number in 1..=demos::COUNT {
                if let Err(err) = demos::run(number, &cli.settings).await {
                    tracing::error!(example = number, error = %err, "example failed");
                    failed.push(number);
                }
            }
            if !failed.is_empty() {
                bail!("{} example(s) failed: {failed:?}", failed.len());
            }
            Ok(())
        }
    }
}
