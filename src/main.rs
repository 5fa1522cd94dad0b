use clap::Parser;

use clubhouse_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from `.env` are optional; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    clubhouse_lib::bootstrap::run_app(cli).await
}
