use clap::{Parser, Subcommand};

mod commands;

use commands::{PlayerArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "NBA next-game points prediction backend", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = hoops_core::DEFAULT_CONFIG_PATH, global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the prediction web API
    Serve(ServeArgs),
    /// Predict a player's points in their next game and print the result as JSON
    Predict(PlayerArgs),
    /// Print a player's last five games
    RecentGames(PlayerArgs),
    /// List the players in the historical dataset
    Players,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Serve(args) => {
            commands::run_serve(&cli.config, args).await?;
        }
        Commands::Predict(args) => {
            commands::run_predict(&cli.config, &args)?;
        }
        Commands::RecentGames(args) => {
            commands::run_recent_games(&cli.config, &args)?;
        }
        Commands::Players => {
            commands::run_players(&cli.config)?;
        }
    }

    Ok(())
}
