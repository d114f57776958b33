//! One-shot prediction commands that run without the web server.

use anyhow::{Context, Result};
use clap::Args;
use hoops_core::{PlayerId, RecentGame};

use super::bootstrap::{load_config, prediction_service};

/// Arguments for commands that target a single player.
#[derive(Args, Debug, Clone)]
pub struct PlayerArgs {
    /// NBA player id (e.g., 2544)
    pub player_id: PlayerId,
}

/// Prints the next-game prediction as pretty JSON.
///
/// # Errors
/// Returns an error if startup fails or the player cannot be predicted.
pub fn run_predict(config_path: &str, args: &PlayerArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let service = prediction_service(&config)?;

    let result = service
        .predict_next_game(args.player_id)
        .with_context(|| format!("Prediction failed for player {}", args.player_id))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Prints the player's last five games, oldest first.
///
/// # Errors
/// Returns an error if startup fails or the player has fewer than five games.
pub fn run_recent_games(config_path: &str, args: &PlayerArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let service = prediction_service(&config)?;

    let games = service
        .recent_games(args.player_id)
        .with_context(|| format!("No recent games for player {}", args.player_id))?;

    println!("{:<12} {:>4} {:>6} {:>6}", "DATE", "PTS", "MIN", "FG%");
    for game in &games {
        println!("{}", format_game(game));
    }
    Ok(())
}

fn format_game(game: &RecentGame) -> String {
    let min = game
        .min
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    let fg = game
        .fg_pct
        .map_or_else(|| "N/A".to_string(), |v| format!("{v:.3}"));
    format!(
        "{:<12} {:>4} {:>6} {:>6}",
        game.date.format("%Y-%m-%d"),
        game.pts,
        min,
        fg
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::bootstrap::tests::write_fixture;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_predict_known_player() {
        let dir = TempDir::new().unwrap();
        let config = write_fixture(dir.path(), true);
        run_predict(&config, &PlayerArgs { player_id: 2544 }).unwrap();
    }

    #[test]
    fn test_predict_unknown_player_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_fixture(dir.path(), true);
        let err = run_predict(&config, &PlayerArgs { player_id: 1 }).unwrap_err();
        assert!(err.to_string().contains("player 1"));
    }

    #[test]
    fn test_recent_games() {
        let dir = TempDir::new().unwrap();
        let config = write_fixture(dir.path(), true);
        run_recent_games(&config, &PlayerArgs { player_id: 2544 }).unwrap();
    }

    #[test]
    fn test_format_game() {
        let game = RecentGame {
            date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            pts: 28,
            min: Some(34.0),
            fg_pct: None,
        };
        let line = format_game(&game);
        assert!(line.starts_with("2024-01-09"));
        assert!(line.contains("34.0"));
        assert!(line.ends_with("N/A"));
    }
}
