use anyhow::Result;

use super::bootstrap::load_config;
use hoops_data::Dataset;

/// Prints every player in the dataset, one per line.
///
/// Needs only the dataset; model artifacts are not loaded.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded.
pub fn run_players(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let dataset = Dataset::load_or_empty(&config.dataset.path);

    if dataset.is_empty() {
        tracing::warn!(path = %config.dataset.path, "Dataset is empty; no players to list");
        return Ok(());
    }

    for player in dataset.players() {
        println!(
            "{:>10}  {}",
            player.player_id,
            player.player_name.as_deref().unwrap_or("-")
        );
    }
    tracing::info!(players = dataset.player_count(), "Listed players");
    Ok(())
}
