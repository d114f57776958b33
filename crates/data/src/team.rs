//! Static team metadata keyed by player id.

use hoops_core::{PlayerId, TeamInfo};

struct TeamEntry {
    player_id: PlayerId,
    team_name: &'static str,
    city: &'static str,
    conference: &'static str,
    abbreviation: &'static str,
    colors: [&'static str; 2],
    logo_url: &'static str,
}

const TEAMS: &[TeamEntry] = &[
    TeamEntry {
        player_id: 203_507,
        team_name: "Milwaukee Bucks",
        city: "Milwaukee",
        conference: "East",
        abbreviation: "MIL",
        colors: ["#00471B", "#EEE1C6"],
        logo_url: "https://cdn.nba.com/logos/nba/1610612749/primary/L/logo.svg",
    },
    TeamEntry {
        player_id: 2544,
        team_name: "Los Angeles Lakers",
        city: "Los Angeles",
        conference: "West",
        abbreviation: "LAL",
        colors: ["#552583", "#FDB927"],
        logo_url: "https://cdn.nba.com/logos/nba/1610612747/primary/L/logo.svg",
    },
];

/// Team metadata for a player, or all-null fields when unmapped.
#[must_use]
pub fn team_for_player(player_id: PlayerId) -> TeamInfo {
    TEAMS
        .iter()
        .find(|t| t.player_id == player_id)
        .map(|t| TeamInfo {
            team_name: Some(t.team_name.to_string()),
            city: Some(t.city.to_string()),
            conference: Some(t.conference.to_string()),
            abbreviation: Some(t.abbreviation.to_string()),
            colors: Some(t.colors.iter().map(|c| (*c).to_string()).collect()),
            logo_url: Some(t.logo_url.to_string()),
        })
        .unwrap_or_default()
}
