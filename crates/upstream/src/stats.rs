//! HTTP client for the NBA stats and live scoreboard endpoints.
//!
//! Stats endpoints answer with `resultSets`, each a `headers` list plus a
//! `rowSet` of positional rows. Rows are zipped with their headers before
//! fields are read by name.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use hoops_core::{PlayerId, UpstreamConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, UpstreamError};

/// One team's line in the standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub gb: Value,
    pub streak: Value,
    pub rank: u32,
}

/// Standings split by conference, each sorted by conference rank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub east: Vec<StandingsEntry>,
    pub west: Vec<StandingsEntry>,
}

/// Scoreboard entry for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveGame {
    pub game_id: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub status: Option<String>,
    pub start_time_utc: Option<String>,
}

/// Latest-season aggregate row of a player's career stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub player_id: PlayerId,
    pub season: Value,
    pub team_id: Value,
    pub team_abbreviation: Value,
    pub games_played: Value,
    pub minutes: Value,
    pub points: Value,
    pub rebounds: Value,
    pub assists: Value,
    pub steals: Value,
    pub blocks: Value,
    pub fg_pct: Value,
    pub fg3_pct: Value,
    pub ft_pct: Value,
    pub resp_time_sec: f64,
}

#[derive(Debug, Deserialize)]
struct ResultSetsResponse {
    #[serde(rename = "resultSets", alias = "resultSet", default)]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(rename = "rowSet", default)]
    row_set: Vec<Vec<Value>>,
}

impl ResultSet {
    fn rows(&self) -> impl Iterator<Item = HashMap<&str, &Value>> + '_ {
        self.row_set.iter().map(move |row| {
            self.headers
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScoreboardResponse {
    #[serde(default)]
    scoreboard: ScoreboardBody,
}

#[derive(Debug, Default, Deserialize)]
struct ScoreboardBody {
    #[serde(default)]
    games: Vec<RawGame>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    game_id: Option<String>,
    #[serde(default)]
    home_team: RawTeam,
    #[serde(default)]
    away_team: RawTeam,
    game_status_text: Option<String>,
    #[serde(rename = "gameTimeUTC")]
    game_time_utc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeam {
    team_name: Option<String>,
    score: Option<i64>,
}

impl From<RawGame> for LiveGame {
    fn from(g: RawGame) -> Self {
        Self {
            game_id: g.game_id,
            home_team: g.home_team.team_name,
            away_team: g.away_team.team_name,
            home_score: g.home_team.score,
            away_score: g.away_team.score,
            status: g.game_status_text,
            start_time_utc: g.game_time_utc,
        }
    }
}

/// Client for stats.nba.com-style endpoints.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: Client,
    stats_base_url: String,
    live_base_url: String,
    season: String,
}

impl StatsClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(nba_headers())
            .build()?;
        Ok(Self {
            http,
            stats_base_url: trim_base(&config.stats_base_url),
            live_base_url: trim_base(&config.live_base_url),
            season: config.season.clone(),
        })
    }

    /// Overrides both base URLs (for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = trim_base(&url.into());
        self.stats_base_url = url.clone();
        self.live_base_url = url;
        self
    }

    #[must_use]
    pub fn stats_base_url(&self) -> &str {
        &self.stats_base_url
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{base}{path}");
        debug!(url = %url, ?query, "Upstream request");

        let response = self.http.get(&url).query(query).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Upstream request failed");
            UpstreamError::from(e)
        })?;
        handle_response(response).await
    }

    /// Regular-season conference standings.
    ///
    /// # Errors
    /// Returns an error if the request fails or the payload has no result set.
    pub async fn fetch_standings(&self) -> Result<Standings> {
        let response: ResultSetsResponse = self
            .get(
                &self.stats_base_url,
                "/leaguestandingsv3",
                &[
                    ("LeagueID", "00"),
                    ("Season", self.season.as_str()),
                    ("SeasonType", "Regular Season"),
                ],
            )
            .await?;
        let set = response
            .result_sets
            .first()
            .ok_or_else(|| UpstreamError::parse("standings response has no result set"))?;
        Ok(parse_standings(set))
    }

    /// Games scheduled on `date`.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not a scoreboard.
    pub async fn fetch_scoreboard(&self, date: NaiveDate) -> Result<Vec<LiveGame>> {
        let day = date.format("%Y-%m-%d").to_string();
        let response: ScoreboardResponse = self
            .get(
                &self.live_base_url,
                "/scoreboardv3",
                &[("GameDate", day.as_str()), ("LeagueID", "00")],
            )
            .await?;
        Ok(response
            .scoreboard
            .games
            .into_iter()
            .map(LiveGame::from)
            .collect())
    }

    /// Latest-season totals from the player's career stats.
    ///
    /// # Errors
    /// Returns an error if the request fails or the player has no season rows.
    pub async fn fetch_season_stats(&self, player_id: PlayerId) -> Result<SeasonStats> {
        let id = player_id.to_string();
        let started = Instant::now();
        let response: ResultSetsResponse = self
            .get(
                &self.stats_base_url,
                "/playercareerstats",
                &[("PlayerID", id.as_str()), ("PerMode", "Totals"), ("LeagueID", "00")],
            )
            .await?;
        let elapsed = started.elapsed().as_secs_f64();

        let set = response
            .result_sets
            .first()
            .ok_or_else(|| UpstreamError::parse("empty response"))?;
        let latest = set
            .rows()
            .max_by(|a, b| season_key(a).cmp(&season_key(b)))
            .ok_or_else(|| UpstreamError::parse("no season data"))?;

        let field = |name: &str| latest.get(name).copied().cloned().unwrap_or(Value::Null);
        Ok(SeasonStats {
            player_id,
            season: field("SEASON_ID"),
            team_id: field("TEAM_ID"),
            team_abbreviation: field("TEAM_ABBREVIATION"),
            games_played: field("GP"),
            minutes: field("MIN"),
            points: field("PTS"),
            rebounds: field("REB"),
            assists: field("AST"),
            steals: field("STL"),
            blocks: field("BLK"),
            fg_pct: field("FG_PCT"),
            fg3_pct: field("FG3_PCT"),
            ft_pct: field("FT_PCT"),
            resp_time_sec: (elapsed * 1000.0).round() / 1000.0,
        })
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.as_u16() == 429 {
        let retry_after_secs = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        return Err(UpstreamError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(UpstreamError::http(status.as_u16(), text));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn parse_standings(set: &ResultSet) -> Standings {
    let mut standings = Standings::default();
    for row in set.rows() {
        let entry = StandingsEntry {
            team: row
                .get("TeamName")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            wins: as_count(row.get("WINS")).unwrap_or(0),
            losses: as_count(row.get("LOSSES")).unwrap_or(0),
            gb: field_or_dash(row.get("ConferenceGamesBack")),
            streak: field_or_dash(row.get("strCurrentStreak")),
            rank: as_count(row.get("ConferenceRank")).unwrap_or(99),
        };
        let conference = row
            .get("Conference")
            .and_then(|v| v.as_str())
            .map(str::to_ascii_lowercase);
        match conference.as_deref() {
            Some("east") => standings.east.push(entry),
            Some("west") => standings.west.push(entry),
            _ => {}
        }
    }
    standings.east.sort_by_key(|e| e.rank);
    standings.west.sort_by_key(|e| e.rank);
    standings
}

fn as_count(value: Option<&&Value>) -> Option<u32> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .and_then(|n| u32::try_from(n).ok())
}

fn field_or_dash(value: Option<&&Value>) -> Value {
    match value {
        Some(v) if !v.is_null() => (*v).clone(),
        _ => Value::String("-".to_string()),
    }
}

fn season_key(row: &HashMap<&str, &Value>) -> String {
    row.get("SEASON_ID")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Browser-like headers; stats.nba.com drops requests without them.
fn nba_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
    headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
    headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));
    headers
}
