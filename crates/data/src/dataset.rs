//! Historical game-log dataset loaded once at startup.
//!
//! Expected CSV columns: `player_id, player_name, season, game_date, pts, min,
//! fg_pct, home, opponent_id, opp_def_rating, injury_flag`. Extra columns are
//! ignored. Rows without a usable player id, date, or points value are
//! skipped and counted.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use hoops_core::{GameRecord, PlayerId};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::timeline::PlayerTimeline;

/// Player identity as listed by the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub player_name: Option<String>,
}

/// Raw CSV row before validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawGameRow {
    player_id: Option<String>,
    #[serde(default)]
    player_name: Option<String>,
    game_date: Option<String>,
    pts: Option<String>,
    #[serde(default)]
    min: Option<String>,
    #[serde(default)]
    fg_pct: Option<String>,
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    opp_def_rating: Option<String>,
    #[serde(default)]
    injury_flag: Option<String>,
}

/// Immutable store of every player's timeline.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    timelines: HashMap<PlayerId, PlayerTimeline>,
    players: Vec<PlayerSummary>,
    league_opp_def_mean: Option<f64>,
    total_records: usize,
}

impl Dataset {
    /// An empty dataset; every prediction against it is `DatasetUnavailable`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the dataset from a CSV file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the CSV is malformed.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Loads the dataset from any CSV source.
    ///
    /// # Errors
    /// Returns an error if the CSV header or a row is structurally malformed.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in csv_reader.deserialize::<RawGameRow>() {
            let raw = result?;
            match parse_row(raw) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped dataset rows without player id, date, or points");
        }

        Ok(Self::from_named_records(rows))
    }

    /// Loads the dataset, degrading to an empty one on failure.
    ///
    /// Prediction endpoints then answer `DatasetUnavailable` instead of the
    /// process refusing to start.
    #[must_use]
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_csv_path(path) {
            Ok(dataset) => {
                tracing::info!(
                    path = %path.display(),
                    players = dataset.player_count(),
                    records = dataset.total_records(),
                    "Loaded historical dataset"
                );
                dataset
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to load dataset: {}", e);
                Self::empty()
            }
        }
    }

    /// Builds a dataset from validated records without player names.
    #[must_use]
    pub fn from_records(records: Vec<GameRecord>) -> Self {
        Self::from_named_records(records.into_iter().map(|r| (r, None)).collect())
    }

    fn from_named_records(mut rows: Vec<(GameRecord, Option<String>)>) -> Self {
        // players are listed in order of first appearance by date
        rows.sort_by_key(|(record, _)| record.game_date);

        let mut grouped: HashMap<PlayerId, Vec<GameRecord>> = HashMap::new();
        let mut players: Vec<PlayerSummary> = Vec::new();
        let mut seen: HashSet<(PlayerId, Option<String>)> = HashSet::new();
        let mut def_sum = 0.0;
        let mut def_count = 0usize;
        let total_records = rows.len();

        for (record, name) in rows {
            if seen.insert((record.player_id, name.clone())) {
                players.push(PlayerSummary {
                    player_id: record.player_id,
                    player_name: name,
                });
            }
            if let Some(rating) = record.opp_def_rating {
                def_sum += rating;
                def_count += 1;
            }
            grouped.entry(record.player_id).or_default().push(record);
        }

        let timelines = grouped
            .into_iter()
            .map(|(player_id, records)| (player_id, PlayerTimeline::new(player_id, records)))
            .collect();

        let league_opp_def_mean = if def_count == 0 {
            None
        } else {
            Some(def_sum / def_count as f64)
        };

        Self {
            timelines,
            players,
            league_opp_def_mean,
            total_records,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    #[must_use]
    pub fn timeline(&self, player_id: PlayerId) -> Option<&PlayerTimeline> {
        self.timelines.get(&player_id)
    }

    /// Distinct `(player_id, player_name)` pairs in order of first appearance by date.
    #[must_use]
    pub fn players(&self) -> &[PlayerSummary] {
        &self.players
    }

    /// Mean opponent defensive rating over every record with a defined rating.
    #[must_use]
    pub const fn league_opp_def_mean(&self) -> Option<f64> {
        self.league_opp_def_mean
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.timelines.len()
    }

    #[must_use]
    pub const fn total_records(&self) -> usize {
        self.total_records
    }
}

fn parse_row(raw: RawGameRow) -> Option<(GameRecord, Option<String>)> {
    let player_id = parse_number(raw.player_id.as_deref())?;
    if player_id.fract() != 0.0 {
        return None;
    }
    let game_date = parse_game_date(raw.game_date.as_deref()?)?;
    let pts = parse_number(raw.pts.as_deref())?;
    if pts < 0.0 {
        return None;
    }

    let record = GameRecord {
        player_id: player_id as PlayerId,
        game_date,
        pts: pts.round() as u32,
        min: parse_number(raw.min.as_deref()),
        fg_pct: parse_number(raw.fg_pct.as_deref()),
        home: parse_flag(raw.home.as_deref()),
        opp_def_rating: parse_number(raw.opp_def_rating.as_deref()),
        injury_flag: parse_flag(raw.injury_flag.as_deref()),
    };
    let name = raw.player_name.filter(|n| !n.is_empty());
    Some((record, name))
}

/// Parses a finite number; blanks, `NaN`, and garbage are absent.
fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) => parse_number(Some(v)).is_some_and(|n| n != 0.0),
        None => false,
    }
}

/// Accepts ISO dates, ISO date-times, and the stats feed's `OCT 24, 2023` form.
fn parse_game_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%b %d, %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
player_id,player_name,season,game_date,pts,min,fg_pct,home,opponent_id,opp_def_rating,injury_flag
2544,LeBron James,2023-24,2024-01-03,30,36.5,0.55,1,1610612738,110.0,0
203507,Giannis Antetokounmpo,2023-24,2024-01-02,35,34.0,0.6,0,1610612747,114.0,0
2544,LeBron James,2023-24,2024-01-01,25,35.0,,0,1610612744,,1
2544,LeBron James,2023-24,not-a-date,25,35.0,0.5,0,1,110.0,0
,Nobody,2023-24,2024-01-01,25,35.0,0.5,0,1,110.0,0
";

    #[test]
    fn test_from_reader_groups_and_sorts() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.total_records(), 3);
        assert_eq!(dataset.player_count(), 2);

        let lebron = dataset.timeline(2544).unwrap();
        let pts: Vec<u32> = lebron.records().iter().map(|r| r.pts).collect();
        assert_eq!(pts, vec![25, 30]);
        assert!(lebron.records()[0].injury_flag);
        assert_eq!(lebron.records()[0].fg_pct, None);
        assert_eq!(lebron.records()[0].opp_def_rating, None);
        assert!(lebron.records()[1].home);
    }

    #[test]
    fn test_players_in_order_of_first_appearance() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let ids: Vec<PlayerId> = dataset.players().iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![2544, 203507]);
        assert_eq!(dataset.players()[0].player_name.as_deref(), Some("LeBron James"));
    }

    #[test]
    fn test_league_mean_ignores_missing_ratings() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let mean = dataset.league_opp_def_mean().unwrap();
        assert!((mean - 112.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dataset = Dataset::load_or_empty("/nonexistent/games.csv");
        assert!(dataset.is_empty());
        assert!(dataset.players().is_empty());
        assert!(dataset.league_opp_def_mean().is_none());
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let dataset = Dataset::from_csv_path(file.path()).unwrap();
        assert_eq!(dataset.total_records(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Dataset::from_csv_path("/nonexistent/games.csv").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_parse_game_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 10, 24).unwrap();
        assert_eq!(parse_game_date("2023-10-24"), Some(expected));
        assert_eq!(parse_game_date("2023-10-24T00:00:00"), Some(expected));
        assert_eq!(parse_game_date("2023-10-24 00:00:00"), Some(expected));
        assert_eq!(parse_game_date("OCT 24, 2023"), Some(expected));
        assert_eq!(parse_game_date("yesterday"), None);
    }

    #[test]
    fn test_parse_flag_variants() {
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some("1.0")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_blank_minutes_stay_absent() {
        let csv = "\
player_id,player_name,season,game_date,pts,min,fg_pct,home,opponent_id,opp_def_rating,injury_flag
7,Bench Guy,2023-24,2024-01-01,4,,0.5,1,1,110.0,0
7,Bench Guy,2023-24,2024-01-02,6,12.0,0.5,1,1,110.0,0
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let records = dataset.timeline(7).unwrap().records();
        assert_eq!(records[0].min, None);
        assert_eq!(records[1].min, Some(12.0));
    }

    #[test]
    fn test_nan_is_absent() {
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(Some("nan")), None);
        assert_eq!(parse_number(Some(" 12.5 ")), Some(12.5));
    }
}
