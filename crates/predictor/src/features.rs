//! Engineered feature vector derived from a player's most recent games.

use hoops_core::{GameRecord, PlayerId, PredictionError, RollingFeatures};
use hoops_data::PlayerTimeline;
use hoops_model::ENGINEERED_FEATURE_COUNT;

/// Number of trailing games every per-prediction statistic is computed over.
pub const FEATURE_WINDOW: usize = 5;

/// The seven model features, in the column order the scaler was fitted on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredFeatureVector {
    pub avg_pts_5: f64,
    pub avg_min_5: f64,
    pub pts_trend: f64,
    pub home_next: f64,
    pub opp_def: f64,
    pub pts_rolling_5: f64,
    pub pts_rolling_10: f64,
}

impl EngineeredFeatureVector {
    /// Values in `ENGINEERED_FEATURE_NAMES` order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; ENGINEERED_FEATURE_COUNT] {
        [
            self.avg_pts_5,
            self.avg_min_5,
            self.pts_trend,
            self.home_next,
            self.opp_def,
            self.pts_rolling_5,
            self.pts_rolling_10,
        ]
    }
}

/// The last `min(FEATURE_WINDOW, len)` games of a timeline plus the rolling
/// features attached to the newest of them.
#[derive(Debug, Clone, Copy)]
pub struct FeatureWindow<'a> {
    pub games: &'a [GameRecord],
    pub latest_rolling: RollingFeatures,
}

impl<'a> FeatureWindow<'a> {
    /// Slices the window off a timeline.
    ///
    /// # Errors
    /// Returns `NoGameData` if the timeline is empty.
    pub fn from_timeline(timeline: &'a PlayerTimeline) -> Result<Self, PredictionError> {
        let games = timeline.last_n(FEATURE_WINDOW);
        if games.is_empty() {
            return Err(PredictionError::no_game_data(timeline.player_id()));
        }
        Ok(Self {
            games,
            latest_rolling: timeline.latest_rolling().copied().unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = f64> + Clone + 'a {
        let games = self.games;
        games.iter().map(|g| f64::from(g.pts))
    }

    pub fn minutes(&self) -> impl Iterator<Item = f64> + Clone + 'a {
        let games = self.games;
        games.iter().filter_map(|g| g.min)
    }

    #[must_use]
    pub fn avg_pts(&self) -> f64 {
        mean(self.points()).unwrap_or(0.0)
    }

    #[must_use]
    pub fn avg_min(&self) -> f64 {
        mean(self.minutes()).unwrap_or(0.0)
    }

    /// `(last pts - first pts) / games in window`; positive means improving.
    #[must_use]
    pub fn pts_trend(&self) -> f64 {
        match (self.games.first(), self.games.last()) {
            (Some(first), Some(last)) => {
                (f64::from(last.pts) - f64::from(first.pts)) / self.games.len() as f64
            }
            _ => 0.0,
        }
    }

    fn last(&self) -> Option<&'a GameRecord> {
        self.games.last()
    }
}

/// Derives the engineered features for a player's next game.
///
/// `home_next` is the venue of the most recent game, used as a proxy for the
/// upcoming one. Missing rolling values fall back to `avg_pts_5`.
///
/// # Errors
/// Returns `NoGameData` if the timeline is empty.
pub fn engineer_features(
    timeline: &PlayerTimeline,
) -> Result<EngineeredFeatureVector, PredictionError> {
    let window = FeatureWindow::from_timeline(timeline)?;
    Ok(engineer_from_window(&window, timeline.player_id()))
}

pub(crate) fn engineer_from_window(
    window: &FeatureWindow<'_>,
    player_id: PlayerId,
) -> EngineeredFeatureVector {
    let avg_pts_5 = window.avg_pts();
    let last = window.last();
    tracing::trace!(player_id, games = window.len(), "Engineering features");

    EngineeredFeatureVector {
        avg_pts_5,
        avg_min_5: window.avg_min(),
        pts_trend: window.pts_trend(),
        home_next: last.map_or(0.0, |g| f64::from(u8::from(g.home))),
        opp_def: last.and_then(|g| g.opp_def_rating).unwrap_or(0.0),
        pts_rolling_5: defined_or(window.latest_rolling.pts_rolling_5, avg_pts_5),
        pts_rolling_10: defined_or(window.latest_rolling.pts_rolling_10, avg_pts_5),
    }
}

/// Arithmetic mean ignoring non-finite values.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn defined_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}
