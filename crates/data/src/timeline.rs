//! Per-player chronological game logs with precomputed rolling features.

use hoops_core::{GameRecord, PlayerId, RollingFeatures};

use crate::rolling::RollingMean;

/// Window length of `pts_rolling_5` and `min_rolling_5`.
pub const SHORT_ROLLING_WINDOW: usize = 5;
/// Window length of `pts_rolling_10`.
pub const LONG_ROLLING_WINDOW: usize = 10;

/// Games of one player sorted ascending by `game_date`.
///
/// Ties on `game_date` keep ingestion order. `rolling[i]` is derived from
/// `records[..=i]` only.
#[derive(Debug, Clone)]
pub struct PlayerTimeline {
    player_id: PlayerId,
    records: Vec<GameRecord>,
    rolling: Vec<RollingFeatures>,
}

impl PlayerTimeline {
    /// Builds a timeline, sorting records by date and deriving rolling features once.
    #[must_use]
    pub fn new(player_id: PlayerId, mut records: Vec<GameRecord>) -> Self {
        records.retain(|r| r.player_id == player_id);
        // sort_by_key is stable, which keeps ingestion order for same-day rows
        records.sort_by_key(|r| r.game_date);
        let rolling = compute_rolling(&records);
        Self {
            player_id,
            records,
            rolling,
        }
    }

    #[must_use]
    pub const fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    #[must_use]
    pub fn rolling(&self) -> &[RollingFeatures] {
        &self.rolling
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The last `min(n, len)` records, oldest first.
    #[must_use]
    pub fn last_n(&self, n: usize) -> &[GameRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Rolling features of the most recent record.
    #[must_use]
    pub fn latest_rolling(&self) -> Option<&RollingFeatures> {
        self.rolling.last()
    }
}

fn compute_rolling(records: &[GameRecord]) -> Vec<RollingFeatures> {
    let mut pts_5 = RollingMean::new(SHORT_ROLLING_WINDOW);
    let mut pts_10 = RollingMean::new(LONG_ROLLING_WINDOW);
    let mut min_5 = RollingMean::new(SHORT_ROLLING_WINDOW);

    records
        .iter()
        .map(|record| {
            let pts = f64::from(record.pts);
            RollingFeatures {
                pts_rolling_5: pts_5.push(Some(pts)),
                pts_rolling_10: pts_10.push(Some(pts)),
                min_rolling_5: min_5.push(record.min),
            }
        })
        .collect()
}
