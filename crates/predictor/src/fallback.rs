//! Raw per-game sequence used when the scaler cannot transform the
//! engineered features.

use hoops_core::GameRecord;
use hoops_model::SequenceInput;

use crate::features::FEATURE_WINDOW;

/// Per-game columns of the fallback sequence, in model input order.
pub const FALLBACK_COLUMNS: [&str; 6] = [
    "pts",
    "min",
    "fg_pct",
    "home",
    "opp_def_rating",
    "injury_flag",
];

pub type FallbackRow = [f64; FALLBACK_COLUMNS.len()];

/// Raw feature row of one game. Undefined values map to 0.0.
#[must_use]
pub fn fallback_row(game: &GameRecord) -> FallbackRow {
    [
        f64::from(game.pts),
        finite_or_zero(game.min),
        finite_or_zero(game.fg_pct),
        f64::from(u8::from(game.home)),
        finite_or_zero(game.opp_def_rating),
        f64::from(u8::from(game.injury_flag)),
    ]
}

/// Rows for the last `FEATURE_WINDOW` games, left-padded with copies of the
/// oldest available game. Empty input yields no rows.
#[must_use]
pub fn fallback_rows(games: &[GameRecord]) -> Vec<FallbackRow> {
    let recent = &games[games.len().saturating_sub(FEATURE_WINDOW)..];
    let Some(oldest) = recent.first() else {
        return Vec::new();
    };

    let pad = FEATURE_WINDOW - recent.len();
    std::iter::repeat(fallback_row(oldest))
        .take(pad)
        .chain(recent.iter().map(fallback_row))
        .collect()
}

/// The `1 x 5 x 6` fallback tensor, or `None` when there are no games.
#[must_use]
pub fn build_fallback_sequence(games: &[GameRecord]) -> Option<SequenceInput> {
    let rows = fallback_rows(games);
    (!rows.is_empty()).then(|| SequenceInput::from_rows(&rows))
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::games;

    #[test]
    fn test_three_games_are_left_padded() {
        let records = games(1, &[10, 12, 14]);
        let rows = fallback_rows(&records);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[1], rows[2]);
        assert_eq!(rows[0][0], 10.0);
        assert_eq!(rows[3][0], 12.0);
        assert_eq!(rows[4][0], 14.0);
    }

    #[test]
    fn test_long_history_keeps_last_five() {
        let records = games(1, &[1, 2, 3, 4, 5, 6, 7]);
        let pts: Vec<f64> = fallback_rows(&records).iter().map(|r| r[0]).collect();
        assert_eq!(pts, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_row_columns() {
        let mut records = games(1, &[21]);
        records[0].fg_pct = None;
        records[0].injury_flag = true;
        let row = fallback_row(&records[0]);
        assert_eq!(row, [21.0, 30.0, 0.0, 1.0, 110.0, 1.0]);
    }

    #[test]
    fn test_sequence_shape() {
        let input = build_fallback_sequence(&games(1, &[10, 12, 14])).unwrap();
        assert_eq!(input.shape(), (1, 5, 6));
        assert!(build_fallback_sequence(&[]).is_none());
    }
}
