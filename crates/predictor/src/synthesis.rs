//! Confidence, form labels, and the templated explanation.
//!
//! Everything here is derived from the same window the features use, except
//! the opponent comparison (league-wide mean) and `avg_error_last_10` (full
//! timeline).

use hoops_core::{
    round_to, Confidence, ConfidenceLabel, FormSummary, GameRecord, MinutesStability, TrendLabel,
};

use crate::features::{mean, FeatureWindow, FEATURE_WINDOW};

/// Multiplier from points standard deviation to confidence band.
pub const BAND_MULTIPLIER: f64 = 1.5;
/// Minutes standard deviation below which minutes count as stable.
pub const STABLE_MINUTES_STD: f64 = 5.0;
/// `|pts_trend|` above which scoring counts as moving.
pub const TREND_THRESHOLD: f64 = 1.0;
/// Distance from the league mean opponent rating that counts as non-average.
pub const OPPONENT_MARGIN: f64 = 1.5;
/// `avg_pts_5` at or above which recent scoring is called strong.
pub const STRONG_SCORING_PTS: f64 = 15.0;
/// Games inspected by `avg_error_last_10`.
pub const ERROR_LOOKBACK: usize = 10;

/// Population standard deviation (divisor N) of the finite values; 0.0 when none.
#[must_use]
pub fn population_std(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let Some(mu) = mean(values.clone()) else {
        return 0.0;
    };
    let (sum_sq, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + (v - mu).powi(2), c + 1));
    (sum_sq / count as f64).sqrt()
}

/// Band is `round(pts_std * 1.5, 2)`; label compares it with `max(avg_pts_5, 1)`.
#[must_use]
pub fn confidence(pts_std: f64, avg_pts_5: f64) -> Confidence {
    let band = round_to(pts_std * BAND_MULTIPLIER, 2);
    let ratio = band / avg_pts_5.max(1.0);
    let label = if ratio < 0.15 {
        ConfidenceLabel::Small
    } else if ratio < 0.30 {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Large
    };
    Confidence {
        band,
        std: round_to(pts_std, 2),
        label,
    }
}

#[must_use]
pub fn minutes_stability(min_std: f64) -> MinutesStability {
    if min_std < STABLE_MINUTES_STD {
        MinutesStability::Stable
    } else {
        MinutesStability::Volatile
    }
}

#[must_use]
pub fn trend_label(pts_trend: f64) -> TrendLabel {
    if pts_trend > TREND_THRESHOLD {
        TrendLabel::Improving
    } else if pts_trend < -TREND_THRESHOLD {
        TrendLabel::Declining
    } else {
        TrendLabel::Flat
    }
}

/// How the upcoming opponent's defense compares with the league, or `None`
/// when no league mean exists.
#[must_use]
pub fn opponent_phrase(opp_def: f64, league_mean: Option<f64>) -> Option<&'static str> {
    let league = league_mean.filter(|m| m.is_finite())?;
    Some(if opp_def > league + OPPONENT_MARGIN {
        "a tougher-than-average opponent defense slightly lowered it"
    } else if opp_def < league - OPPONENT_MARGIN {
        "a weaker opponent defense slightly boosted it"
    } else {
        "opponent defense was average and had little effect"
    })
}

/// One-sentence summary of minutes, scoring level, and opponent context.
#[must_use]
pub fn explanation(
    stability: MinutesStability,
    avg_pts_5: f64,
    opponent: Option<&str>,
) -> String {
    let minutes = match stability {
        MinutesStability::Stable => "Consistent minutes",
        MinutesStability::Volatile => "Volatile minutes",
    };
    let scoring = if avg_pts_5 >= STRONG_SCORING_PTS {
        "strong recent scoring"
    } else {
        "modest recent scoring"
    };
    match opponent {
        Some(phrase) => {
            format!("{minutes} and {scoring} influenced the prediction, while {phrase}.")
        }
        None => format!("{minutes} and {scoring} influenced the prediction."),
    }
}

/// Mean absolute error of a naive previous-5-game-mean baseline over up to
/// the last 10 games, rounded to 2 decimals.
///
/// A game only counts when 5 games precede it, so fewer than 6 games in the
/// timeline yields `None`.
#[must_use]
pub fn avg_error_last_10(games: &[GameRecord]) -> Option<f64> {
    let n = games.len();
    let errors: Vec<f64> = (1..=ERROR_LOOKBACK.min(n))
        .map(|k| n - k)
        .filter(|&idx| idx >= FEATURE_WINDOW)
        .filter_map(|idx| {
            let baseline = mean(
                games[idx - FEATURE_WINDOW..idx]
                    .iter()
                    .map(|g| f64::from(g.pts)),
            )?;
            Some((baseline - f64::from(games[idx].pts)).abs())
        })
        .collect();

    mean(errors.into_iter()).map(|e| round_to(e, 2))
}

/// Everything the synthesizer derives for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub confidence: Confidence,
    pub form_summary: FormSummary,
    pub explanation: String,
    pub avg_error_last_10: Option<f64>,
}

/// Derives confidence, form, and explanation for a window.
#[must_use]
pub fn synthesize(
    window: &FeatureWindow<'_>,
    history: &[GameRecord],
    opp_def: f64,
    league_opp_def_mean: Option<f64>,
) -> Synthesis {
    let avg_pts_5 = window.avg_pts();
    let pts_std = population_std(window.points());
    let stability = minutes_stability(population_std(window.minutes()));
    let opponent = opponent_phrase(opp_def, league_opp_def_mean);

    Synthesis {
        confidence: confidence(pts_std, avg_pts_5),
        form_summary: FormSummary {
            avg_pts_5: round_to(avg_pts_5, 2),
            minutes_stability: stability,
            scoring_trend: trend_label(window.pts_trend()),
        },
        explanation: explanation(stability, avg_pts_5, opponent),
        avg_error_last_10: avg_error_last_10(history),
    }
}
