//! Prediction orchestrator.
//!
//! Runs one request through the stages below. Every failure is terminal
//! except a scaler feature mismatch, which switches inference to the raw
//! fallback sequence.
//!
//! ```text
//! Idle -> ValidatingPlayer -> EngineeringFeatures -> Scaling -> Inferring
//!      -> Blending -> Synthesizing -> Responding
//! ```

use std::fmt;
use std::sync::Arc;

use hoops_core::{
    round_to, InputPath, PlayerId, PredictionError, PredictionResult, PredictionSummary,
    RecentGame,
};
use hoops_data::{team_for_player, Dataset, PlayerSummary, PlayerTimeline};
use hoops_model::{ScalerState, SequenceInput, SequenceModel};
use tracing::{debug, info, warn};

use crate::blend::blend;
use crate::fallback::build_fallback_sequence;
use crate::features::{engineer_from_window, mean, FeatureWindow, FEATURE_WINDOW};
use crate::synthesis::synthesize;

/// Stage a prediction request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStage {
    Idle,
    ValidatingPlayer,
    EngineeringFeatures,
    Scaling,
    Inferring,
    Blending,
    Synthesizing,
    Responding,
}

impl fmt::Display for PredictionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ValidatingPlayer => "validating_player",
            Self::EngineeringFeatures => "engineering_features",
            Self::Scaling => "scaling",
            Self::Inferring => "inferring",
            Self::Blending => "blending",
            Self::Synthesizing => "synthesizing",
            Self::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// Per-request stage tracker; logs each transition.
struct StageTracker {
    player_id: PlayerId,
    stage: PredictionStage,
}

impl StageTracker {
    const fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            stage: PredictionStage::Idle,
        }
    }

    fn enter(&mut self, next: PredictionStage) {
        debug!(player_id = self.player_id, from = %self.stage, to = %next, "Prediction stage");
        self.stage = next;
    }

    fn fail(&self, error: PredictionError) -> PredictionError {
        warn!(player_id = self.player_id, stage = %self.stage, error = %error, "Prediction failed");
        error
    }
}

/// Prediction entry point shared by every request.
///
/// Holds the dataset, model and scaler loaded at startup; all three are
/// read-only, so requests run concurrently without locking.
#[derive(Clone)]
pub struct PredictionService {
    dataset: Arc<Dataset>,
    model: Arc<dyn SequenceModel>,
    scaler: Arc<ScalerState>,
}

impl PredictionService {
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, model: Arc<dyn SequenceModel>, scaler: Arc<ScalerState>) -> Self {
        Self {
            dataset,
            model,
            scaler,
        }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn players(&self) -> &[PlayerSummary] {
        self.dataset.players()
    }

    /// Predicts the player's points in their next game.
    ///
    /// # Errors
    /// Returns `DatasetUnavailable`, `PlayerNotFound`, `NoGameData`, or
    /// `ModelInferenceFailed`. A scaler mismatch is not an error.
    pub fn predict_next_game(&self, player_id: PlayerId) -> Result<PredictionResult, PredictionError> {
        let mut tracker = StageTracker::new(player_id);

        tracker.enter(PredictionStage::ValidatingPlayer);
        let timeline = self.timeline(player_id).map_err(|e| tracker.fail(e))?;

        tracker.enter(PredictionStage::EngineeringFeatures);
        let window = FeatureWindow::from_timeline(timeline).map_err(|e| tracker.fail(e))?;
        let features = engineer_from_window(&window, player_id);
        debug!(player_id, ?features, "Engineered features");

        tracker.enter(PredictionStage::Scaling);
        let (input, input_path) = match self.scaler.transform(&features.to_array()) {
            Ok(scaled) => {
                debug!(player_id, ?scaled, "Scaled features");
                (SequenceInput::single_step(scaled), InputPath::Engineered)
            }
            Err(e) => {
                warn!(
                    player_id,
                    error = %e,
                    "Scaler transform failed; falling back to raw sequence input"
                );
                let sequence = build_fallback_sequence(timeline.records())
                    .ok_or_else(|| tracker.fail(PredictionError::no_game_data(player_id)))?;
                (sequence, InputPath::FallbackSequence)
            }
        };

        tracker.enter(PredictionStage::Inferring);
        let scaled_points = self
            .model
            .predict(&input)
            .map_err(|e| tracker.fail(PredictionError::inference(e)))?;
        let model_points = self.scaler.inverse_scale_points(scaled_points);

        tracker.enter(PredictionStage::Blending);
        let recent_avg = mean(window.points());
        let predicted = blend(model_points, recent_avg);

        tracker.enter(PredictionStage::Synthesizing);
        let synthesis = synthesize(
            &window,
            timeline.records(),
            features.opp_def,
            self.dataset.league_opp_def_mean(),
        );

        tracker.enter(PredictionStage::Responding);
        info!(
            player_id,
            predicted_points = predicted,
            model_prediction = model_points,
            input_path = ?input_path,
            "Prediction complete"
        );

        Ok(PredictionResult {
            player_id,
            predicted_points: round_to(predicted, 2),
            model_prediction: round_to(model_points, 2),
            recent_avg_points: recent_avg.map(|v| round_to(v, 2)),
            recent_games: window.games.iter().map(RecentGame::from).collect(),
            summary: PredictionSummary {
                avg_pts_5: round_to(features.avg_pts_5, 2),
                avg_min_5: round_to(features.avg_min_5, 2),
                pts_trend: round_to(features.pts_trend, 4),
            },
            confidence: synthesis.confidence,
            explanation: synthesis.explanation,
            form_summary: synthesis.form_summary,
            avg_error_last_10: synthesis.avg_error_last_10,
            team: team_for_player(player_id),
            input_path,
        })
    }

    /// The player's last five games, oldest first.
    ///
    /// # Errors
    /// Returns `DatasetUnavailable`, `PlayerNotFound`, or `InsufficientGames`
    /// when fewer than five games exist.
    pub fn recent_games(&self, player_id: PlayerId) -> Result<Vec<RecentGame>, PredictionError> {
        let timeline = self.timeline(player_id)?;
        let games = timeline.last_n(FEATURE_WINDOW);
        if games.len() < FEATURE_WINDOW {
            return Err(PredictionError::insufficient_games(
                player_id,
                games.len(),
                FEATURE_WINDOW,
            ));
        }
        Ok(games.iter().map(RecentGame::from).collect())
    }

    fn timeline(&self, player_id: PlayerId) -> Result<&PlayerTimeline, PredictionError> {
        if self.dataset.is_empty() {
            return Err(PredictionError::DatasetUnavailable);
        }
        self.dataset
            .timeline(player_id)
            .ok_or_else(|| PredictionError::player_not_found(player_id))
    }
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("players", &self.dataset.player_count())
            .field("model", &self.model.name())
            .field("scaler_aligned", &self.scaler.is_aligned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::games;
    use hoops_core::{ConfidenceLabel, MinutesStability, TrendLabel};
    use hoops_model::{ModelError, ENGINEERED_FEATURE_COUNT};
    use std::sync::Mutex;

    /// Returns a fixed scaled output and records every input shape.
    struct RecordingModel {
        output: Result<f64, ModelError>,
        shapes: Mutex<Vec<(usize, usize, usize)>>,
    }

    impl RecordingModel {
        fn returning(output: f64) -> Arc<Self> {
            Arc::new(Self {
                output: Ok(output),
                shapes: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                output: Err(ModelError::NonFiniteOutput(f64::NAN)),
                shapes: Mutex::new(Vec::new()),
            })
        }

        fn shapes(&self) -> Vec<(usize, usize, usize)> {
            self.shapes.lock().unwrap().clone()
        }
    }

    impl SequenceModel for RecordingModel {
        fn predict(&self, input: &SequenceInput) -> Result<f64, ModelError> {
            self.shapes.lock().unwrap().push(input.shape());
            self.output.clone()
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Points fitted on [0, 40]; the remaining columns on [0, 1].
    fn aligned_scaler() -> Arc<ScalerState> {
        let mut max = vec![1.0; ENGINEERED_FEATURE_COUNT];
        max[0] = 40.0;
        Arc::new(ScalerState::new(None, vec![0.0; ENGINEERED_FEATURE_COUNT], max).unwrap())
    }

    fn six_feature_scaler() -> Arc<ScalerState> {
        Arc::new(
            ScalerState::new(None, vec![0.0; 6], vec![40.0, 48.0, 1.0, 1.0, 125.0, 1.0]).unwrap(),
        )
    }

    fn service(pts: &[u32], model: Arc<RecordingModel>, scaler: Arc<ScalerState>) -> PredictionService {
        let dataset = Dataset::from_records(games(1, pts));
        PredictionService::new(Arc::new(dataset), model, scaler)
    }

    #[test]
    fn test_engineered_path_blends_model_and_form() {
        let model = RecordingModel::returning(0.5);
        let svc = service(&[10, 10, 10, 10, 10], model.clone(), aligned_scaler());

        let result = svc.predict_next_game(1).unwrap();
        assert_eq!(model.shapes(), vec![(1, 1, 7)]);
        assert_eq!(result.input_path, InputPath::Engineered);
        assert_eq!(result.model_prediction, 20.0);
        assert_eq!(result.recent_avg_points, Some(10.0));
        assert!((result.predicted_points - 16.0).abs() < 1e-12);
        assert_eq!(result.recent_games.len(), 5);
        assert_eq!(result.confidence.label, ConfidenceLabel::Small);
        assert!(result.predicted_points.is_finite());
    }

    #[test]
    fn test_feature_mismatch_uses_fallback_sequence() {
        let model = RecordingModel::returning(0.5);
        let svc = service(&[10, 12, 14], model.clone(), six_feature_scaler());

        let result = svc.predict_next_game(1).unwrap();
        assert_eq!(model.shapes(), vec![(1, 5, 6)]);
        assert_eq!(result.input_path, InputPath::FallbackSequence);
        assert_eq!(result.model_prediction, 20.0);
        assert_eq!(result.recent_games.len(), 3);
    }

    #[test]
    fn test_improving_player_summary() {
        let svc = service(&[10, 12, 14, 16, 20], RecordingModel::returning(0.5), aligned_scaler());
        let result = svc.predict_next_game(1).unwrap();

        assert_eq!(result.summary.pts_trend, 2.0);
        assert_eq!(result.form_summary.scoring_trend, TrendLabel::Improving);
        assert_eq!(result.avg_error_last_10, None);
        assert!(result.explanation.starts_with("Consistent minutes and modest recent scoring"));
    }

    #[test]
    fn test_blank_minutes_are_not_counted_as_zero() {
        let mut records = games(1, &[20, 20, 20, 20, 20]);
        for g in &mut records {
            g.min = Some(34.0);
        }
        records[2].min = None;
        let svc = PredictionService::new(
            Arc::new(Dataset::from_records(records)),
            RecordingModel::returning(0.5),
            aligned_scaler(),
        );

        let result = svc.predict_next_game(1).unwrap();
        assert_eq!(result.summary.avg_min_5, 34.0);
        assert_eq!(result.form_summary.minutes_stability, MinutesStability::Stable);
        assert_eq!(result.recent_games[2].min, None);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["recent_games"][2]["min"].is_null());
    }

    #[test]
    fn test_avg_error_present_with_history() {
        let svc = service(&[10, 10, 10, 10, 10, 16], RecordingModel::returning(0.5), aligned_scaler());
        let result = svc.predict_next_game(1).unwrap();
        assert_eq!(result.avg_error_last_10, Some(6.0));
    }

    #[test]
    fn test_inference_failure_is_surfaced() {
        let svc = service(&[10, 12, 14, 16, 20], RecordingModel::failing(), aligned_scaler());
        let err = svc.predict_next_game(1).unwrap_err();
        assert!(matches!(err, PredictionError::ModelInferenceFailed(_)));
    }

    #[test]
    fn test_unknown_player_and_empty_dataset() {
        let svc = service(&[10, 12, 14, 16, 20], RecordingModel::returning(0.5), aligned_scaler());
        assert!(matches!(
            svc.predict_next_game(99),
            Err(PredictionError::PlayerNotFound { player_id: 99 })
        ));

        let empty = PredictionService::new(
            Arc::new(Dataset::empty()),
            RecordingModel::returning(0.5),
            aligned_scaler(),
        );
        assert!(matches!(
            empty.predict_next_game(1),
            Err(PredictionError::DatasetUnavailable)
        ));
        assert!(matches!(
            empty.recent_games(1),
            Err(PredictionError::DatasetUnavailable)
        ));
    }

    #[test]
    fn test_recent_games_requires_five() {
        let svc = service(&[10, 12, 14], RecordingModel::returning(0.5), aligned_scaler());
        let err = svc.recent_games(1).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InsufficientGames {
                available: 3,
                required: 5,
                ..
            }
        ));
        assert!(matches!(
            svc.recent_games(2),
            Err(PredictionError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_recent_games_returns_last_five_in_order() {
        let svc = service(&[1, 2, 3, 4, 5, 6, 7], RecordingModel::returning(0.5), aligned_scaler());
        let recent = svc.recent_games(1).unwrap();
        let pts: Vec<u32> = recent.iter().map(|g| g.pts).collect();
        assert_eq!(pts, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_team_metadata_attached() {
        let dataset = Dataset::from_records(games(2544, &[25, 27, 30, 22, 28]));
        let svc = PredictionService::new(
            Arc::new(dataset),
            RecordingModel::returning(0.5),
            aligned_scaler(),
        );
        let result = svc.predict_next_game(2544).unwrap();
        assert_eq!(result.team.abbreviation.as_deref(), Some("LAL"));
        assert!(result.explanation.contains("strong recent scoring"));
    }

    #[test]
    fn test_result_serializes_input_path() {
        let svc = service(&[10, 12, 14], RecordingModel::returning(0.5), six_feature_scaler());
        let json = serde_json::to_value(svc.predict_next_game(1).unwrap()).unwrap();
        assert_eq!(json["input_path"], "fallback_sequence");
        assert_eq!(json["confidence"]["label"], "Medium");
    }
}
