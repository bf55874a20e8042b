//! Session logging and progress commands

use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::WorkoutSession;
use crate::store::{self, StoreError};
use crate::workout_analytics::{
  compare_session, improvement_pct, ExerciseComparison, Progress, Trend, VolumePoint, VolumeSeries,
};

/// Store a finished session
pub async fn log_session(state: &AppState, session: WorkoutSession) -> Result<(), String> {
  store::append_session(state.store.as_ref(), session)
    .await
    .map_err(|e| match e {
      StoreError::Duplicate { .. } | StoreError::Invalid(_) => e.to_string(),
      other => format!("Failed to save session: {}", other),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
  pub exercise_id: String,
  pub points: Vec<VolumePoint>,
  /// Change between the last two points, if there are two
  pub latest_change: Option<Progress>,
  pub trend: Trend,
}

/// Volume history for one exercise, oldest first
pub async fn exercise_progress(state: &AppState, exercise_id: &str) -> Result<ExerciseProgress, String> {
  let sessions = store::load_sessions(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load sessions: {}", e))?;

  let series = VolumeSeries::new(&sessions, exercise_id);
  let points: Vec<VolumePoint> = series.iter().collect();
  let latest_change = match points.as_slice() {
    [.., previous, current] => Some(improvement_pct(previous.volume, current.volume)),
    _ => None,
  };

  Ok(ExerciseProgress {
    exercise_id: series.exercise_id().to_string(),
    trend: latest_change.map(|p| p.trend()).unwrap_or(Trend::Neutral),
    points,
    latest_change,
  })
}

/// Compare a live (possibly unsaved) session against stored history
pub async fn compare_live_session(
  state: &AppState,
  live: &WorkoutSession,
) -> Result<Vec<ExerciseComparison>, String> {
  let history = store::load_sessions(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load sessions: {}", e))?;
  Ok(compare_session(live, &history))
}

/// Compare a stored session against the sessions before it
pub async fn compare_stored_session(state: &AppState, session_id: &str) -> Result<Vec<ExerciseComparison>, String> {
  let history = store::load_sessions(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load sessions: {}", e))?;
  let live = history
    .iter()
    .find(|s| s.id == session_id)
    .ok_or_else(|| format!("Session not found: {}", session_id))?;
  Ok(compare_session(live, &history))
}
