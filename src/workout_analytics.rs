//! Deterministic progress analytics over logged workout sessions
//!
//! Volume is the only load measure: sum of weight x reps over completed sets.
//! Everything here is pure; callers load sessions from the store first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseLog, WorkoutSession};

/// ---------------------------------------------------------------------------
/// Volume
/// ---------------------------------------------------------------------------

/// Sum of weight x reps over completed sets
pub fn exercise_volume(log: &ExerciseLog) -> f64 {
  log
    .sets
    .iter()
    .filter(|s| s.completed)
    .map(|s| s.weight * s.reps as f64)
    .sum()
}

/// Total volume across every exercise in a session
pub fn session_volume(session: &WorkoutSession) -> f64 {
  session.exercises.iter().map(exercise_volume).sum()
}

/// Most recent session containing the exercise, or None when there is no history
pub fn latest_session_with<'a>(
  sessions: &'a [WorkoutSession],
  exercise_id: &str,
) -> Option<&'a WorkoutSession> {
  sessions
    .iter()
    .filter(|s| s.log_for(exercise_id).is_some())
    .max_by_key(|s| s.date)
}

/// ---------------------------------------------------------------------------
/// Progress
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Progress {
  /// Previous volume was zero; a percentage would be meaningless
  NoBaseline,
  Change { improvement_pct: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
  Up,
  Down,
  Neutral,
}

impl Trend {
  pub fn label(&self) -> &'static str {
    match self {
      Trend::Up => "up",
      Trend::Down => "down",
      Trend::Neutral => "same as last time",
    }
  }
}

impl std::fmt::Display for Trend {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Period-over-period change in volume
pub fn improvement_pct(previous: f64, current: f64) -> Progress {
  if previous > 0.0 {
    Progress::Change {
      improvement_pct: (current - previous) / previous * 100.0,
    }
  } else {
    Progress::NoBaseline
  }
}

impl Progress {
  pub fn trend(&self) -> Trend {
    match self {
      Progress::Change { improvement_pct } if *improvement_pct > 0.0 => Trend::Up,
      Progress::Change { improvement_pct } if *improvement_pct < 0.0 => Trend::Down,
      _ => Trend::Neutral,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Time Series
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePoint {
  pub session_id: String,
  pub date: DateTime<Utc>,
  pub volume: f64,
}

/// Per-exercise volume over time, oldest first.
///
/// Volumes are computed as the series is iterated; call `iter()` again to
/// start over. Surrounding whitespace in the exercise id is ignored.
#[derive(Debug, Clone)]
pub struct VolumeSeries<'a> {
  exercise_id: String,
  sessions: Vec<&'a WorkoutSession>,
}

impl<'a> VolumeSeries<'a> {
  pub fn new(sessions: &'a [WorkoutSession], exercise_id: &str) -> Self {
    let mut sessions: Vec<&WorkoutSession> = sessions.iter().collect();
    sessions.sort_by_key(|s| s.date);
    Self {
      exercise_id: exercise_id.trim().to_string(),
      sessions,
    }
  }

  pub fn exercise_id(&self) -> &str {
    &self.exercise_id
  }

  pub fn iter(&self) -> impl Iterator<Item = VolumePoint> + '_ {
    self.sessions.iter().filter_map(move |session| {
      session.log_for(&self.exercise_id).map(|log| VolumePoint {
        session_id: session.id.clone(),
        date: session.date,
        volume: exercise_volume(log),
      })
    })
  }
}

/// ---------------------------------------------------------------------------
/// Live Session Comparison
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseComparison {
  pub exercise_id: String,
  pub exercise_name: String,
  pub current_volume: f64,
  pub previous_volume: Option<f64>,
  pub previous_date: Option<DateTime<Utc>>,
  pub progress: Progress,
  pub trend: Trend,
}

/// Compare each exercise in a live session against its most recent earlier
/// session. The live session itself and anything dated after it are ignored.
pub fn compare_session(live: &WorkoutSession, history: &[WorkoutSession]) -> Vec<ExerciseComparison> {
  let prior: Vec<WorkoutSession> = history
    .iter()
    .filter(|s| s.id != live.id && s.date <= live.date)
    .cloned()
    .collect();

  live
    .exercises
    .iter()
    .map(|log| {
      let current_volume = exercise_volume(log);
      let previous = latest_session_with(&prior, &log.exercise_id);
      let previous_volume = previous
        .and_then(|s| s.log_for(&log.exercise_id))
        .map(exercise_volume);
      let progress = improvement_pct(previous_volume.unwrap_or(0.0), current_volume);

      ExerciseComparison {
        exercise_id: log.exercise_id.clone(),
        exercise_name: log.exercise_name.clone(),
        current_volume,
        previous_volume,
        previous_date: previous.map(|s| s.date),
        progress,
        trend: progress.trend(),
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::test_utils::{mock_exercise_log, mock_session};

  #[test]
  fn test_volume_excludes_incomplete_sets() {
    let log = mock_exercise_log("squat", &[(100.0, 5, true), (100.0, 5, false)]);
    assert_approx_eq!(exercise_volume(&log), 500.0, 1e-9);
  }

  #[test]
  fn test_session_volume_sums_exercises() {
    let session = mock_session(
      "s1",
      0,
      vec![
        mock_exercise_log("squat", &[(100.0, 5, true)]),
        mock_exercise_log("bench-press", &[(60.0, 10, true), (60.0, 8, true)]),
      ],
    );
    assert_approx_eq!(session_volume(&session), 500.0 + 600.0 + 480.0, 1e-9);
  }

  #[test]
  fn test_improvement_pct() {
    assert_eq!(improvement_pct(1000.0, 1200.0), Progress::Change { improvement_pct: 20.0 });
    assert_eq!(improvement_pct(0.0, 1200.0), Progress::NoBaseline);
    assert_eq!(improvement_pct(1000.0, 1000.0).trend(), Trend::Neutral);
    assert_eq!(improvement_pct(1000.0, 900.0).trend(), Trend::Down);
    assert_eq!(Trend::Neutral.label(), "same as last time");
  }

  #[test]
  fn test_latest_session_with_picks_most_recent() {
    let sessions = vec![
      mock_session("old", 14, vec![mock_exercise_log("squat", &[(80.0, 5, true)])]),
      mock_session("recent", 2, vec![mock_exercise_log("squat", &[(90.0, 5, true)])]),
      mock_session("newest", 1, vec![mock_exercise_log("deadlift", &[(120.0, 5, true)])]),
    ];

    let latest = latest_session_with(&sessions, "squat").unwrap();
    assert_eq!(latest.id, "recent");
    assert!(latest_session_with(&sessions, "row").is_none());
    assert!(latest_session_with(&[], "squat").is_none());
  }

  #[test]
  fn test_volume_series_is_ordered_and_skips_missing() {
    let sessions = vec![
      mock_session("c", 1, vec![mock_exercise_log("squat", &[(100.0, 5, true)])]),
      mock_session("a", 10, vec![mock_exercise_log("squat", &[(80.0, 5, true)])]),
      mock_session("b", 5, vec![mock_exercise_log("bench-press", &[(60.0, 5, true)])]),
    ];

    let series = VolumeSeries::new(&sessions, "squat");
    let points: Vec<VolumePoint> = series.iter().collect();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].session_id, "a");
    assert_eq!(points[1].session_id, "c");
    assert!(points[0].date < points[1].date);
    assert_approx_eq!(points[1].volume, 500.0, 1e-9);
  }

  #[test]
  fn test_volume_series_restarts() {
    let sessions = vec![
      mock_session("a", 3, vec![mock_exercise_log("squat", &[(80.0, 5, true)])]),
      mock_session("b", 1, vec![mock_exercise_log("squat", &[(85.0, 5, true)])]),
    ];
    let series = VolumeSeries::new(&sessions, "squat");

    let first_pass: Vec<VolumePoint> = series.iter().take(1).collect();
    let second_pass: Vec<VolumePoint> = series.iter().collect();

    assert_eq!(first_pass.len(), 1);
    assert_eq!(second_pass.len(), 2);
    assert_eq!(first_pass[0], second_pass[0]);
  }

  #[test]
  fn test_compare_session_against_history() {
    let history = vec![
      mock_session("old", 7, vec![mock_exercise_log("squat", &[(100.0, 10, true)])]),
      mock_session("later", -1, vec![mock_exercise_log("squat", &[(200.0, 10, true)])]),
    ];
    let live = mock_session(
      "live",
      0,
      vec![
        mock_exercise_log("squat", &[(120.0, 10, true)]),
        mock_exercise_log("lunge", &[(20.0, 10, true)]),
      ],
    );

    let comparison = compare_session(&live, &history);

    assert_eq!(comparison.len(), 2);
    let squat = &comparison[0];
    assert_eq!(squat.previous_volume, Some(1000.0));
    assert_eq!(squat.progress, Progress::Change { improvement_pct: 20.0 });
    assert_eq!(squat.trend, Trend::Up);

    let lunge = &comparison[1];
    assert_eq!(lunge.previous_volume, None);
    assert_eq!(lunge.previous_date, None);
    assert_eq!(lunge.progress, Progress::NoBaseline);
    assert_eq!(lunge.trend, Trend::Neutral);
  }

  #[test]
  fn test_compare_session_ignores_itself() {
    let live = mock_session("s1", 0, vec![mock_exercise_log("squat", &[(100.0, 5, true)])]);
    let history = vec![live.clone()];

    let comparison = compare_session(&live, &history);
    assert_eq!(comparison[0].progress, Progress::NoBaseline);
  }
}
