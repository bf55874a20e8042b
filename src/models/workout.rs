use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// ---------------------------------------------------------------------------
/// Workout Plans
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
  #[serde(default)]
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
  pub workout_days: Vec<WorkoutDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
  #[serde(default)]
  pub id: String,
  pub name: String,
  pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
  /// Join key for analytics; derived from the name when absent
  #[serde(default)]
  pub id: String,
  pub name: String,
  #[serde(deserialize_with = "lenient::u32_from_any")]
  pub sets: u32,
  /// Rep range as written, e.g. "8-12"
  #[serde(deserialize_with = "lenient::string_from_any")]
  pub reps: String,
  #[serde(default, deserialize_with = "lenient::string_from_any")]
  pub rest_time: String,
  #[serde(default)]
  pub muscle_groups: Vec<String>,
}

/// Stable exercise id from a display name: "Barbell Back Squat" -> "barbell-back-squat"
pub fn exercise_id_from_name(name: &str) -> String {
  let mut id = String::with_capacity(name.len());
  let mut pending_dash = false;
  for c in name.trim().chars() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !id.is_empty() {
        id.push('-');
      }
      id.push(c.to_ascii_lowercase());
      pending_dash = false;
    } else {
      pending_dash = true;
    }
  }
  id
}

impl WorkoutPlan {
  /// Fill in missing day and exercise ids so every exercise has a join key
  pub fn assign_missing_ids(&mut self) {
    for (idx, day) in self.workout_days.iter_mut().enumerate() {
      if day.id.trim().is_empty() {
        day.id = format!("day-{}", idx + 1);
      }
      for exercise in &mut day.exercises {
        if exercise.id.trim().is_empty() {
          exercise.id = exercise_id_from_name(&exercise.name);
        }
      }
    }
  }

  pub fn find_exercise(&self, exercise_id: &str) -> Option<&Exercise> {
    self
      .workout_days
      .iter()
      .flat_map(|d| d.exercises.iter())
      .find(|e| e.id == exercise_id)
  }
}

/// ---------------------------------------------------------------------------
/// Logged Sessions
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
  pub id: String,
  pub workout_plan_id: String,
  pub workout_day_id: String,
  pub date: DateTime<Utc>,
  pub exercises: Vec<ExerciseLog>,
  /// Minutes
  #[serde(default)]
  pub duration: u32,
  #[serde(default)]
  pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
  pub exercise_id: String,
  pub exercise_name: String,
  pub sets: Vec<SetLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
  pub set_number: u32,
  pub weight: f64,
  pub reps: u32,
  pub completed: bool,
}

impl WorkoutSession {
  pub fn log_for(&self, exercise_id: &str) -> Option<&ExerciseLog> {
    self.exercises.iter().find(|e| e.exercise_id == exercise_id)
  }

  /// Check the invariants a session must satisfy before it is saved
  pub fn validate(&self) -> Result<(), String> {
    if self.id.trim().is_empty() {
      return Err("Session id is empty".to_string());
    }
    for log in &self.exercises {
      if log.exercise_id.trim().is_empty() {
        return Err(format!("Exercise '{}' has no id", log.exercise_name));
      }
      for set in &log.sets {
        if !set.weight.is_finite() || set.weight < 0.0 {
          return Err(format!(
            "Set {} of {} has invalid weight {}",
            set.set_number, log.exercise_id, set.weight
          ));
        }
      }
    }
    Ok(())
  }
}
