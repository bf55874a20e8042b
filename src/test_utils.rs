//! Test utilities and helpers for unit testing
//!
//! - In-memory database setup/teardown
//! - Mock profiles and sessions
//! - Canonical AI responses
//! - Float assertions

use crate::models::{BodyProfile, ExerciseLog, SetLog, UserProfile, WorkoutSession};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database with migrations applied
///
/// Uses max_connections(1) so every query sees the same in-memory database;
/// each extra pool connection would otherwise open its own empty one
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// 70 kg, 175 cm, 25 year old male, moderately active, no goal weight
pub fn mock_user_profile() -> UserProfile {
  UserProfile {
    body: BodyProfile {
      weight_kg: Some(70.0),
      height_cm: Some(175.0),
      age: Some(25),
      gender: Some("male".to_string()),
      activity_level: Some("moderate".to_string()),
      goal_weight_kg: None,
    },
    ..UserProfile::default()
  }
}

/// Exercise log from `(weight, reps, completed)` tuples
pub fn mock_exercise_log(exercise_id: &str, sets: &[(f64, u32, bool)]) -> ExerciseLog {
  ExerciseLog {
    exercise_id: exercise_id.to_string(),
    exercise_name: exercise_id.replace('-', " "),
    sets: sets
      .iter()
      .enumerate()
      .map(|(i, (weight, reps, completed))| SetLog {
        set_number: i as u32 + 1,
        weight: *weight,
        reps: *reps,
        completed: *completed,
      })
      .collect(),
  }
}

/// Session dated `days_ago` days before now (negative for the future)
pub fn mock_session(id: &str, days_ago: i64, exercises: Vec<ExerciseLog>) -> WorkoutSession {
  WorkoutSession {
    id: id.to_string(),
    workout_plan_id: "plan-1".to_string(),
    workout_day_id: "day-1".to_string(),
    date: datetime_days_ago(days_ago),
    exercises,
    duration: 60,
    notes: String::new(),
  }
}

/// A well-formed nutrition response in the shape the system prompt asks for
pub fn canonical_nutrition_json() -> String {
  r#"{
  "dailyCalories": 2000,
  "mealsPerDay": 2,
  "weeklyGoal": "Maintain current weight",
  "weeklyMeals": {
    "Monday": [
      {"name": "Oatmeal", "time": "08:00", "calories": 450,
       "description": "Rolled oats with berries", "ingredients": ["oats", "blueberries", "milk"]},
      {"name": "Chicken Salad", "time": "13:00", "calories": 650,
       "description": "Grilled chicken over greens", "ingredients": ["chicken breast", "spinach", "olive oil"]}
    ],
    "Tuesday": [
      {"name": "Lentil Soup", "time": "12:30", "calories": 550,
       "description": "Red lentils with cumin", "ingredients": ["red lentils", "onion", "cumin"]}
    ]
  },
  "recommendations": ["Drink water with every meal"]
}"#
    .to_string()
}

/// A well-formed workout response with every id present
pub fn canonical_workout_json() -> String {
  r#"{
  "id": "ai-plan",
  "name": "Full Body Basics",
  "description": "Two full body days",
  "createdAt": "2026-01-05T09:00:00Z",
  "workoutDays": [
    {"id": "day-1", "name": "Full Body A", "exercises": [
      {"id": "back-squat", "name": "Back Squat", "sets": 3, "reps": "5",
       "restTime": "180s", "muscleGroups": ["quads", "glutes"]},
      {"id": "bench-press", "name": "Bench Press", "sets": 3, "reps": "8-12",
       "restTime": "90s", "muscleGroups": ["chest", "triceps"]}
    ]},
    {"id": "day-2", "name": "Full Body B", "exercises": [
      {"id": "deadlift", "name": "Deadlift", "sets": 2, "reps": "5",
       "restTime": "180s", "muscleGroups": ["hamstrings", "back"]}
    ]}
  ]
}"#
  .to_string()
}

/// ---------------------------------------------------------------------------
/// Time Utilities
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_creates_kv_store() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='kv_store'")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(tables.len(), 1);
    teardown_test_db(pool).await;
  }

  #[test]
  fn test_canonical_fixtures_parse() {
    let nutrition: crate::models::NutritionPlan = serde_json::from_str(&canonical_nutrition_json()).unwrap();
    assert_eq!(nutrition.weekly_meals.len(), 2);

    let workout: crate::models::WorkoutPlan = serde_json::from_str(&canonical_workout_json()).unwrap();
    assert_eq!(workout.workout_days.len(), 2);
  }

  #[test]
  fn test_mock_exercise_log_numbers_sets() {
    let log = mock_exercise_log("bench-press", &[(60.0, 8, true), (60.0, 6, false)]);
    assert_eq!(log.exercise_name, "bench press");
    assert_eq!(log.sets[1].set_number, 2);
    assert!(!log.sets[1].completed);
  }
}
