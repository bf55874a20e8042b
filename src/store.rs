//! Key/value persistence for profiles, plans and sessions
//!
//! The engine only relies on `get(key)` / `set(key, value)` with JSON values.
//! `SqliteStore` backs that with a single `kv_store` table; `MemoryStore` is
//! used for tests and dry runs. Writes are last-write-wins.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{NutritionPlan, UserProfile, WorkoutPlan, WorkoutSession};
use crate::plan_parser::GeneratedPlan;

/// ---------------------------------------------------------------------------
/// Keys
/// ---------------------------------------------------------------------------

pub const USER_PROFILE_KEY: &str = "user-profile";
pub const WORKOUT_PLANS_KEY: &str = "workout-plans";
pub const WORKOUT_SESSIONS_KEY: &str = "workout-sessions";
pub const SAVED_TRAVEL_PLANS_KEY: &str = "saved-travel-plans";
pub const NUTRITION_PLANS_KEY: &str = "nutrition-plans";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("{kind} with id '{id}' already exists")]
  Duplicate { kind: &'static str, id: String },

  #[error("Invalid record: {0}")]
  Invalid(String),
}

/// ---------------------------------------------------------------------------
/// Store Contract
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlanStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
  async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// SQLite-backed store, one row per key
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }
}

#[async_trait]
impl PlanStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?1")
      .bind(key)
      .fetch_optional(&self.pool)
      .await?;

    row
      .map(|(raw,)| serde_json::from_str(&raw).map_err(StoreError::from))
      .transpose()
  }

  async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
    let raw = serde_json::to_string(&value)?;
    let updated_at = Utc::now().to_rfc3339();

    sqlx::query(
      r#"
      INSERT INTO kv_store (key, value, updated_at)
      VALUES (?1, ?2, ?3)
      ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(key)
    .bind(&raw)
    .bind(&updated_at)
    .execute(&self.pool)
    .await?;

    debug!(key, bytes = raw.len(), "Stored value");
    Ok(())
  }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl PlanStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
    Ok(values.get(key).cloned())
  }

  async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
    let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
    values.insert(key.to_string(), value);
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Typed Access
/// ---------------------------------------------------------------------------

async fn load_list<T: DeserializeOwned>(store: &dyn PlanStore, key: &str) -> Result<Vec<T>, StoreError> {
  match store.get(key).await? {
    Some(Value::Null) | None => Ok(Vec::new()),
    Some(value) => Ok(serde_json::from_value(value)?),
  }
}

async fn save_list<T: Serialize>(store: &dyn PlanStore, key: &str, items: &[T]) -> Result<(), StoreError> {
  store.set(key, serde_json::to_value(items)?).await
}

/// Stored profile, or an empty one if none has been saved
pub async fn load_profile(store: &dyn PlanStore) -> Result<UserProfile, StoreError> {
  match store.get(USER_PROFILE_KEY).await? {
    Some(Value::Null) | None => Ok(UserProfile::default()),
    Some(value) => Ok(serde_json::from_value(value)?),
  }
}

pub async fn save_profile(store: &dyn PlanStore, profile: &UserProfile) -> Result<(), StoreError> {
  store.set(USER_PROFILE_KEY, serde_json::to_value(profile)?).await?;
  info!("Saved user profile");
  Ok(())
}

pub async fn load_nutrition_plans(
  store: &dyn PlanStore,
) -> Result<Vec<GeneratedPlan<NutritionPlan>>, StoreError> {
  load_list(store, NUTRITION_PLANS_KEY).await
}

pub async fn load_workout_plans(store: &dyn PlanStore) -> Result<Vec<GeneratedPlan<WorkoutPlan>>, StoreError> {
  load_list(store, WORKOUT_PLANS_KEY).await
}

/// Insert a plan, replacing any stored plan with the same id
async fn upsert_plan<P>(store: &dyn PlanStore, key: &str, plan: &GeneratedPlan<P>) -> Result<(), StoreError>
where
  P: Clone + Serialize + DeserializeOwned,
{
  let mut plans: Vec<GeneratedPlan<P>> = load_list(store, key).await?;
  plans.retain(|p| p.id != plan.id);
  plans.push(plan.clone());
  save_list(store, key, &plans).await?;
  info!(key, id = %plan.id, total = plans.len(), "Saved plan");
  Ok(())
}

pub async fn save_nutrition_plan(
  store: &dyn PlanStore,
  plan: &GeneratedPlan<NutritionPlan>,
) -> Result<(), StoreError> {
  upsert_plan(store, NUTRITION_PLANS_KEY, plan).await
}

pub async fn save_workout_plan(store: &dyn PlanStore, plan: &GeneratedPlan<WorkoutPlan>) -> Result<(), StoreError> {
  upsert_plan(store, WORKOUT_PLANS_KEY, plan).await
}

pub async fn find_workout_plan(
  store: &dyn PlanStore,
  plan_id: &str,
) -> Result<Option<GeneratedPlan<WorkoutPlan>>, StoreError> {
  let plans = load_workout_plans(store).await?;
  Ok(plans.into_iter().find(|p| p.id == plan_id))
}

pub async fn load_sessions(store: &dyn PlanStore) -> Result<Vec<WorkoutSession>, StoreError> {
  load_list(store, WORKOUT_SESSIONS_KEY).await
}

/// Append a finished session. Sessions are immutable once stored.
pub async fn append_session(store: &dyn PlanStore, session: WorkoutSession) -> Result<(), StoreError> {
  session.validate().map_err(StoreError::Invalid)?;

  let mut sessions = load_sessions(store).await?;
  if sessions.iter().any(|s| s.id == session.id) {
    return Err(StoreError::Duplicate {
      kind: "Session",
      id: session.id,
    });
  }

  info!(id = %session.id, exercises = session.exercises.len(), "Appending workout session");
  sessions.push(session);
  save_list(store, WORKOUT_SESSIONS_KEY, &sessions).await
}

/// Travel plans are stored as opaque JSON records; the engine only lists and
/// appends them.
pub async fn load_saved_travel_plans(store: &dyn PlanStore) -> Result<Vec<Value>, StoreError> {
  load_list(store, SAVED_TRAVEL_PLANS_KEY).await
}

pub async fn save_travel_plan(store: &dyn PlanStore, plan: Value) -> Result<(), StoreError> {
  if !plan.is_object() {
    return Err(StoreError::Invalid("travel plan must be a JSON object".to_string()));
  }

  let mut plans = load_saved_travel_plans(store).await?;
  plans.push(plan);
  save_list(store, SAVED_TRAVEL_PLANS_KEY, &plans).await?;
  debug!(total = plans.len(), "Saved travel plan");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
