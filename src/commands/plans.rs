//! Plan generation commands

use std::sync::Arc;

use tracing::info;

use super::{get_profile, AppState};
use crate::llm::ClaudeClient;
use crate::models::{NutritionPlan, WorkoutPlan};
use crate::plan_parser::{GeneratedPlan, PlanResponseParser};
use crate::planner::PlanGenerator;
use crate::store;

const OFFLINE_REASON: &str = "generated offline without the AI service";

fn planner(state: &AppState) -> Result<PlanGenerator, String> {
  let client = ClaudeClient::new(&state.config.ai).map_err(|e| format!("AI service unavailable: {}", e))?;
  Ok(PlanGenerator::new(
    Arc::new(client),
    state.store.clone(),
    state.config.metabolic,
  ))
}

/// Generate a nutrition plan for the stored profile.
///
/// With `offline` set the AI service is skipped and the deterministic plan
/// is saved instead.
pub async fn generate_nutrition_plan(state: &AppState, offline: bool) -> Result<GeneratedPlan<NutritionPlan>, String> {
  let profile = get_profile(state).await?;

  if offline {
    let parser = PlanResponseParser::new(state.config.metabolic);
    let plan: GeneratedPlan<NutritionPlan> = parser.fallback(&profile, OFFLINE_REASON.to_string());
    store::save_nutrition_plan(state.store.as_ref(), &plan)
      .await
      .map_err(|e| format!("Failed to save plan: {}", e))?;
    info!(id = %plan.id, "Saved offline nutrition plan");
    return Ok(plan);
  }

  planner(state)?
    .generate_nutrition(&profile)
    .await
    .map_err(|e| format!("Failed to generate nutrition plan: {}", e))
}

/// Generate a workout plan for the stored profile
pub async fn generate_workout_plan(state: &AppState, offline: bool) -> Result<GeneratedPlan<WorkoutPlan>, String> {
  let profile = get_profile(state).await?;

  if offline {
    let parser = PlanResponseParser::new(state.config.metabolic);
    let plan: GeneratedPlan<WorkoutPlan> = parser.fallback(&profile, OFFLINE_REASON.to_string());
    store::save_workout_plan(state.store.as_ref(), &plan)
      .await
      .map_err(|e| format!("Failed to save plan: {}", e))?;
    info!(id = %plan.id, "Saved offline workout plan");
    return Ok(plan);
  }

  planner(state)?
    .generate_workout(&profile)
    .await
    .map_err(|e| format!("Failed to generate workout plan: {}", e))
}

pub async fn list_nutrition_plans(state: &AppState) -> Result<Vec<GeneratedPlan<NutritionPlan>>, String> {
  store::load_nutrition_plans(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load nutrition plans: {}", e))
}

pub async fn list_workout_plans(state: &AppState) -> Result<Vec<GeneratedPlan<WorkoutPlan>>, String> {
  store::load_workout_plans(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load workout plans: {}", e))
}

pub async fn list_travel_plans(state: &AppState) -> Result<Vec<serde_json::Value>, String> {
  store::load_saved_travel_plans(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load travel plans: {}", e))
}

pub async fn save_travel_plan(state: &AppState, plan: serde_json::Value) -> Result<(), String> {
  store::save_travel_plan(state.store.as_ref(), plan)
    .await
    .map_err(|e| format!("Failed to save travel plan: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::tests::memory_state;
  use crate::commands::update_profile;
  use crate::config::{AiServiceConfig, AppConfig};
  use crate::plan_parser::PlanSource;
  use crate::store::MemoryStore;
  use crate::test_utils::{canonical_workout_json, mock_user_profile};
  use url::Url;

  #[tokio::test]
  async fn test_offline_plans_are_tagged_and_saved() {
    // Arrange
    let state = memory_state();
    update_profile(&state, mock_user_profile()).await.unwrap();

    // Act
    let nutrition = generate_nutrition_plan(&state, true).await.unwrap();
    let workout = generate_workout_plan(&state, true).await.unwrap();

    // Assert
    assert_eq!(
      nutrition.source,
      PlanSource::Fallback {
        reason: OFFLINE_REASON.to_string()
      }
    );
    assert!(workout.is_fallback());
    assert_eq!(list_nutrition_plans(&state).await.unwrap().len(), 1);
    assert_eq!(list_workout_plans(&state).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_missing_api_key_aborts_generation() {
    let state = memory_state();

    let err = generate_workout_plan(&state, false).await.unwrap_err();

    assert!(err.contains("API key"));
    assert!(list_workout_plans(&state).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_generate_workout_plan_through_http() {
    // Arrange: Fake messages endpoint returning a canonical plan
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
      "content": [{"type": "text", "text": canonical_workout_json()}],
      "stop_reason": "end_turn"
    });
    server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_body(body.to_string())
      .create_async()
      .await;

    let config = AppConfig {
      ai: AiServiceConfig {
        api_key: Some("sk-test".to_string()),
        base_url: Url::parse(&server.url()).unwrap(),
        ..AiServiceConfig::default()
      },
      ..AppConfig::default()
    };
    let state = AppState::new(Arc::new(MemoryStore::new()), config);

    // Act
    let plan = generate_workout_plan(&state, false).await.unwrap();

    // Assert
    assert_eq!(plan.source, PlanSource::Ai);
    assert_eq!(plan.plan.name, "Full Body Basics");
    assert_eq!(list_workout_plans(&state).await.unwrap(), vec![plan]);
  }

  #[tokio::test]
  async fn test_travel_plans_are_listed_in_save_order() {
    let state = memory_state();

    save_travel_plan(&state, serde_json::json!({"destination": "Oslo"})).await.unwrap();
    let err = save_travel_plan(&state, serde_json::json!([1, 2])).await.unwrap_err();

    assert!(err.contains("JSON object"));
    let plans = list_travel_plans(&state).await.unwrap();
    assert_eq!(plans, vec![serde_json::json!({"destination": "Oslo"})]);
  }
}
