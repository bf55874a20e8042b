//! Calculator commands

use serde::{Deserialize, Serialize};

use super::{get_profile, AppState};
use crate::metabolic::{
  forecast, ActivityLevel, BmrFormula, BodyMetrics, ForecastResult, Gender, MetabolicResult, WeightGoal,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicRequest {
  pub weight_kg: f64,
  pub height_cm: f64,
  pub age: u32,
  pub gender: String,
  pub activity_level: String,
  #[serde(default)]
  pub formula: BmrFormula,
  #[serde(default)]
  pub goal: Option<WeightGoal>,
}

/// BMR, TDEE and target intake from explicit inputs
pub fn calculate_metabolics(request: &MetabolicRequest) -> Result<MetabolicResult, String> {
  let gender = request.gender.parse::<Gender>().map_err(|e| e.to_string())?;
  let level = request.activity_level.parse::<ActivityLevel>().map_err(|e| e.to_string())?;
  let metrics =
    BodyMetrics::new(request.weight_kg, request.height_cm, request.age, gender).map_err(|e| e.to_string())?;

  MetabolicResult::compute(
    &metrics,
    request.formula,
    level,
    request.goal.unwrap_or(WeightGoal::Maintain),
  )
  .map_err(|e| e.to_string())
}

/// Suggested needs for the stored profile
pub async fn profile_metabolics(state: &AppState) -> Result<MetabolicResult, String> {
  let profile = get_profile(state).await?;
  MetabolicResult::for_profile(&profile, BmrFormula::HarrisBenedict)
    .map_err(|e| format!("Profile is incomplete: {}", e))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
  pub intake_calories: f64,
  /// Defaults to the profile's TDEE
  #[serde(default)]
  pub maintenance_calories: Option<f64>,
  /// Defaults to the gap between the profile's weight and goal weight
  #[serde(default)]
  pub goal_delta_kg: Option<f64>,
}

pub async fn forecast_weight(state: &AppState, request: &ForecastRequest) -> Result<ForecastResult, String> {
  let maintenance = match request.maintenance_calories {
    Some(kcal) => kcal,
    None => profile_metabolics(state).await?.tdee,
  };

  let goal_delta = match request.goal_delta_kg {
    Some(delta) => delta,
    None => {
      let profile = get_profile(state).await?;
      match (profile.body.weight_kg, profile.body.goal_weight_kg) {
        (Some(current), Some(goal)) => goal - current,
        _ => 0.0,
      }
    }
  };

  forecast(request.intake_calories, maintenance, goal_delta, &state.config.metabolic).map_err(|e| e.to_string())
}
