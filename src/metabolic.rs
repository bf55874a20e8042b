//! Deterministic metabolic math
//!
//! BMR, TDEE, target intake and calorie-to-weight forecasts. Everything here
//! is pure: invalid input is an error, never a silently substituted default.
//! Defaults such as "assume 70 kg" belong to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MetabolicConfig;
use crate::models::UserProfile;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum InvalidInputError {
  #[error("{0} is required")]
  Missing(&'static str),

  #[error("{field} must be a positive number, got {value}")]
  NonPositive { field: &'static str, value: f64 },

  #[error("Unknown activity level: {0}")]
  UnknownActivityLevel(String),

  #[error("Unknown gender: {0}")]
  UnknownGender(String),
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, InvalidInputError> {
  if value.is_finite() && value > 0.0 {
    Ok(value)
  } else {
    Err(InvalidInputError::NonPositive { field, value })
  }
}

/// ---------------------------------------------------------------------------
/// Inputs
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

impl std::str::FromStr for Gender {
  type Err = InvalidInputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "male" | "m" | "man" => Ok(Gender::Male),
      "female" | "f" | "woman" => Ok(Gender::Female),
      _ => Err(InvalidInputError::UnknownGender(s.to_string())),
    }
  }
}

/// Which BMR equation to apply. The two give different numbers and are
/// never substituted for each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmrFormula {
  /// `10w + 6.25h - 5a + 5` (male) / `- 161` (female); quick calculators
  #[default]
  MifflinStJeor,
  /// Revised Harris-Benedict; profile-driven suggestions
  HarrisBenedict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
  Sedentary,
  Light,
  Moderate,
  Active,
  VeryActive,
}

impl ActivityLevel {
  pub const ALL: [ActivityLevel; 5] = [
    ActivityLevel::Sedentary,
    ActivityLevel::Light,
    ActivityLevel::Moderate,
    ActivityLevel::Active,
    ActivityLevel::VeryActive,
  ];

  pub fn multiplier(&self) -> f64 {
    match self {
      ActivityLevel::Sedentary => 1.2,
      ActivityLevel::Light => 1.375,
      ActivityLevel::Moderate => 1.55,
      ActivityLevel::Active => 1.725,
      ActivityLevel::VeryActive => 1.9,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ActivityLevel::Sedentary => "sedentary",
      ActivityLevel::Light => "light",
      ActivityLevel::Moderate => "moderate",
      ActivityLevel::Active => "active",
      ActivityLevel::VeryActive => "very-active",
    }
  }
}

impl std::str::FromStr for ActivityLevel {
  type Err = InvalidInputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
    match normalized.as_str() {
      "sedentary" => Ok(ActivityLevel::Sedentary),
      "light" | "lightly-active" => Ok(ActivityLevel::Light),
      "moderate" | "moderately-active" => Ok(ActivityLevel::Moderate),
      "active" => Ok(ActivityLevel::Active),
      "very-active" | "extra-active" => Ok(ActivityLevel::VeryActive),
      _ => Err(InvalidInputError::UnknownActivityLevel(s.to_string())),
    }
  }
}

/// Validated body measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetrics {
  pub weight_kg: f64,
  pub height_cm: f64,
  pub age: u32,
  pub gender: Gender,
}

impl BodyMetrics {
  pub fn new(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
  ) -> Result<Self, InvalidInputError> {
    require_positive("weightKg", weight_kg)?;
    require_positive("heightCm", height_cm)?;
    if age == 0 {
      return Err(InvalidInputError::NonPositive {
        field: "age",
        value: 0.0,
      });
    }
    Ok(Self {
      weight_kg,
      height_cm,
      age,
      gender,
    })
  }

  /// Extract metrics from a sparse profile; any missing field is an error
  pub fn from_profile(profile: &UserProfile) -> Result<Self, InvalidInputError> {
    let body = &profile.body;
    let weight = body.weight_kg.ok_or(InvalidInputError::Missing("weightKg"))?;
    let height = body.height_cm.ok_or(InvalidInputError::Missing("heightCm"))?;
    let age = body.age.ok_or(InvalidInputError::Missing("age"))?;
    let gender = body
      .gender
      .as_deref()
      .ok_or(InvalidInputError::Missing("gender"))?
      .parse()?;
    Self::new(weight, height, age, gender)
  }

  pub fn bmr(&self, formula: BmrFormula) -> f64 {
    let (w, h, a) = (self.weight_kg, self.height_cm, self.age as f64);
    match (formula, self.gender) {
      (BmrFormula::MifflinStJeor, Gender::Male) => 10.0 * w + 6.25 * h - 5.0 * a + 5.0,
      (BmrFormula::MifflinStJeor, Gender::Female) => 10.0 * w + 6.25 * h - 5.0 * a - 161.0,
      (BmrFormula::HarrisBenedict, Gender::Male) => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
      (BmrFormula::HarrisBenedict, Gender::Female) => {
        447.593 + 9.247 * w + 3.098 * h - 4.330 * a
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// BMR / TDEE / Target Intake
/// ---------------------------------------------------------------------------

pub fn calculate_bmr(
  weight_kg: f64,
  height_cm: f64,
  age: u32,
  gender: Gender,
  formula: BmrFormula,
) -> Result<f64, InvalidInputError> {
  Ok(BodyMetrics::new(weight_kg, height_cm, age, gender)?.bmr(formula))
}

pub fn calculate_tdee(bmr: f64, level: ActivityLevel) -> Result<f64, InvalidInputError> {
  Ok(require_positive("bmr", bmr)? * level.multiplier())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightGoal {
  Lose,
  Maintain,
  Gain,
}

/// Daily deficit applied for weight loss
const LOSS_DEFICIT_KCAL: f64 = 500.0;
/// Daily surplus applied for weight gain
const GAIN_SURPLUS_KCAL: f64 = 300.0;

impl WeightGoal {
  /// Infer the goal from current vs goal weight; maintain when either is unknown
  pub fn from_profile(profile: &UserProfile) -> Self {
    match (profile.body.weight_kg, profile.body.goal_weight_kg) {
      (Some(current), Some(goal)) if goal < current => WeightGoal::Lose,
      (Some(current), Some(goal)) if goal > current => WeightGoal::Gain,
      _ => WeightGoal::Maintain,
    }
  }

  pub fn target_intake(&self, tdee: f64) -> f64 {
    match self {
      WeightGoal::Lose => tdee - LOSS_DEFICIT_KCAL,
      WeightGoal::Maintain => tdee,
      WeightGoal::Gain => tdee + GAIN_SURPLUS_KCAL,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicResult {
  pub bmr: f64,
  pub tdee: f64,
  pub target_intake: f64,
}

impl MetabolicResult {
  pub fn compute(
    metrics: &BodyMetrics,
    formula: BmrFormula,
    level: ActivityLevel,
    goal: WeightGoal,
  ) -> Result<Self, InvalidInputError> {
    let bmr = metrics.bmr(formula);
    let tdee = calculate_tdee(bmr, level)?;
    Ok(Self {
      bmr,
      tdee,
      target_intake: goal.target_intake(tdee),
    })
  }

  /// Compute from a stored profile. Body metrics and activity level must be
  /// present; the goal is inferred.
  pub fn for_profile(profile: &UserProfile, formula: BmrFormula) -> Result<Self, InvalidInputError> {
    let metrics = BodyMetrics::from_profile(profile)?;
    let level: ActivityLevel = profile
      .body
      .activity_level
      .as_deref()
      .ok_or(InvalidInputError::Missing("activityLevel"))?
      .parse()?;
    Self::compute(&metrics, formula, level, WeightGoal::from_profile(profile))
  }
}

/// ---------------------------------------------------------------------------
/// Forecast
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyDirection {
  Surplus,
  Deficit,
}

/// Time to reach a weight goal. `Unreachable` when intake equals maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeeksToGoal {
  Reachable { weeks: u32 },
  Unreachable,
}

impl std::fmt::Display for WeeksToGoal {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WeeksToGoal::Reachable { weeks: 1 } => write!(f, "1 week"),
      WeeksToGoal::Reachable { weeks } => write!(f, "{} weeks", weeks),
      WeeksToGoal::Unreachable => write!(f, "not reachable at this intake"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
  /// Signed: negative in a deficit
  pub weekly_delta_kg: f64,
  pub direction: EnergyDirection,
  pub weeks_to_goal: WeeksToGoal,
}

/// Forecast weekly weight change for an intake against maintenance.
///
/// `goal_delta_kg` is the amount of weight to change; its sign is ignored.
pub fn forecast(
  intake_kcal: f64,
  maintenance_kcal: f64,
  goal_delta_kg: f64,
  config: &MetabolicConfig,
) -> Result<ForecastResult, InvalidInputError> {
  if !intake_kcal.is_finite() || intake_kcal < 0.0 {
    return Err(InvalidInputError::NonPositive {
      field: "intakeCalories",
      value: intake_kcal,
    });
  }
  require_positive("maintenanceCalories", maintenance_kcal)?;
  require_positive("kcalPerKg", config.kcal_per_kg)?;
  if !goal_delta_kg.is_finite() {
    return Err(InvalidInputError::NonPositive {
      field: "goalDeltaKg",
      value: goal_delta_kg,
    });
  }

  let daily_delta = intake_kcal - maintenance_kcal;
  let weekly_delta_kg = (daily_delta * 7.0) / config.kcal_per_kg;
  let direction = if daily_delta > 0.0 {
    EnergyDirection::Surplus
  } else {
    EnergyDirection::Deficit
  };

  let weeks_to_goal = if weekly_delta_kg == 0.0 {
    WeeksToGoal::Unreachable
  } else {
    let weeks = (goal_delta_kg.abs() / weekly_delta_kg.abs()).ceil();
    WeeksToGoal::Reachable {
      weeks: weeks.min(u32::MAX as f64) as u32,
    }
  };

  Ok(ForecastResult {
    weekly_delta_kg,
    direction,
    weeks_to_goal,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::test_utils::mock_user_profile;

  #[test]
  fn test_gender_term_is_non_trivial() {
    for formula in [BmrFormula::MifflinStJeor, BmrFormula::HarrisBenedict] {
      for (w, h, a) in [(70.0, 175.0, 25), (55.5, 160.0, 40), (120.0, 190.0, 61)] {
        let male = calculate_bmr(w, h, a, Gender::Male, formula).unwrap();
        let female = calculate_bmr(w, h, a, Gender::Female, formula).unwrap();
        assert_ne!(male, female, "{:?} w={} h={} a={}", formula, w, h, a);
      }
    }
  }

  #[test]
  fn test_mifflin_st_jeor_values() {
    let male = calculate_bmr(70.0, 175.0, 25, Gender::Male, BmrFormula::MifflinStJeor).unwrap();
    assert_approx_eq!(male, 1673.75, 1e-9);

    let female = calculate_bmr(60.0, 165.0, 30, Gender::Female, BmrFormula::MifflinStJeor).unwrap();
    // 600 + 1031.25 - 150 - 161
    assert_approx_eq!(female, 1320.25, 1e-9);
  }

  #[test]
  fn test_formulas_are_not_conflated() {
    let metrics = BodyMetrics::new(70.0, 175.0, 25, Gender::Male).unwrap();
    assert_ne!(
      metrics.bmr(BmrFormula::MifflinStJeor),
      metrics.bmr(BmrFormula::HarrisBenedict)
    );
  }

  #[test]
  fn test_rejects_non_positive_input() {
    assert!(matches!(
      calculate_bmr(0.0, 175.0, 25, Gender::Male, BmrFormula::MifflinStJeor),
      Err(InvalidInputError::NonPositive { field: "weightKg", .. })
    ));
    assert!(matches!(
      calculate_bmr(70.0, -1.0, 25, Gender::Male, BmrFormula::MifflinStJeor),
      Err(InvalidInputError::NonPositive { field: "heightCm", .. })
    ));
    assert!(matches!(
      calculate_bmr(70.0, 175.0, 0, Gender::Female, BmrFormula::HarrisBenedict),
      Err(InvalidInputError::NonPositive { field: "age", .. })
    ));
    assert!(calculate_bmr(f64::NAN, 175.0, 25, Gender::Male, BmrFormula::MifflinStJeor).is_err());
  }

  #[test]
  fn test_missing_profile_fields_are_errors() {
    let mut profile = mock_user_profile();
    profile.body.height_cm = None;
    assert_eq!(
      BodyMetrics::from_profile(&profile),
      Err(InvalidInputError::Missing("heightCm"))
    );

    let mut profile = mock_user_profile();
    profile.body.gender = Some("unspecified".to_string());
    assert!(matches!(
      BodyMetrics::from_profile(&profile),
      Err(InvalidInputError::UnknownGender(_))
    ));
  }

  #[test]
  fn test_tdee_is_bmr_times_multiplier() {
    let bmr = 1650.0;
    let expected = [1.2, 1.375, 1.55, 1.725, 1.9];
    for (level, multiplier) in ActivityLevel::ALL.iter().zip(expected) {
      assert_eq!(calculate_tdee(bmr, *level).unwrap(), bmr * multiplier);
    }
  }

  #[test]
  fn test_activity_level_parsing() {
    assert_eq!("moderate".parse::<ActivityLevel>().unwrap(), ActivityLevel::Moderate);
    assert_eq!("Very Active".parse::<ActivityLevel>().unwrap(), ActivityLevel::VeryActive);
    assert_eq!("lightly_active".parse::<ActivityLevel>().unwrap(), ActivityLevel::Light);
    assert_eq!(
      "couch".parse::<ActivityLevel>(),
      Err(InvalidInputError::UnknownActivityLevel("couch".to_string()))
    );
  }

  #[test]
  fn test_target_intake_follows_goal() {
    let mut profile = mock_user_profile();
    profile.body.goal_weight_kg = Some(65.0);
    let result = MetabolicResult::for_profile(&profile, BmrFormula::HarrisBenedict).unwrap();
    assert_approx_eq!(result.target_intake, result.tdee - 500.0, 1e-9);

    profile.body.goal_weight_kg = Some(75.0);
    let result = MetabolicResult::for_profile(&profile, BmrFormula::HarrisBenedict).unwrap();
    assert_approx_eq!(result.target_intake, result.tdee + 300.0, 1e-9);

    profile.body.goal_weight_kg = None;
    let result = MetabolicResult::for_profile(&profile, BmrFormula::HarrisBenedict).unwrap();
    assert_eq!(result.target_intake, result.tdee);
  }

  #[test]
  fn test_missing_activity_level_is_error() {
    let mut profile = mock_user_profile();
    profile.body.activity_level = None;
    assert_eq!(
      MetabolicResult::for_profile(&profile, BmrFormula::MifflinStJeor),
      Err(InvalidInputError::Missing("activityLevel"))
    );
  }

  #[test]
  fn test_forecast_maintenance_is_unreachable() {
    let config = MetabolicConfig::default();
    for goal in [0.5, 5.0, 30.0] {
      let result = forecast(2400.0, 2400.0, goal, &config).unwrap();
      assert_eq!(result.weekly_delta_kg, 0.0);
      assert_eq!(result.weeks_to_goal, WeeksToGoal::Unreachable);
    }
  }

  #[test]
  fn test_forecast_surplus_and_weeks() {
    let config = MetabolicConfig::default();
    // +500 kcal/day = 3500/week = 0.5 kg/week
    let result = forecast(3000.0, 2500.0, 2.2, &config).unwrap();
    assert_approx_eq!(result.weekly_delta_kg, 0.5, 1e-9);
    assert_eq!(result.direction, EnergyDirection::Surplus);
    assert_eq!(result.weeks_to_goal, WeeksToGoal::Reachable { weeks: 5 });
  }

  #[test]
  fn test_forecast_uses_configured_constant() {
    let config = MetabolicConfig { kcal_per_kg: 7700.0 };
    let result = forecast(1400.0, 2500.0, 10.0, &config).unwrap();
    assert_approx_eq!(result.weekly_delta_kg, -1.0, 1e-9);
    assert_eq!(result.weeks_to_goal, WeeksToGoal::Reachable { weeks: 10 });
  }

  #[test]
  fn test_forecast_rejects_bad_input() {
    let config = MetabolicConfig::default();
    assert!(forecast(2000.0, 0.0, 5.0, &config).is_err());
    assert!(forecast(-1.0, 2000.0, 5.0, &config).is_err());
    assert!(forecast(2000.0, 2200.0, f64::INFINITY, &config).is_err());
  }

  #[test]
  fn test_weeks_to_goal_serialization() {
    let json = serde_json::to_value(WeeksToGoal::Unreachable).unwrap();
    assert_eq!(json, serde_json::json!({"status": "unreachable"}));
    assert_eq!(WeeksToGoal::Reachable { weeks: 3 }.to_string(), "3 weeks");
  }

  #[test]
  fn test_end_to_end_profile_scenario() {
    // 70 kg, 175 cm, 25 y, male, moderate
    let profile = mock_user_profile();
    let result = MetabolicResult::for_profile(&profile, BmrFormula::HarrisBenedict).unwrap();
    assert_approx_eq!(result.bmr, 1724.375, 0.5);
    assert_approx_eq!(result.tdee, 2672.8, 1.0);

    let forecast = forecast(2200.0, result.tdee, 5.0, &MetabolicConfig::default()).unwrap();
    assert_eq!(forecast.direction, EnergyDirection::Deficit);
    assert_approx_eq!(result.tdee - 2200.0, 472.8, 1.0);
    assert_approx_eq!(forecast.weekly_delta_kg.abs(), 0.473, 0.005);
    assert_eq!(forecast.weeks_to_goal, WeeksToGoal::Reachable { weeks: 11 });
  }
}
