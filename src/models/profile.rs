use serde::{Deserialize, Serialize};

/// Sparse user profile collected by the onboarding wizards.
///
/// Every attribute is optional. A missing value means "unknown" and must
/// never be read as zero or false; consumers that need a value either
/// fail (the metabolic calculator) or pick their own documented default
/// (fallback plan synthesis).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  #[serde(default)]
  pub body: BodyProfile,
  #[serde(default)]
  pub fitness: FitnessProfile,
  #[serde(default)]
  pub nutrition: NutritionProfile,
  #[serde(default)]
  pub travel: TravelProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyProfile {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weight_kg: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub height_cm: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub age: Option<u32>,
  /// Free text as entered ("male", "female"); parsed by the calculator.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub activity_level: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub goal_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessProfile {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub goals: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub training_days_per_week: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub daily_calories: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meals_per_day: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub diet_preferences: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub allergies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelProfile {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub budget: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub style: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub destinations: Option<Vec<String>>,
}

impl UserProfile {
  /// Diet preferences lowercased, empty when unknown
  pub fn diet_preferences(&self) -> Vec<String> {
    lowercase_all(self.nutrition.diet_preferences.as_deref())
  }

  /// Allergies lowercased, empty when unknown
  pub fn allergies(&self) -> Vec<String> {
    lowercase_all(self.nutrition.allergies.as_deref())
  }

  pub fn fitness_goals(&self) -> Vec<String> {
    lowercase_all(self.fitness.goals.as_deref())
  }

  /// Overlay the known fields of `update`; fields it leaves unknown keep their value
  pub fn merge(&mut self, update: UserProfile) {
    let UserProfile {
      body,
      fitness,
      nutrition,
      travel,
    } = update;

    overlay(&mut self.body.weight_kg, body.weight_kg);
    overlay(&mut self.body.height_cm, body.height_cm);
    overlay(&mut self.body.age, body.age);
    overlay(&mut self.body.gender, body.gender);
    overlay(&mut self.body.activity_level, body.activity_level);
    overlay(&mut self.body.goal_weight_kg, body.goal_weight_kg);

    overlay(&mut self.fitness.level, fitness.level);
    overlay(&mut self.fitness.goals, fitness.goals);
    overlay(&mut self.fitness.training_days_per_week, fitness.training_days_per_week);

    overlay(&mut self.nutrition.daily_calories, nutrition.daily_calories);
    overlay(&mut self.nutrition.meals_per_day, nutrition.meals_per_day);
    overlay(&mut self.nutrition.diet_preferences, nutrition.diet_preferences);
    overlay(&mut self.nutrition.allergies, nutrition.allergies);

    overlay(&mut self.travel.budget, travel.budget);
    overlay(&mut self.travel.style, travel.style);
    overlay(&mut self.travel.destinations, travel.destinations);
  }
}

fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
  if value.is_some() {
    *target = value;
  }
}

fn lowercase_all(items: Option<&[String]>) -> Vec<String> {
  items
    .unwrap_or_default()
    .iter()
    .map(|s| s.trim().to_lowercase())
    .filter(|s| !s.is_empty())
    .collect()
}
