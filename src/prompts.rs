//! Prompt text sent to the AI service
//!
//! Only attributes the profile actually has are rendered; unknown values
//! are left out rather than written as zero.

use crate::metabolic::MetabolicResult;
use crate::models::UserProfile;

pub const NUTRITION_SYSTEM_PROMPT: &str = include_str!("prompts/nutrition_system.txt");
pub const WORKOUT_SYSTEM_PROMPT: &str = include_str!("prompts/workout_system.txt");

fn push_line(out: &mut String, label: &str, value: Option<String>) {
  if let Some(value) = value {
    out.push_str(&format!("- {}: {}\n", label, value));
  }
}

fn join_list(items: &Option<Vec<String>>) -> Option<String> {
  items
    .as_ref()
    .filter(|v| !v.is_empty())
    .map(|v| v.join(", "))
}

fn format_body(profile: &UserProfile) -> String {
  let body = &profile.body;
  let mut out = String::new();
  push_line(&mut out, "Weight", body.weight_kg.map(|w| format!("{:.1} kg", w)));
  push_line(&mut out, "Height", body.height_cm.map(|h| format!("{:.0} cm", h)));
  push_line(&mut out, "Age", body.age.map(|a| a.to_string()));
  push_line(&mut out, "Gender", body.gender.clone());
  push_line(&mut out, "Activity level", body.activity_level.clone());
  push_line(&mut out, "Goal weight", body.goal_weight_kg.map(|w| format!("{:.1} kg", w)));
  out
}

fn format_fitness(profile: &UserProfile) -> String {
  let fitness = &profile.fitness;
  let mut out = String::new();
  push_line(&mut out, "Fitness level", fitness.level.clone());
  push_line(&mut out, "Goals", join_list(&fitness.goals));
  push_line(
    &mut out,
    "Training days per week",
    fitness.training_days_per_week.map(|d| d.to_string()),
  );
  out
}

fn format_nutrition(profile: &UserProfile) -> String {
  let nutrition = &profile.nutrition;
  let mut out = String::new();
  push_line(
    &mut out,
    "Daily calories",
    nutrition.daily_calories.map(|c| format!("{:.0} kcal", c)),
  );
  push_line(&mut out, "Meals per day", nutrition.meals_per_day.map(|m| m.to_string()));
  push_line(&mut out, "Diet preferences", join_list(&nutrition.diet_preferences));
  push_line(&mut out, "Allergies", join_list(&nutrition.allergies));
  out
}

pub fn build_nutrition_prompt(profile: &UserProfile, suggested: Option<&MetabolicResult>) -> String {
  let mut prompt = String::from("Create a 7-day meal plan for this person.\n\nPROFILE:\n");
  prompt.push_str(&format_body(profile));
  prompt.push_str(&format_nutrition(profile));

  if profile.nutrition.daily_calories.is_none() {
    if let Some(result) = suggested {
      prompt.push_str(&format!(
        "\nCALCULATED NEEDS:\n- BMR: {:.0} kcal\n- TDEE: {:.0} kcal\n- Suggested intake: {:.0} kcal\n",
        result.bmr, result.tdee, result.target_intake
      ));
    }
  }

  prompt.push_str("\nRespond with valid JSON matching the OUTPUT FORMAT specified in your instructions.");
  prompt
}

pub fn build_workout_prompt(profile: &UserProfile) -> String {
  let mut prompt = String::from("Create a weekly workout plan for this person.\n\nPROFILE:\n");
  prompt.push_str(&format_fitness(profile));
  prompt.push_str(&format_body(profile));
  prompt.push_str("\nRespond with valid JSON matching the OUTPUT FORMAT specified in your instructions.");
  prompt
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::mock_user_profile;

  #[test]
  fn test_unknown_fields_are_omitted() {
    let prompt = build_workout_prompt(&UserProfile::default());
    assert!(!prompt.contains("Weight"));
    assert!(!prompt.contains("Training days"));
    assert!(prompt.contains("valid JSON"));
  }

  #[test]
  fn test_nutrition_prompt_includes_suggested_intake() {
    let profile = mock_user_profile();
    let suggested = MetabolicResult {
      bmr: 1700.0,
      tdee: 2635.0,
      target_intake: 2135.0,
    };
    let prompt = build_nutrition_prompt(&profile, Some(&suggested));
    assert!(prompt.contains("- Weight: 70.0 kg"));
    assert!(prompt.contains("Suggested intake: 2135 kcal"));
  }

  #[test]
  fn test_explicit_calories_win_over_suggestion() {
    let mut profile = mock_user_profile();
    profile.nutrition.daily_calories = Some(1900.0);
    let suggested = MetabolicResult {
      bmr: 1700.0,
      tdee: 2635.0,
      target_intake: 2135.0,
    };
    let prompt = build_nutrition_prompt(&profile, Some(&suggested));
    assert!(prompt.contains("Daily calories: 1900 kcal"));
    assert!(!prompt.contains("Suggested intake"));
  }

  #[test]
  fn test_system_prompts_describe_required_fields() {
    assert!(NUTRITION_SYSTEM_PROMPT.contains("weeklyMeals"));
    assert!(WORKOUT_SYSTEM_PROMPT.contains("workoutDays"));
  }
}
