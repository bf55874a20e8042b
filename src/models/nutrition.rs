use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::lenient;

/// ---------------------------------------------------------------------------
/// Day Names
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayName {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl DayName {
  pub const ALL: [DayName; 7] = [
    DayName::Monday,
    DayName::Tuesday,
    DayName::Wednesday,
    DayName::Thursday,
    DayName::Friday,
    DayName::Saturday,
    DayName::Sunday,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      DayName::Monday => "Monday",
      DayName::Tuesday => "Tuesday",
      DayName::Wednesday => "Wednesday",
      DayName::Thursday => "Thursday",
      DayName::Friday => "Friday",
      DayName::Saturday => "Saturday",
      DayName::Sunday => "Sunday",
    }
  }

  /// Zero-based position in the week, Monday first
  pub fn index(&self) -> usize {
    DayName::ALL.iter().position(|d| d == self).unwrap_or(0)
  }
}

impl std::fmt::Display for DayName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for DayName {
  type Err = String;

  /// Case-insensitive; accepts full names and three-letter abbreviations
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_lowercase();
    DayName::ALL
      .iter()
      .find(|d| {
        let name = d.as_str().to_lowercase();
        lower == name || (lower.len() == 3 && name.starts_with(&lower))
      })
      .copied()
      .ok_or_else(|| format!("Unknown day name: {}", s))
  }
}

impl Serialize for DayName {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for DayName {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// ---------------------------------------------------------------------------
/// Meals and Plans
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
  pub name: String,
  #[serde(default)]
  pub time: String,
  #[serde(deserialize_with = "lenient::f64_from_any")]
  pub calories: f64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
  #[serde(default, deserialize_with = "lenient::f64_from_any")]
  pub daily_calories: f64,
  #[serde(default, deserialize_with = "lenient::u32_from_any")]
  pub meals_per_day: u32,
  #[serde(default)]
  pub weekly_goal: String,
  /// Days without an entry have no meals planned
  pub weekly_meals: BTreeMap<DayName, Vec<Meal>>,
  #[serde(default)]
  pub recommendations: Vec<String>,
}

impl NutritionPlan {
  /// Meals planned for a day; empty when the day has no entry
  pub fn meals_for(&self, day: DayName) -> &[Meal] {
    self.weekly_meals.get(&day).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Sum of meal calories for one day
  pub fn day_calories(&self, day: DayName) -> f64 {
    self.meals_for(day).iter().map(|m| m.calories).sum()
  }
}
