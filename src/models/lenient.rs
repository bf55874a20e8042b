//! Serde helpers for numeric fields that arrive from generated text.
//!
//! Plan payloads written by the AI service are loosely typed: calories come
//! back as `450`, `"450"` or `"450 kcal"`, rep ranges as `10` or `"8-12"`.
//! These helpers accept either form and normalize to the typed field.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Pull the leading number out of a string like "450 kcal" or "~1,800".
/// A range such as "400-500 kcal" yields its lower bound.
fn leading_number(s: &str) -> Option<f64> {
  let mut cleaned = String::new();
  for c in s.trim().trim_start_matches('~').chars().filter(|c| *c != ',') {
    match c {
      '-' if cleaned.is_empty() => cleaned.push(c),
      '0'..='9' | '.' => cleaned.push(c),
      _ => break,
    }
  }
  cleaned.parse().ok()
}

fn value_to_f64(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => leading_number(s),
    _ => None,
  }
}

pub fn f64_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  value_to_f64(&value).ok_or_else(|| de::Error::custom(format!("expected a number, got {}", value)))
}

pub fn u32_from_any<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
  D: Deserializer<'de>,
{
  let n = f64_from_any(deserializer)?;
  if n < 0.0 || !n.is_finite() {
    return Err(de::Error::custom(format!("expected a non-negative count, got {}", n)));
  }
  Ok(n.round() as u32)
}

/// Accepts `10`, `"10"` or `"8-12"` and keeps the textual form.
pub fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(n.to_string()),
    Value::Null => Ok(String::new()),
    other => Err(de::Error::custom(format!("expected a string, got {}", other))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;

  #[derive(Deserialize)]
  struct Row {
    #[serde(deserialize_with = "f64_from_any")]
    calories: f64,
    #[serde(deserialize_with = "string_from_any")]
    reps: String,
    #[serde(deserialize_with = "u32_from_any")]
    sets: u32,
  }

  #[test]
  fn test_accepts_numbers_and_strings() {
    let p: Row = serde_json::from_str(r#"{"calories": "450 kcal", "reps": 10, "sets": "3"}"#).unwrap();
    assert_eq!(p.calories, 450.0);
    assert_eq!(p.reps, "10");
    assert_eq!(p.sets, 3);

    let p: Row = serde_json::from_str(r#"{"calories": 1800.5, "reps": "8-12", "sets": 4}"#).unwrap();
    assert_eq!(p.calories, 1800.5);
    assert_eq!(p.reps, "8-12");
    assert_eq!(p.sets, 4);
  }

  #[test]
  fn test_thousands_separator() {
    assert_eq!(leading_number("~2,100 kcal"), Some(2100.0));
    assert_eq!(leading_number("lots"), None);
  }

  #[test]
  fn test_range_yields_lower_bound() {
    assert_eq!(leading_number("400-500 kcal"), Some(400.0));
    assert_eq!(leading_number("~1,800-2,000"), Some(1800.0));
    assert_eq!(leading_number("-5"), Some(-5.0));
    assert_eq!(leading_number("-"), None);
  }

  #[test]
  fn test_rejects_non_numeric() {
    let result: Result<Row, _> =
      serde_json::from_str(r#"{"calories": "plenty", "reps": "8", "sets": 3}"#);
    assert!(result.is_err());
  }
}
