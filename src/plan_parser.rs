//! Tolerant ingestion of AI-generated plan text
//!
//! Raw text from the AI service goes through:
//!
//! 1. code-fence stripping
//! 2. locating the first `{` .. last `}` span
//! 3. strict JSON parse, then (only if that fails) a regex repair pass
//! 4. validation of the required top-level field for the plan shape
//! 5. on any failure, a deterministic fallback built from the profile
//!
//! Whichever path produced it, the result is stamped with a fresh id and
//! timestamp and carries the profile snapshot that produced it. `ParseError`
//! never leaves this module; callers always get a usable plan.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MetabolicConfig;
use crate::fallback::{fallback_nutrition_plan, fallback_workout_plan};
use crate::models::{DayName, NutritionPlan, UserProfile, WorkoutPlan};

/// ---------------------------------------------------------------------------
/// Provenance and Envelope
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSource {
  /// Parsed from the AI service response
  Ai,
  /// Synthesized from the profile because the response was unusable
  Fallback { reason: String },
}

/// A plan plus where it came from and the profile that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan<P> {
  pub id: String,
  pub created_at: DateTime<Utc>,
  pub source: PlanSource,
  pub profile: UserProfile,
  pub plan: P,
}

impl<P> GeneratedPlan<P> {
  pub fn is_fallback(&self) -> bool {
    matches!(self.source, PlanSource::Fallback { .. })
  }
}

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

/// Why a response could not be used. Always absorbed into the fallback path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
  #[error("no JSON object found in response")]
  NoJsonObject,

  #[error("invalid JSON: {0}")]
  Json(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("schema mismatch: {0}")]
  Schema(String),
}

/// ---------------------------------------------------------------------------
/// Plan Shapes
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
  Nutrition,
  Workout,
}

impl PlanKind {
  pub fn required_field(&self) -> &'static str {
    match self {
      PlanKind::Nutrition => "weeklyMeals",
      PlanKind::Workout => "workoutDays",
    }
  }
}

/// A plan type the parser knows how to validate and synthesize
pub trait PlanShape: Sized {
  const KIND: PlanKind;

  /// Validate and convert a parsed JSON object
  fn from_payload(payload: Map<String, Value>) -> Result<Self, ParseError>;

  /// Deterministic plan from the profile alone
  fn fallback(profile: &UserProfile, config: &MetabolicConfig) -> Self;

  /// Apply the generated id and timestamp to the plan body, if it has them
  fn stamp(&mut self, _id: &str, _created_at: DateTime<Utc>) {}
}

fn take_required(
  payload: &mut Map<String, Value>,
  field: &'static str,
) -> Result<Value, ParseError> {
  match payload.remove(field) {
    Some(Value::Null) | None => Err(ParseError::MissingField(field)),
    Some(value) => Ok(value),
  }
}

impl PlanShape for NutritionPlan {
  const KIND: PlanKind = PlanKind::Nutrition;

  fn from_payload(mut payload: Map<String, Value>) -> Result<Self, ParseError> {
    let field = Self::KIND.required_field();
    let Value::Object(raw_days) = take_required(&mut payload, field)? else {
      return Err(ParseError::Schema(format!("{} must be an object", field)));
    };

    // Canonicalize day keys; keys that are not days are dropped, null days
    // mean no meals, and keys naming the same day are merged in order
    let mut days = Map::new();
    for (key, meals) in raw_days {
      let Ok(day) = key.parse::<DayName>() else {
        warn!(key = %key, "Ignoring unrecognized day in weeklyMeals");
        continue;
      };
      if meals.is_null() {
        debug!(key = %key, "Day has no meals");
        continue;
      }
      let Some(existing) = days.get_mut(day.as_str()) else {
        days.insert(day.as_str().to_string(), meals);
        continue;
      };
      match (existing, meals) {
        (Value::Array(existing), Value::Array(more)) => {
          warn!(key = %key, day = %day, "Merging meals from duplicate day key");
          existing.extend(more);
        }
        (_, other) => {
          return Err(ParseError::Schema(format!(
            "conflicting entries for {} in weeklyMeals: {}",
            day, other
          )));
        }
      }
    }
    payload.insert(field.to_string(), Value::Object(days));

    let mut plan: NutritionPlan =
      serde_json::from_value(Value::Object(payload)).map_err(|e| ParseError::Schema(e.to_string()))?;

    let planned_days: Vec<f64> = DayName::ALL
      .iter()
      .filter(|d| !plan.meals_for(**d).is_empty())
      .map(|d| plan.day_calories(*d))
      .collect();
    if planned_days.is_empty() {
      return Err(ParseError::Schema("no meals planned for any day".to_string()));
    }

    if plan.daily_calories <= 0.0 {
      plan.daily_calories = (planned_days.iter().sum::<f64>() / planned_days.len() as f64).round();
    }
    if plan.meals_per_day == 0 {
      plan.meals_per_day = plan.weekly_meals.values().map(Vec::len).max().unwrap_or(0) as u32;
    }

    Ok(plan)
  }

  fn fallback(profile: &UserProfile, config: &MetabolicConfig) -> Self {
    fallback_nutrition_plan(profile, config)
  }
}

impl PlanShape for WorkoutPlan {
  const KIND: PlanKind = PlanKind::Workout;

  fn from_payload(mut payload: Map<String, Value>) -> Result<Self, ParseError> {
    let field = Self::KIND.required_field();
    let days = take_required(&mut payload, field)?;
    if !days.is_array() {
      return Err(ParseError::Schema(format!("{} must be an array", field)));
    }
    payload.insert(field.to_string(), days);
    payload
      .entry("name")
      .or_insert_with(|| Value::String("Workout Plan".to_string()));

    let mut plan: WorkoutPlan =
      serde_json::from_value(Value::Object(payload)).map_err(|e| ParseError::Schema(e.to_string()))?;

    if plan.workout_days.iter().all(|d| d.exercises.is_empty()) {
      return Err(ParseError::Schema("no exercises in any workout day".to_string()));
    }

    plan.assign_missing_ids();
    Ok(plan)
  }

  fn fallback(profile: &UserProfile, _config: &MetabolicConfig) -> Self {
    fallback_workout_plan(profile)
  }

  fn stamp(&mut self, id: &str, created_at: DateTime<Utc>) {
    self.id = id.to_string();
    self.created_at = created_at;
  }
}

/// ---------------------------------------------------------------------------
/// Text Extraction
/// ---------------------------------------------------------------------------

static FENCED_BLOCK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("valid regex"));

static OPENING_FENCE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid regex"));

static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?P<pre>[{\[,:]\s*)'(?P<body>(?:[^'\\]|\\.)*)'"#).expect("valid regex")
});

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?P<pre>[{,]\s*)(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid regex")
});

static TRAILING_COMMA: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r",\s*(?P<close>[}\]])").expect("valid regex"));

/// Remove markdown code fences. A fenced block anywhere in the text wins;
/// an unterminated opening fence is dropped.
pub fn strip_code_fences(text: &str) -> &str {
  let trimmed = text.trim();
  if let Some(caps) = FENCED_BLOCK.captures(trimmed) {
    if let Some(body) = caps.get(1) {
      return body.as_str().trim();
    }
  }
  match OPENING_FENCE.find(trimmed) {
    Some(fence) => trimmed[fence.end()..].trim(),
    None => trimmed,
  }
}

/// First `{` through last `}`; responses are a single top-level object
pub fn locate_object(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  (end > start).then(|| &text[start..=end])
}

/// Best-effort repair of loosely quoted JSON. Can corrupt string content
/// containing apostrophes, so it only runs after a strict parse has failed.
pub fn repair_json(span: &str) -> String {
  let quoted = SINGLE_QUOTED.replace_all(span, |caps: &Captures| {
    let body = caps["body"].replace("\\'", "'").replace('"', "\\\"");
    format!("{}\"{}\"", &caps["pre"], body)
  });
  let keyed = UNQUOTED_KEY.replace_all(&quoted, "$pre\"$key\":");
  TRAILING_COMMA.replace_all(&keyed, "$close").into_owned()
}

fn parse_object(span: &str) -> Result<Map<String, Value>, ParseError> {
  let value = match serde_json::from_str::<Value>(span) {
    Ok(value) => value,
    Err(strict_err) => {
      debug!(error = %strict_err, "Strict JSON parse failed, attempting repair");
      serde_json::from_str::<Value>(&repair_json(span)).map_err(|e| ParseError::Json(e.to_string()))?
    }
  };
  match value {
    Value::Object(map) => Ok(map),
    _ => Err(ParseError::NoJsonObject),
  }
}

/// Run the full extraction pipeline without falling back
pub fn extract_plan<P: PlanShape>(raw: &str) -> Result<P, ParseError> {
  let stripped = strip_code_fences(raw);
  let span = locate_object(stripped).ok_or(ParseError::NoJsonObject)?;
  P::from_payload(parse_object(span)?)
}

/// ---------------------------------------------------------------------------
/// Parser
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PlanResponseParser {
  config: MetabolicConfig,
}

impl PlanResponseParser {
  pub fn new(config: MetabolicConfig) -> Self {
    Self { config }
  }

  /// Parse AI text into a plan, or fall back. Never fails.
  pub fn parse<P: PlanShape>(&self, raw: &str, profile: &UserProfile) -> GeneratedPlan<P> {
    match extract_plan::<P>(raw) {
      Ok(plan) => self.stamp(plan, PlanSource::Ai, profile),
      Err(err) => {
        warn!(kind = ?P::KIND, reason = %err, "AI response unusable, using fallback plan");
        self.fallback(profile, err.to_string())
      }
    }
  }

  /// Deterministic plan from the profile, tagged with why it was used
  pub fn fallback<P: PlanShape>(&self, profile: &UserProfile, reason: String) -> GeneratedPlan<P> {
    let plan = P::fallback(profile, &self.config);
    self.stamp(plan, PlanSource::Fallback { reason }, profile)
  }

  pub fn parse_nutrition(&self, raw: &str, profile: &UserProfile) -> GeneratedPlan<NutritionPlan> {
    self.parse(raw, profile)
  }

  pub fn parse_workout(&self, raw: &str, profile: &UserProfile) -> GeneratedPlan<WorkoutPlan> {
    self.parse(raw, profile)
  }

  fn stamp<P: PlanShape>(&self, mut plan: P, source: PlanSource, profile: &UserProfile) -> GeneratedPlan<P> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    plan.stamp(&id, created_at);
    GeneratedPlan {
      id,
      created_at,
      source,
      profile: profile.clone(),
      plan,
    }
  }
}

/// Group count of meals per canonical day, for display
pub fn meals_per_day_summary(plan: &NutritionPlan) -> BTreeMap<DayName, usize> {
  DayName::ALL
    .iter()
    .map(|d| (*d, plan.meals_for(*d).len()))
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
