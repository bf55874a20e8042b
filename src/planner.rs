//! Plan generation workflow: profile -> prompt -> AI text -> parsed plan -> store
//!
//! AI service failures abort generation and are returned to the caller.
//! An unusable response is not a failure; the parser substitutes a
//! deterministic plan and tags it as a fallback.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::MetabolicConfig;
use crate::llm::{AiServiceError, TextGenerator};
use crate::metabolic::{BmrFormula, MetabolicResult};
use crate::models::{NutritionPlan, UserProfile, WorkoutPlan};
use crate::plan_parser::{GeneratedPlan, PlanResponseParser};
use crate::prompts::{build_nutrition_prompt, build_workout_prompt, NUTRITION_SYSTEM_PROMPT, WORKOUT_SYSTEM_PROMPT};
use crate::store::{self, PlanStore, StoreError};

#[derive(Error, Debug)]
pub enum PlannerError {
  #[error(transparent)]
  Ai(#[from] AiServiceError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

pub struct PlanGenerator {
  generator: Arc<dyn TextGenerator>,
  store: Arc<dyn PlanStore>,
  parser: PlanResponseParser,
}

impl PlanGenerator {
  pub fn new(generator: Arc<dyn TextGenerator>, store: Arc<dyn PlanStore>, config: MetabolicConfig) -> Self {
    Self {
      generator,
      store,
      parser: PlanResponseParser::new(config),
    }
  }

  /// Generate and persist a 7-day meal plan
  pub async fn generate_nutrition(&self, profile: &UserProfile) -> Result<GeneratedPlan<NutritionPlan>, PlannerError> {
    let suggested = match MetabolicResult::for_profile(profile, BmrFormula::HarrisBenedict) {
      Ok(result) => Some(result),
      Err(e) => {
        debug!(reason = %e, "No calorie suggestion for prompt");
        None
      }
    };

    let prompt = build_nutrition_prompt(profile, suggested.as_ref());
    let text = self.generator.generate(NUTRITION_SYSTEM_PROMPT, &prompt).await?;
    let plan = self.parser.parse_nutrition(&text, profile);

    store::save_nutrition_plan(self.store.as_ref(), &plan).await?;
    info!(id = %plan.id, source = ?plan.source, "Generated nutrition plan");
    Ok(plan)
  }

  /// Generate and persist a weekly workout plan
  pub async fn generate_workout(&self, profile: &UserProfile) -> Result<GeneratedPlan<WorkoutPlan>, PlannerError> {
    let prompt = build_workout_prompt(profile);
    let text = self.generator.generate(WORKOUT_SYSTEM_PROMPT, &prompt).await?;
    let plan = self.parser.parse_workout(&text, profile);

    store::save_workout_plan(self.store.as_ref(), &plan).await?;
    info!(id = %plan.id, source = ?plan.source, "Generated workout plan");
    Ok(plan)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
