pub mod metabolic;
pub mod plans;
pub mod progress;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::UserProfile;
use crate::store::{self, PlanStore};

/// Shared state for command handlers
pub struct AppState {
  pub store: Arc<dyn PlanStore>,
  pub config: AppConfig,
}

impl AppState {
  pub fn new(store: Arc<dyn PlanStore>, config: AppConfig) -> Self {
    Self { store, config }
  }
}

pub async fn get_profile(state: &AppState) -> Result<UserProfile, String> {
  store::load_profile(state.store.as_ref())
    .await
    .map_err(|e| format!("Failed to load profile: {}", e))
}

/// Merge known fields into the stored profile and return the result
pub async fn update_profile(state: &AppState, update: UserProfile) -> Result<UserProfile, String> {
  let mut profile = get_profile(state).await?;
  profile.merge(update);

  store::save_profile(state.store.as_ref(), &profile)
    .await
    .map_err(|e| format!("Failed to save profile: {}", e))?;

  Ok(profile)
}
