pub mod commands;
pub mod config;
pub mod db;
pub mod fallback;
pub mod llm;
pub mod metabolic;
pub mod models;
pub mod plan_parser;
pub mod planner;
pub mod prompts;
pub mod store;
pub mod workout_analytics;

#[cfg(test)]
pub mod test_utils;
