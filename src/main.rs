use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner_engine::commands::{self, metabolic, plans, progress, AppState};
use planner_engine::config::AppConfig;
use planner_engine::db;
use planner_engine::metabolic::{BmrFormula, WeightGoal};
use planner_engine::models::{BodyProfile, FitnessProfile, NutritionProfile, UserProfile, WorkoutSession};
use planner_engine::plan_parser::meals_per_day_summary;
use planner_engine::store::SqliteStore;

#[derive(Parser)]
#[command(name = "planner", about = "Diet and training plan generation with progress analytics")]
struct Cli {
  /// SQLite database file (overrides PLANNER_DB_PATH)
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Calculate BMR, TDEE and target intake
  Bmr {
    #[arg(long)]
    weight: f64,
    #[arg(long)]
    height: f64,
    #[arg(long)]
    age: u32,
    #[arg(long)]
    gender: String,
    #[arg(long, default_value = "moderate")]
    activity: String,
    #[arg(long, value_enum, default_value_t = FormulaArg::Mifflin)]
    formula: FormulaArg,
    #[arg(long, value_enum)]
    goal: Option<GoalArg>,
  },
  /// Forecast weekly weight change for a daily intake
  Forecast {
    /// Daily intake in kcal
    #[arg(long)]
    intake: f64,
    /// Maintenance kcal; defaults to the profile's TDEE
    #[arg(long)]
    maintenance: Option<f64>,
    /// Weight to gain or lose in kg; defaults to the profile's goal gap
    #[arg(long)]
    goal_delta: Option<f64>,
  },
  /// Stored profile
  Profile {
    #[command(subcommand)]
    command: ProfileCommands,
  },
  /// Plan generation
  Plan {
    #[command(subcommand)]
    command: PlanCommands,
  },
  /// Saved travel plans
  Travel {
    #[command(subcommand)]
    command: TravelCommands,
  },
  /// Workout session logging
  Session {
    #[command(subcommand)]
    command: SessionCommands,
  },
  /// Volume history for one exercise
  Progress {
    exercise_id: String,
  },
  /// Compare a stored session with earlier sessions
  Compare {
    session_id: String,
  },
}

#[derive(Subcommand)]
enum ProfileCommands {
  /// Print the stored profile
  Show,
  /// Print BMR, TDEE and suggested intake for the stored profile
  Needs,
  /// Update profile fields; omitted flags keep their stored value
  Set {
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    activity: Option<String>,
    #[arg(long)]
    goal_weight: Option<f64>,
    #[arg(long)]
    level: Option<String>,
    /// Repeat for several goals
    #[arg(long = "goal")]
    goals: Vec<String>,
    #[arg(long)]
    days: Option<u32>,
    #[arg(long)]
    calories: Option<f64>,
    #[arg(long)]
    meals: Option<u32>,
    /// Repeat for several preferences
    #[arg(long = "diet")]
    diet: Vec<String>,
    /// Repeat for several allergies
    #[arg(long = "allergy")]
    allergies: Vec<String>,
  },
}

#[derive(Subcommand)]
enum PlanCommands {
  /// Generate a 7-day meal plan
  Nutrition {
    /// Skip the AI service and use the built-in plan
    #[arg(long)]
    offline: bool,
  },
  /// Generate a weekly workout plan
  Workout {
    #[arg(long)]
    offline: bool,
  },
  /// List stored plans
  List,
}

#[derive(Subcommand)]
enum TravelCommands {
  /// Print saved travel plans
  List,
  /// Save a travel plan from a JSON file ("-" for stdin)
  Save { path: PathBuf },
}

#[derive(Subcommand)]
enum SessionCommands {
  /// Log a finished session from a JSON file ("-" for stdin)
  Log { path: PathBuf },
  /// Compare a session JSON file with stored history without saving it
  Check { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormulaArg {
  Mifflin,
  Harris,
}

impl From<FormulaArg> for BmrFormula {
  fn from(arg: FormulaArg) -> Self {
    match arg {
      FormulaArg::Mifflin => BmrFormula::MifflinStJeor,
      FormulaArg::Harris => BmrFormula::HarrisBenedict,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalArg {
  Lose,
  Maintain,
  Gain,
}

impl From<GoalArg> for WeightGoal {
  fn from(arg: GoalArg) -> Self {
    match arg {
      GoalArg::Lose => WeightGoal::Lose,
      GoalArg::Maintain => WeightGoal::Maintain,
      GoalArg::Gain => WeightGoal::Gain,
    }
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T, Box<dyn std::error::Error>> {
  let raw = if path.as_os_str() == "-" {
    std::io::read_to_string(std::io::stdin())?
  } else {
    std::fs::read_to_string(path)?
  };
  Ok(serde_json::from_str(&raw)?)
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
  (!items.is_empty()).then_some(items)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();

  // Pure calculation, no storage needed
  if let Commands::Bmr {
    weight,
    height,
    age,
    gender,
    activity,
    formula,
    goal,
  } = &cli.command
  {
    let request = metabolic::MetabolicRequest {
      weight_kg: *weight,
      height_cm: *height,
      age: *age,
      gender: gender.clone(),
      activity_level: activity.clone(),
      formula: (*formula).into(),
      goal: goal.map(Into::into),
    };
    return print_json(&metabolic::calculate_metabolics(&request)?);
  }

  let mut config = AppConfig::from_env()?;
  if let Some(path) = cli.db {
    config.db_path = path;
  }
  let pool = db::initialize_db(&config.db_path).await?;
  let state = AppState::new(Arc::new(SqliteStore::new(pool)), config);

  match cli.command {
    Commands::Bmr { .. } => {}
    Commands::Forecast {
      intake,
      maintenance,
      goal_delta,
    } => {
      let request = metabolic::ForecastRequest {
        intake_calories: intake,
        maintenance_calories: maintenance,
        goal_delta_kg: goal_delta,
      };
      let result = metabolic::forecast_weight(&state, &request).await?;
      print_json(&result)?;
      println!("Time to goal: {}", result.weeks_to_goal);
    }
    Commands::Profile { command } => match command {
      ProfileCommands::Show => print_json(&commands::get_profile(&state).await?)?,
      ProfileCommands::Needs => print_json(&metabolic::profile_metabolics(&state).await?)?,
      ProfileCommands::Set {
        weight,
        height,
        age,
        gender,
        activity,
        goal_weight,
        level,
        goals,
        days,
        calories,
        meals,
        diet,
        allergies,
      } => {
        let update = UserProfile {
          body: BodyProfile {
            weight_kg: weight,
            height_cm: height,
            age,
            gender,
            activity_level: activity,
            goal_weight_kg: goal_weight,
          },
          fitness: FitnessProfile {
            level,
            goals: non_empty(goals),
            training_days_per_week: days,
          },
          nutrition: NutritionProfile {
            daily_calories: calories,
            meals_per_day: meals,
            diet_preferences: non_empty(diet),
            allergies: non_empty(allergies),
          },
          ..UserProfile::default()
        };
        print_json(&commands::update_profile(&state, update).await?)?;
      }
    },
    Commands::Plan { command } => match command {
      PlanCommands::Nutrition { offline } => {
        let plan = plans::generate_nutrition_plan(&state, offline).await?;
        print_json(&plan)?;
        for (day, count) in meals_per_day_summary(&plan.plan) {
          println!("{}: {} meals, {:.0} kcal", day, count, plan.plan.day_calories(day));
        }
      }
      PlanCommands::Workout { offline } => print_json(&plans::generate_workout_plan(&state, offline).await?)?,
      PlanCommands::List => {
        for plan in plans::list_nutrition_plans(&state).await? {
          println!("nutrition {} {} {:?}", plan.id, plan.created_at, plan.source);
        }
        for plan in plans::list_workout_plans(&state).await? {
          println!("workout   {} {} {:?} {}", plan.id, plan.created_at, plan.source, plan.plan.name);
        }
      }
    },
    Commands::Travel { command } => match command {
      TravelCommands::List => print_json(&plans::list_travel_plans(&state).await?)?,
      TravelCommands::Save { path } => {
        plans::save_travel_plan(&state, read_json(&path)?).await?;
        println!("Saved travel plan");
      }
    },
    Commands::Session { command } => match command {
      SessionCommands::Log { path } => {
        let session: WorkoutSession = read_json(&path)?;
        let id = session.id.clone();
        progress::log_session(&state, session).await?;
        println!("Logged session {}", id);
      }
      SessionCommands::Check { path } => {
        let session: WorkoutSession = read_json(&path)?;
        print_json(&progress::compare_live_session(&state, &session).await?)?;
      }
    },
    Commands::Progress { exercise_id } => {
      print_json(&progress::exercise_progress(&state, &exercise_id).await?)?;
    }
    Commands::Compare { session_id } => {
      let comparison = progress::compare_stored_session(&state, &session_id).await?;
      for entry in &comparison {
        println!("{}: {:.0} ({})", entry.exercise_name, entry.current_volume, entry.trend);
      }
    }
  }

  Ok(())
}
