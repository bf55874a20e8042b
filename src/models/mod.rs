pub mod lenient;
pub mod nutrition;
pub mod profile;
pub mod workout;

pub use nutrition::{DayName, Meal, NutritionPlan};
pub use profile::{BodyProfile, FitnessProfile, NutritionProfile, TravelProfile, UserProfile};
pub use workout::{
  exercise_id_from_name, Exercise, ExerciseLog, SetLog, WorkoutDay, WorkoutPlan, WorkoutSession,
};
