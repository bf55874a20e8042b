//! Deterministic fallback plans
//!
//! When AI text cannot be turned into a valid plan, the caller still gets a
//! complete one, synthesized from the profile alone. The same profile always
//! yields the same plan body.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::MetabolicConfig;
use crate::metabolic::{
  forecast, ActivityLevel, BmrFormula, BodyMetrics, EnergyDirection, MetabolicResult, WeightGoal,
};
use crate::models::{
  exercise_id_from_name, DayName, Exercise, Meal, NutritionPlan, UserProfile, WorkoutDay,
  WorkoutPlan,
};

/// Intake used when neither the profile nor the calculator can supply one
pub const DEFAULT_DAILY_CALORIES: f64 = 2000.0;
const DEFAULT_MEALS_PER_DAY: u32 = 3;
const DEFAULT_TRAINING_DAYS: u32 = 3;

/// ---------------------------------------------------------------------------
/// Nutrition
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MealKind {
  Breakfast,
  Lunch,
  Dinner,
  Snack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Diet {
  Vegan,
  Vegetarian,
  Omnivore,
}

struct MealSlot {
  label: &'static str,
  time: &'static str,
  kind: MealKind,
  share: f64,
}

struct MealTemplate {
  kind: MealKind,
  name: &'static str,
  description: &'static str,
  ingredients: &'static [&'static str],
  diet: Diet,
}

const fn slot(label: &'static str, time: &'static str, kind: MealKind, share: f64) -> MealSlot {
  MealSlot {
    label,
    time,
    kind,
    share,
  }
}

/// Calorie shares per meal count; each row sums to 1.0
fn meal_slots(meals_per_day: u32) -> &'static [MealSlot] {
  use MealKind::*;
  const TWO: &[MealSlot] = &[
    slot("Brunch", "10:00", Breakfast, 0.45),
    slot("Dinner", "18:30", Dinner, 0.55),
  ];
  const THREE: &[MealSlot] = &[
    slot("Breakfast", "08:00", Breakfast, 0.25),
    slot("Lunch", "12:30", Lunch, 0.40),
    slot("Dinner", "19:00", Dinner, 0.35),
  ];
  const FOUR: &[MealSlot] = &[
    slot("Breakfast", "08:00", Breakfast, 0.25),
    slot("Lunch", "12:30", Lunch, 0.35),
    slot("Afternoon Snack", "15:30", Snack, 0.10),
    slot("Dinner", "19:00", Dinner, 0.30),
  ];
  const FIVE: &[MealSlot] = &[
    slot("Breakfast", "07:30", Breakfast, 0.25),
    slot("Morning Snack", "10:30", Snack, 0.075),
    slot("Lunch", "13:00", Lunch, 0.30),
    slot("Afternoon Snack", "16:00", Snack, 0.075),
    slot("Dinner", "19:00", Dinner, 0.30),
  ];
  const SIX: &[MealSlot] = &[
    slot("Breakfast", "07:30", Breakfast, 0.20),
    slot("Morning Snack", "10:00", Snack, 0.10),
    slot("Lunch", "12:30", Lunch, 0.25),
    slot("Afternoon Snack", "15:30", Snack, 0.10),
    slot("Dinner", "18:30", Dinner, 0.25),
    slot("Evening Snack", "21:00", Snack, 0.10),
  ];
  match meal_slots_count(meals_per_day) {
    2 => TWO,
    4 => FOUR,
    5 => FIVE,
    6 => SIX,
    _ => THREE,
  }
}

fn meal_slots_count(requested: u32) -> u32 {
  requested.clamp(2, 6)
}

const MEAL_TEMPLATES: &[MealTemplate] = &[
  MealTemplate {
    kind: MealKind::Breakfast,
    name: "Oatmeal with Berries",
    description: "Rolled oats cooked in milk, topped with berries and seeds.",
    ingredients: &["rolled oats", "milk", "mixed berries", "chia seeds"],
    diet: Diet::Vegetarian,
  },
  MealTemplate {
    kind: MealKind::Breakfast,
    name: "Vegetable Omelette",
    description: "Three-egg omelette with peppers and spinach, wholegrain toast.",
    ingredients: &["eggs", "bell pepper", "spinach", "wholegrain bread"],
    diet: Diet::Vegetarian,
  },
  MealTemplate {
    kind: MealKind::Breakfast,
    name: "Tofu Scramble",
    description: "Spiced tofu scramble with tomatoes and avocado on toast.",
    ingredients: &["firm tofu", "tomato", "avocado", "wholegrain bread"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Breakfast,
    name: "Greek Yogurt Parfait",
    description: "Greek yogurt layered with granola, honey and fruit.",
    ingredients: &["greek yogurt", "granola", "honey", "banana"],
    diet: Diet::Vegetarian,
  },
  MealTemplate {
    kind: MealKind::Lunch,
    name: "Grilled Chicken Salad",
    description: "Mixed greens with grilled chicken, quinoa and olive oil dressing.",
    ingredients: &["chicken breast", "mixed greens", "quinoa", "olive oil"],
    diet: Diet::Omnivore,
  },
  MealTemplate {
    kind: MealKind::Lunch,
    name: "Chickpea Buddha Bowl",
    description: "Roasted chickpeas, brown rice and vegetables with tahini.",
    ingredients: &["chickpeas", "brown rice", "broccoli", "carrot", "tahini"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Lunch,
    name: "Turkey Wholegrain Wrap",
    description: "Wholegrain wrap with sliced turkey, hummus and salad.",
    ingredients: &["wholegrain tortilla", "turkey breast", "hummus", "lettuce", "tomato"],
    diet: Diet::Omnivore,
  },
  MealTemplate {
    kind: MealKind::Lunch,
    name: "Lentil Soup with Bread",
    description: "Red lentil and vegetable soup served with sourdough.",
    ingredients: &["red lentils", "carrot", "celery", "onion", "sourdough bread"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Dinner,
    name: "Baked Salmon with Vegetables",
    description: "Oven-baked salmon with sweet potato and green beans.",
    ingredients: &["salmon fillet", "sweet potato", "green beans", "lemon"],
    diet: Diet::Omnivore,
  },
  MealTemplate {
    kind: MealKind::Dinner,
    name: "Tofu Vegetable Stir-Fry",
    description: "Tofu and mixed vegetables stir-fried, served over rice.",
    ingredients: &["firm tofu", "mixed vegetables", "brown rice", "soy sauce"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Dinner,
    name: "Lean Beef and Rice Bowl",
    description: "Lean beef strips with rice, peppers and onions.",
    ingredients: &["lean beef", "white rice", "bell pepper", "onion"],
    diet: Diet::Omnivore,
  },
  MealTemplate {
    kind: MealKind::Dinner,
    name: "Bean Chili",
    description: "Three-bean chili with tomatoes and spices, topped with avocado.",
    ingredients: &["kidney beans", "black beans", "tomato", "onion", "avocado"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Snack,
    name: "Apple with Peanut Butter",
    description: "Sliced apple with a tablespoon of peanut butter.",
    ingredients: &["apple", "peanut butter"],
    diet: Diet::Vegan,
  },
  MealTemplate {
    kind: MealKind::Snack,
    name: "Cottage Cheese and Fruit",
    description: "Cottage cheese with pineapple chunks.",
    ingredients: &["cottage cheese", "pineapple"],
    diet: Diet::Vegetarian,
  },
  MealTemplate {
    kind: MealKind::Snack,
    name: "Hummus and Veggie Sticks",
    description: "Carrot and cucumber sticks with hummus.",
    ingredients: &["hummus", "carrot", "cucumber"],
    diet: Diet::Vegan,
  },
];

/// Strictest diet named in the preferences
fn required_diet(profile: &UserProfile) -> Diet {
  let prefs = profile.diet_preferences();
  if prefs.iter().any(|p| p.contains("vegan") || p.contains("plant")) {
    Diet::Vegan
  } else if prefs.iter().any(|p| p.contains("vegetarian")) {
    Diet::Vegetarian
  } else {
    Diet::Omnivore
  }
}

fn conflicts_with_allergy(template: &MealTemplate, allergies: &[String]) -> bool {
  template.ingredients.iter().any(|ingredient| {
    allergies
      .iter()
      .any(|allergen| ingredient.contains(allergen.as_str()) || allergen.contains(ingredient))
  })
}

fn templates_for(kind: MealKind, diet: Diet, allergies: &[String]) -> Vec<&'static MealTemplate> {
  MEAL_TEMPLATES
    .iter()
    .filter(|t| t.kind == kind && t.diet <= diet)
    .filter(|t| !conflicts_with_allergy(t, allergies))
    .collect()
}

fn round_to_ten(kcal: f64) -> f64 {
  (kcal / 10.0).round() * 10.0
}

/// Profile calories, else calculated target, else the default
fn resolve_daily_calories(profile: &UserProfile) -> (f64, Option<MetabolicResult>) {
  let calculated = BodyMetrics::from_profile(profile).ok().and_then(|metrics| {
    let level = profile
      .body
      .activity_level
      .as_deref()
      .and_then(|l| l.parse::<ActivityLevel>().ok())
      .unwrap_or(ActivityLevel::Moderate);
    MetabolicResult::compute(
      &metrics,
      BmrFormula::HarrisBenedict,
      level,
      WeightGoal::from_profile(profile),
    )
    .ok()
  });

  let daily = profile
    .nutrition
    .daily_calories
    .filter(|c| c.is_finite() && *c > 0.0)
    .or(calculated.map(|r| r.target_intake))
    .unwrap_or(DEFAULT_DAILY_CALORIES);

  (round_to_ten(daily), calculated)
}

fn weekly_goal_text(
  profile: &UserProfile,
  daily_calories: f64,
  calculated: Option<MetabolicResult>,
  config: &MetabolicConfig,
) -> String {
  let goal = WeightGoal::from_profile(profile);
  let Some(result) = calculated else {
    return "Eat consistently and build balanced habits".to_string();
  };
  if goal == WeightGoal::Maintain {
    return format!("Maintain current weight at about {:.0} kcal per day", daily_calories);
  }
  match forecast(daily_calories, result.tdee, 0.0, config) {
    Ok(f) if f.weekly_delta_kg != 0.0 => {
      let verb = match f.direction {
        EnergyDirection::Surplus => "Gain",
        EnergyDirection::Deficit => "Lose",
      };
      format!("{} about {:.2} kg per week", verb, f.weekly_delta_kg.abs())
    }
    _ => format!("Maintain current weight at about {:.0} kcal per day", daily_calories),
  }
}

fn nutrition_recommendations(profile: &UserProfile, diet: Diet) -> Vec<String> {
  let mut recs = vec![
    "Drink at least 2 liters of water per day".to_string(),
    "Include a source of protein in every meal".to_string(),
    "Prefer whole grains and vegetables over refined carbohydrates".to_string(),
  ];
  match diet {
    Diet::Vegan => recs.push("Consider a vitamin B12 supplement".to_string()),
    Diet::Vegetarian => recs.push("Combine legumes and grains for complete protein".to_string()),
    Diet::Omnivore => {}
  }
  let allergies = profile.allergies();
  if !allergies.is_empty() {
    recs.push(format!(
      "Always check labels for: {}",
      allergies.join(", ")
    ));
  }
  recs
}

/// Build a complete week of meals from the profile alone
pub fn fallback_nutrition_plan(profile: &UserProfile, config: &MetabolicConfig) -> NutritionPlan {
  let (daily_calories, calculated) = resolve_daily_calories(profile);
  let meals_per_day =
    meal_slots_count(profile.nutrition.meals_per_day.unwrap_or(DEFAULT_MEALS_PER_DAY));
  let diet = required_diet(profile);
  let allergies = profile.allergies();
  let slots = meal_slots(meals_per_day);

  let mut weekly_meals = BTreeMap::new();
  for day in DayName::ALL {
    let meals = slots
      .iter()
      .enumerate()
      .map(|(slot_idx, slot)| {
        let calories = round_to_ten(daily_calories * slot.share);
        let options = templates_for(slot.kind, diet, &allergies);
        match options.get((day.index() + slot_idx) % options.len().max(1)) {
          Some(template) => Meal {
            name: template.name.to_string(),
            time: slot.time.to_string(),
            calories,
            description: format!("{} {}", slot.label, template.description.to_lowercase()),
            ingredients: template.ingredients.iter().map(|i| i.to_string()).collect(),
          },
          None => Meal {
            name: slot.label.to_string(),
            time: slot.time.to_string(),
            calories,
            description: "Choose a meal that fits your dietary restrictions".to_string(),
            ingredients: vec![],
          },
        }
      })
      .collect();
    weekly_meals.insert(day, meals);
  }

  NutritionPlan {
    daily_calories,
    meals_per_day,
    weekly_goal: weekly_goal_text(profile, daily_calories, calculated, config),
    weekly_meals,
    recommendations: nutrition_recommendations(profile, diet),
  }
}

/// ---------------------------------------------------------------------------
/// Workout
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitnessLevel {
  Beginner,
  Intermediate,
  Advanced,
}

impl FitnessLevel {
  fn from_profile(profile: &UserProfile) -> Self {
    match profile.fitness.level.as_deref().map(str::to_lowercase) {
      Some(l) if l.contains("advanced") || l.contains("expert") => FitnessLevel::Advanced,
      Some(l) if l.contains("intermediate") => FitnessLevel::Intermediate,
      _ => FitnessLevel::Beginner,
    }
  }

  fn label(&self) -> &'static str {
    match self {
      FitnessLevel::Beginner => "Beginner",
      FitnessLevel::Intermediate => "Intermediate",
      FitnessLevel::Advanced => "Advanced",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainingFocus {
  Strength,
  Hypertrophy,
  Endurance,
  General,
}

impl TrainingFocus {
  /// First matching goal wins
  fn from_profile(profile: &UserProfile) -> Self {
    for goal in profile.fitness_goals() {
      if goal.contains("strength") || goal.contains("strong") || goal.contains("power") {
        return TrainingFocus::Strength;
      }
      if goal.contains("muscle") || goal.contains("hypertrophy") || goal.contains("bulk") {
        return TrainingFocus::Hypertrophy;
      }
      if goal.contains("endurance")
        || goal.contains("cardio")
        || goal.contains("weight loss")
        || goal.contains("lose")
        || goal.contains("fat")
      {
        return TrainingFocus::Endurance;
      }
    }
    TrainingFocus::General
  }

  fn label(&self) -> &'static str {
    match self {
      TrainingFocus::Strength => "Strength",
      TrainingFocus::Hypertrophy => "Hypertrophy",
      TrainingFocus::Endurance => "Conditioning",
      TrainingFocus::General => "General Fitness",
    }
  }

  /// (base sets, rep range, rest)
  fn prescription(&self) -> (u32, &'static str, &'static str) {
    match self {
      TrainingFocus::Strength => (4, "4-6", "180s"),
      TrainingFocus::Hypertrophy => (3, "8-12", "90s"),
      TrainingFocus::Endurance => (3, "12-15", "45s"),
      TrainingFocus::General => (3, "8-12", "60s"),
    }
  }
}

struct DayTemplate {
  name: &'static str,
  exercises: &'static [(&'static str, &'static [&'static str])],
}

const FULL_BODY_A: DayTemplate = DayTemplate {
  name: "Full Body A",
  exercises: &[
    ("Goblet Squat", &["quadriceps", "glutes"]),
    ("Push-Up", &["chest", "triceps"]),
    ("Dumbbell Row", &["back", "biceps"]),
    ("Romanian Deadlift", &["hamstrings", "glutes"]),
    ("Plank", &["core"]),
  ],
};

const FULL_BODY_B: DayTemplate = DayTemplate {
  name: "Full Body B",
  exercises: &[
    ("Reverse Lunge", &["quadriceps", "glutes"]),
    ("Dumbbell Shoulder Press", &["shoulders", "triceps"]),
    ("Lat Pulldown", &["back", "biceps"]),
    ("Glute Bridge", &["glutes", "hamstrings"]),
    ("Dead Bug", &["core"]),
  ],
};

const PUSH: DayTemplate = DayTemplate {
  name: "Push",
  exercises: &[
    ("Bench Press", &["chest", "triceps", "shoulders"]),
    ("Overhead Press", &["shoulders", "triceps"]),
    ("Incline Dumbbell Press", &["chest", "shoulders"]),
    ("Triceps Pushdown", &["triceps"]),
  ],
};

const PULL: DayTemplate = DayTemplate {
  name: "Pull",
  exercises: &[
    ("Deadlift", &["back", "hamstrings", "glutes"]),
    ("Pull-Up", &["back", "biceps"]),
    ("Seated Cable Row", &["back", "biceps"]),
    ("Biceps Curl", &["biceps"]),
  ],
};

const LEGS: DayTemplate = DayTemplate {
  name: "Legs",
  exercises: &[
    ("Back Squat", &["quadriceps", "glutes"]),
    ("Romanian Deadlift", &["hamstrings", "glutes"]),
    ("Leg Press", &["quadriceps"]),
    ("Standing Calf Raise", &["calves"]),
  ],
};

const UPPER: DayTemplate = DayTemplate {
  name: "Upper Body",
  exercises: &[
    ("Bench Press", &["chest", "triceps", "shoulders"]),
    ("Seated Cable Row", &["back", "biceps"]),
    ("Overhead Press", &["shoulders", "triceps"]),
    ("Lat Pulldown", &["back", "biceps"]),
  ],
};

const LOWER: DayTemplate = DayTemplate {
  name: "Lower Body",
  exercises: &[
    ("Back Squat", &["quadriceps", "glutes"]),
    ("Romanian Deadlift", &["hamstrings", "glutes"]),
    ("Reverse Lunge", &["quadriceps", "glutes"]),
    ("Plank", &["core"]),
  ],
};

fn split_for(days: u32) -> Vec<&'static DayTemplate> {
  match days.clamp(1, 6) {
    1 => vec![&FULL_BODY_A],
    2 => vec![&FULL_BODY_A, &FULL_BODY_B],
    3 => vec![&PUSH, &PULL, &LEGS],
    4 => vec![&UPPER, &LOWER, &UPPER, &LOWER],
    5 => vec![&PUSH, &PULL, &LEGS, &UPPER, &LOWER],
    _ => vec![&PUSH, &PULL, &LEGS, &PUSH, &PULL, &LEGS],
  }
}

/// Build a training week from fitness level, goals and available days
pub fn fallback_workout_plan(profile: &UserProfile) -> WorkoutPlan {
  let level = FitnessLevel::from_profile(profile);
  let focus = TrainingFocus::from_profile(profile);
  let training_days = profile
    .fitness
    .training_days_per_week
    .unwrap_or(DEFAULT_TRAINING_DAYS)
    .clamp(1, 6);

  let (base_sets, reps, rest) = focus.prescription();
  let sets = match level {
    FitnessLevel::Beginner => base_sets.saturating_sub(1).max(2),
    FitnessLevel::Intermediate => base_sets,
    FitnessLevel::Advanced => base_sets + 1,
  };

  let workout_days = split_for(training_days)
    .into_iter()
    .enumerate()
    .map(|(idx, template)| WorkoutDay {
      id: format!("day-{}", idx + 1),
      name: format!("Day {}: {}", idx + 1, template.name),
      exercises: template
        .exercises
        .iter()
        .map(|(name, muscles)| Exercise {
          id: exercise_id_from_name(name),
          name: name.to_string(),
          sets,
          reps: reps.to_string(),
          rest_time: rest.to_string(),
          muscle_groups: muscles.iter().map(|m| m.to_string()).collect(),
        })
        .collect(),
    })
    .collect();

  WorkoutPlan {
    id: String::new(),
    name: format!("{} {} Plan", level.label(), focus.label()),
    description: format!(
      "{} training days per week, {} sets of {} reps with {} rest.",
      training_days, sets, reps, rest
    ),
    created_at: Utc::now(),
    workout_days,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
