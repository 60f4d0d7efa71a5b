//! Default food and exercise catalog
//!
//! Written by migration v2 so a new practice starts with a usable catalog.
//! Ids are fixed (`food-N`, `exercise-N`).

use rusqlite::Connection;

use crate::calc::Goal::{self, *};
use crate::models::{Exercise, ExerciseKind, ExerciseLevel, FoodCategory, FoodItem, Nutrition};

use super::connection::DbResult;
use super::store;

use ExerciseLevel::{Advanced, Beginner, Intermediate};

/// name, category, goals, portion g, kcal, protein, carbs, fat, fiber
type FoodRow = (&'static str, FoodCategory, &'static [Goal], f64, f64, f64, f64, f64, f64);

const FOODS: &[FoodRow] = &[
    // Protein
    ("Chicken breast", FoodCategory::Protein, &[ReduceWeight, CutDefine, GainMuscle, Maintain], 100.0, 165.0, 31.0, 0.0, 3.6, 0.0),
    ("Whole egg", FoodCategory::Protein, &[GainWeight, GainMuscle, Maintain], 50.0, 78.0, 6.3, 0.6, 5.3, 0.0),
    ("Tuna in water", FoodCategory::Protein, &[ReduceWeight, CutDefine, Maintain], 100.0, 116.0, 26.0, 0.0, 0.8, 0.0),
    ("Salmon", FoodCategory::Protein, &[GainMuscle, Cardiovascular, Maintain], 100.0, 208.0, 20.0, 0.0, 13.0, 0.0),
    ("Lean beef", FoodCategory::Protein, &[GainMuscle, GainWeight, Maintain], 100.0, 250.0, 26.0, 0.0, 15.0, 0.0),
    ("Low-fat cottage cheese", FoodCategory::Dairy, &[ReduceWeight, CutDefine, Maintain], 100.0, 72.0, 12.0, 3.5, 1.0, 0.0),
    // Carbohydrate
    ("Brown rice", FoodCategory::Carbohydrate, &[GainMuscle, GainWeight, Maintain], 100.0, 370.0, 7.9, 77.0, 2.9, 3.5),
    ("Oats", FoodCategory::Carbohydrate, &[GainMuscle, GainWeight, Cardiovascular, Maintain], 100.0, 389.0, 16.9, 66.0, 6.9, 10.6),
    ("Sweet potato", FoodCategory::Carbohydrate, &[GainMuscle, GainWeight, Maintain], 100.0, 86.0, 1.6, 20.0, 0.1, 3.0),
    ("Whole wheat bread", FoodCategory::Carbohydrate, &[Maintain, GainMuscle], 100.0, 247.0, 13.0, 41.0, 3.4, 6.0),
    ("Quinoa", FoodCategory::Carbohydrate, &[ReduceWeight, Maintain, Cardiovascular], 100.0, 368.0, 14.0, 64.0, 6.0, 7.0),
    ("Whole wheat pasta", FoodCategory::Carbohydrate, &[GainMuscle, GainWeight, Maintain], 100.0, 348.0, 13.0, 70.0, 2.5, 9.0),
    // Healthy fats
    ("Avocado", FoodCategory::Fat, &[GainMuscle, Cardiovascular, Maintain], 100.0, 160.0, 2.0, 8.5, 14.7, 6.7),
    ("Almonds", FoodCategory::Fat, &[GainWeight, GainMuscle, Cardiovascular], 100.0, 579.0, 21.0, 21.0, 50.0, 12.5),
    ("Olive oil", FoodCategory::Fat, &[Cardiovascular, Maintain], 14.0, 119.0, 0.0, 0.0, 13.5, 0.0),
    ("Walnuts", FoodCategory::Fat, &[GainWeight, Cardiovascular, GainMuscle], 100.0, 654.0, 15.0, 14.0, 65.0, 7.0),
    // Vegetables
    ("Broccoli", FoodCategory::Vegetable, &[ReduceWeight, CutDefine, Maintain, Cardiovascular], 100.0, 34.0, 2.8, 7.0, 0.4, 2.6),
    ("Spinach", FoodCategory::Vegetable, &[ReduceWeight, CutDefine, Maintain, Cardiovascular], 100.0, 23.0, 2.9, 3.6, 0.4, 2.2),
    ("Carrot", FoodCategory::Vegetable, &[ReduceWeight, CutDefine, Maintain], 100.0, 41.0, 0.9, 10.0, 0.2, 2.8),
    ("Lettuce", FoodCategory::Vegetable, &[ReduceWeight, CutDefine, Maintain], 100.0, 15.0, 1.4, 2.9, 0.2, 1.3),
    ("Tomato", FoodCategory::Vegetable, &[ReduceWeight, CutDefine, Maintain, Cardiovascular], 100.0, 18.0, 0.9, 3.9, 0.2, 1.2),
    // Fruit
    ("Banana", FoodCategory::Fruit, &[GainMuscle, GainWeight, Maintain], 100.0, 89.0, 1.1, 23.0, 0.3, 2.6),
    ("Apple", FoodCategory::Fruit, &[ReduceWeight, CutDefine, Maintain], 100.0, 52.0, 0.3, 14.0, 0.2, 2.4),
    ("Strawberry", FoodCategory::Fruit, &[ReduceWeight, CutDefine, Maintain], 100.0, 32.0, 0.7, 7.7, 0.3, 2.0),
    ("Orange", FoodCategory::Fruit, &[ReduceWeight, Maintain, Cardiovascular], 100.0, 47.0, 0.9, 12.0, 0.1, 2.4),
    // Dairy
    ("Plain Greek yogurt", FoodCategory::Dairy, &[ReduceWeight, CutDefine, GainMuscle, Maintain], 100.0, 59.0, 10.0, 3.6, 0.4, 0.0),
    ("Skim milk", FoodCategory::Dairy, &[ReduceWeight, Maintain], 240.0, 83.0, 8.3, 12.0, 0.2, 0.0),
    ("Panela cheese", FoodCategory::Dairy, &[Maintain, GainMuscle], 100.0, 240.0, 18.0, 3.0, 18.0, 0.0),
    // Beverages
    ("Water", FoodCategory::Beverage, &[ReduceWeight, CutDefine, Maintain, GainMuscle, GainWeight, Cardiovascular], 240.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    ("Green tea", FoodCategory::Beverage, &[ReduceWeight, CutDefine, Cardiovascular], 240.0, 2.0, 0.0, 0.0, 0.0, 0.0),
];

/// name, muscle groups, kind, levels, description, kcal per 30 min
type ExerciseRow = (
    &'static str,
    &'static [&'static str],
    ExerciseKind,
    &'static [ExerciseLevel],
    &'static str,
    f64,
);

const EXERCISES: &[ExerciseRow] = &[
    // Chest
    ("Bench press", &["chest", "triceps", "shoulders"], ExerciseKind::Strength, &[Beginner, Intermediate, Advanced], "Lying on a bench, press the bar from the chest to full extension", 120.0),
    ("Push-ups", &["chest", "triceps", "core"], ExerciseKind::Strength, &[Beginner, Intermediate], "Bodyweight chest exercise", 100.0),
    ("Dumbbell flyes", &["chest"], ExerciseKind::Strength, &[Intermediate, Advanced], "Lying down, open and close the arms holding dumbbells", 90.0),
    // Back
    ("Pull-ups", &["back", "biceps"], ExerciseKind::Strength, &[Intermediate, Advanced], "Hanging from a bar, pull the chin over it", 130.0),
    ("Barbell row", &["back", "biceps"], ExerciseKind::Strength, &[Beginner, Intermediate, Advanced], "Bent over, pull the bar toward the abdomen", 110.0),
    ("Deadlift", &["back", "legs", "glutes"], ExerciseKind::Strength, &[Intermediate, Advanced], "Lift the bar from the floor keeping the back straight", 150.0),
    // Legs
    ("Squat", &["legs", "glutes"], ExerciseKind::Strength, &[Beginner, Intermediate, Advanced], "Bend the knees lowering the hips", 140.0),
    ("Lunges", &["legs", "glutes"], ExerciseKind::Strength, &[Beginner, Intermediate], "Long step forward bending the front knee", 120.0),
    ("Leg press", &["legs", "glutes"], ExerciseKind::Strength, &[Beginner, Intermediate, Advanced], "Push the machine platform with the feet", 130.0),
    // Shoulders
    ("Overhead press", &["shoulders", "triceps"], ExerciseKind::Strength, &[Beginner, Intermediate, Advanced], "Standing, press the bar overhead", 110.0),
    ("Lateral raises", &["shoulders"], ExerciseKind::Strength, &[Beginner, Intermediate], "Raise dumbbells sideways to shoulder height", 80.0),
    // Arms
    ("Biceps curl", &["biceps"], ExerciseKind::Strength, &[Beginner, Intermediate], "Bend the elbows lifting the dumbbells", 70.0),
    ("Triceps pushdown", &["triceps"], ExerciseKind::Strength, &[Beginner, Intermediate], "Push the cable bar down extending the elbows", 75.0),
    // Cardio
    ("Running", &["legs", "cardiovascular"], ExerciseKind::Cardio, &[Beginner, Intermediate, Advanced], "Continuous or interval running", 300.0),
    ("Stationary bike", &["legs", "cardiovascular"], ExerciseKind::Cardio, &[Beginner, Intermediate], "Continuous or interval pedaling", 250.0),
    ("Elliptical", &["legs", "arms", "cardiovascular"], ExerciseKind::Cardio, &[Beginner, Intermediate], "Low impact elliptical movement", 280.0),
    ("Swimming", &["full body", "cardiovascular"], ExerciseKind::Cardio, &[Beginner, Intermediate, Advanced], "Continuous swimming", 350.0),
    ("Jump rope", &["legs", "cardiovascular"], ExerciseKind::Cardio, &[Intermediate, Advanced], "Continuous rope jumping", 400.0),
    // Core
    ("Plank", &["core", "abs"], ExerciseKind::Strength, &[Beginner, Intermediate], "Hold a horizontal position on the forearms", 50.0),
    ("Crunches", &["abs"], ExerciseKind::Strength, &[Beginner], "Trunk flexion", 60.0),
    // Functional
    ("Burpees", &["full body"], ExerciseKind::Functional, &[Intermediate, Advanced], "Push-up, jump and squat combined", 200.0),
    ("Mountain climbers", &["core", "legs", "cardiovascular"], ExerciseKind::Functional, &[Intermediate, Advanced], "Climbing motion from a plank position", 180.0),
];

/// Write the default foods. Returns how many were written.
pub fn seed_foods(conn: &Connection) -> DbResult<usize> {
    for (i, row) in FOODS.iter().enumerate() {
        let &(name, category, goals, portion_g, calories, protein, carbs, fat, fiber) = row;
        let food = FoodItem {
            id: format!("food-{}", i + 1),
            name: name.to_string(),
            category,
            suitable_goals: goals.to_vec(),
            portion_g,
            nutrition: Nutrition {
                calories,
                protein,
                carbs,
                fat,
                fiber,
                ..Default::default()
            },
            notes: None,
        };
        store::put(conn, &food)?;
    }
    Ok(FOODS.len())
}

/// Write the default exercises. Returns how many were written.
pub fn seed_exercises(conn: &Connection) -> DbResult<usize> {
    for (i, row) in EXERCISES.iter().enumerate() {
        let &(name, groups, kind, levels, description, calories) = row;
        let exercise = Exercise {
            id: format!("exercise-{}", i + 1),
            name: name.to_string(),
            muscle_groups: groups.iter().map(|g| g.to_string()).collect(),
            kind,
            levels: levels.to_vec(),
            description: description.to_string(),
            calories_per_30min: Some(calories),
        };
        store::put(conn, &exercise)?;
    }
    Ok(EXERCISES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_db;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(FOODS.len(), 30);
        assert_eq!(EXERCISES.len(), 22);
    }

    #[test]
    fn test_seeded_ids_are_fixed() {
        let db = migrated_db();
        let conn = db.get_conn().unwrap();

        let chicken = FoodItem::get_by_id(&conn, "food-1").unwrap().unwrap();
        assert_eq!(chicken.name, "Chicken breast");
        assert_eq!(chicken.nutrition.protein, 31.0);

        let olive_oil = FoodItem::get_by_id(&conn, "food-15").unwrap().unwrap();
        assert_eq!(olive_oil.portion_g, 14.0);

        let climbers = Exercise::get_by_id(&conn, "exercise-22").unwrap().unwrap();
        assert_eq!(climbers.kind, ExerciseKind::Functional);
    }

    #[test]
    fn test_every_food_has_a_goal() {
        assert!(FOODS.iter().all(|row| !row.2.is_empty()));
    }
}
