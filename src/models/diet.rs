//! Diet model
//!
//! A diet plan is a calorie target, a macro split and a list of meals, each
//! meal being a quantity of one catalog food at a time slot.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::calc::{Goal, IdGenerator, MacroDistribution};
use crate::db::{store, Collection, DbResult, Document};
use super::{FoodItem, Nutrition};

/// One food entry in a diet plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub food_id: String,
    /// Grams of the food
    pub quantity_g: f64,
    /// Free label such as "Breakfast" or "Snack 1"
    pub time_slot: String,
}

/// A diet plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    pub id: String,
    pub name: String,
    pub goal: Option<Goal>,
    #[serde(default)]
    pub description: String,
    pub target_calories: f64,
    #[serde(default)]
    pub macros: MacroDistribution,
    #[serde(default)]
    pub meals: Vec<Meal>,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
    pub created_at: String,
}

impl Document for Diet {
    const COLLECTION: Collection = Collection::Diets;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Data for creating a diet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietCreate {
    pub name: String,
    pub goal: Option<Goal>,
    #[serde(default)]
    pub description: String,
    pub target_calories: f64,
    #[serde(default)]
    pub macros: MacroDistribution,
    #[serde(default)]
    pub meals: Vec<Meal>,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
}

/// Data for updating a diet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DietUpdate {
    pub name: Option<String>,
    pub goal: Option<Goal>,
    pub description: Option<String>,
    pub target_calories: Option<f64>,
    pub macros: Option<MacroDistribution>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

/// Sum the nutrition of a meal list.
///
/// Each meal scales its food's per-portion nutrition by
/// `quantity / portion`. Meals whose food is missing, or whose food has no
/// positive portion, contribute nothing. The result is display-rounded.
pub fn calculate_diet_totals(meals: &[Meal], foods: &[FoodItem]) -> Nutrition {
    let by_id: HashMap<&str, &FoodItem> = foods.iter().map(|f| (f.id.as_str(), f)).collect();

    meals
        .iter()
        .filter_map(|meal| {
            let food = by_id.get(meal.food_id.as_str())?;
            if food.portion_g <= 0.0 {
                return None;
            }
            Some(food.nutrition.scale(meal.quantity_g / food.portion_g))
        })
        .sum::<Nutrition>()
        .rounded()
}

impl Diet {
    pub fn create(
        conn: &Connection,
        ids: &dyn IdGenerator,
        created_at: String,
        data: DietCreate,
    ) -> DbResult<Self> {
        let diet = Self {
            id: ids.next_id(),
            name: data.name,
            goal: data.goal,
            description: data.description,
            target_calories: data.target_calories,
            macros: data.macros,
            meals: data.meals,
            duration_weeks: data.duration_weeks,
            instructions: data.instructions,
            created_at,
        };
        store::put(conn, &diet)?;
        Ok(diet)
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        store::get(conn, id)
    }

    /// List diets, optionally by goal and case-insensitive name substring
    pub fn list(conn: &Connection, goal: Option<Goal>, name: Option<&str>) -> DbResult<Vec<Self>> {
        let all: Vec<Self> = store::list(conn)?;
        let name = name.map(str::to_lowercase);

        Ok(all
            .into_iter()
            .filter(|d| goal.map_or(true, |g| d.goal == Some(g)))
            .filter(|d| name.as_ref().map_or(true, |n| d.name.to_lowercase().contains(n)))
            .collect())
    }

    /// Persist the diet as it is
    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        store::put(conn, self)
    }

    pub fn update(conn: &Connection, id: &str, data: &DietUpdate) -> DbResult<Option<Self>> {
        let Some(mut diet) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        if let Some(ref name) = data.name {
            diet.name = name.clone();
        }
        if let Some(goal) = data.goal {
            diet.goal = Some(goal);
        }
        if let Some(ref description) = data.description {
            diet.description = description.clone();
        }
        if let Some(calories) = data.target_calories {
            diet.target_calories = calories;
        }
        if let Some(macros) = data.macros {
            diet.macros = macros;
        }
        if let Some(weeks) = data.duration_weeks {
            diet.duration_weeks = Some(weeks);
        }
        if let Some(ref instructions) = data.instructions {
            diet.instructions = instructions.clone();
        }

        diet.save(conn)?;
        Ok(Some(diet))
    }

    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        store::delete::<Self>(conn, id)
    }

    /// Nutrition totals of this diet against the current catalog
    pub fn totals(&self, conn: &Connection) -> DbResult<Nutrition> {
        let foods: Vec<FoodItem> = store::list(conn)?;
        Ok(calculate_diet_totals(&self.meals, &foods))
    }

    /// Diets that include the given food in any meal
    pub fn using_food(conn: &Connection, food_id: &str) -> DbResult<Vec<Self>> {
        let all: Vec<Self> = store::list(conn)?;
        Ok(all
            .into_iter()
            .filter(|d| d.meals.iter().any(|m| m.food_id == food_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodCategory;
    use crate::test_support::{migrated_db, SequentialIds};

    fn food(id: &str, portion_g: f64, calories: f64, protein: f64) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            name: id.to_string(),
            category: FoodCategory::Other,
            suitable_goals: vec![],
            portion_g,
            nutrition: Nutrition {
                calories,
                protein,
                carbs: 10.0,
                fat: 1.0,
                ..Default::default()
            },
            notes: None,
        }
    }

    fn meal(food_id: &str, quantity_g: f64) -> Meal {
        Meal {
            food_id: food_id.to_string(),
            quantity_g,
            time_slot: "Lunch".to_string(),
        }
    }

    #[test]
    fn test_totals_scale_by_portion() {
        let foods = vec![food("rice", 100.0, 370.0, 8.0), food("egg", 50.0, 78.0, 6.3)];
        let meals = vec![meal("rice", 150.0), meal("egg", 100.0)];

        let totals = calculate_diet_totals(&meals, &foods);
        // 555 + 156
        assert_eq!(totals.calories, 711.0);
        // 12.0 + 12.6
        assert_eq!(totals.protein, 24.6);
        assert_eq!(totals.carbs, 35.0);
    }

    #[test]
    fn test_totals_skip_missing_food() {
        let foods = vec![food("rice", 100.0, 370.0, 7.9)];
        let meals = vec![meal("rice", 100.0), meal("deleted", 500.0)];

        let totals = calculate_diet_totals(&meals, &foods);
        assert_eq!(totals.calories, 370.0);
    }

    #[test]
    fn test_totals_skip_zero_portion() {
        let foods = vec![food("odd", 0.0, 100.0, 1.0)];
        let totals = calculate_diet_totals(&[meal("odd", 100.0)], &foods);
        assert_eq!(totals, Nutrition::zero());
    }

    #[test]
    fn test_empty_diet_totals() {
        assert_eq!(calculate_diet_totals(&[], &[]), Nutrition::zero());
    }

    #[test]
    fn test_create_list_and_usage() {
        let db = migrated_db();
        let conn = db.get_conn().unwrap();
        let ids = SequentialIds::new("d");

        let diet = Diet::create(
            &conn,
            &ids,
            "2026-01-15T09:30:00Z".to_string(),
            DietCreate {
                name: "Lean cut".to_string(),
                goal: Some(Goal::CutDefine),
                description: String::new(),
                target_calories: 1800.0,
                macros: MacroDistribution::default(),
                meals: vec![meal("food-1", 200.0)],
                duration_weeks: Some(6),
                instructions: String::new(),
            },
        )
        .unwrap();

        assert_eq!(Diet::list(&conn, Some(Goal::CutDefine), None).unwrap().len(), 1);
        assert!(Diet::list(&conn, Some(Goal::GainWeight), None).unwrap().is_empty());
        assert_eq!(Diet::list(&conn, None, Some("LEAN")).unwrap().len(), 1);

        let users = Diet::using_food(&conn, "food-1").unwrap();
        assert_eq!(users.len(), 1);
        assert!(Diet::using_food(&conn, "food-2").unwrap().is_empty());

        // Chicken breast: 165 kcal / 31 g protein per 100 g
        let totals = diet.totals(&conn).unwrap();
        assert_eq!(totals.calories, 330.0);
        assert_eq!(totals.protein, 62.0);
    }

    #[test]
    fn test_default_macros_when_absent() {
        let json = r#"{"id":"d1","name":"x","goal":null,"target_calories":2000,"duration_weeks":null,"created_at":"t"}"#;
        let diet: Diet = serde_json::from_str(json).unwrap();
        assert_eq!(diet.macros, MacroDistribution { protein: 30, carbs: 40, fat: 30 });
        assert!(diet.meals.is_empty());
    }
}
