//! Food Catalog Tools

use serde::Serialize;

use crate::calc::{Goal, IdGenerator};
use crate::db::Database;
use crate::models::{
    Diet, FoodCategory, FoodFilter, FoodItem, FoodItemCreate, FoodItemUpdate, Nutrition,
};
use super::calculator::parse_goal;

pub(crate) fn parse_category(label: &str) -> Result<FoodCategory, String> {
    FoodCategory::from_str(label).ok_or_else(|| {
        format!(
            "Invalid category '{}' (expected protein, carbohydrate, fat, vegetable, fruit, dairy, beverage or other)",
            label
        )
    })
}

fn parse_goals(labels: &[String]) -> Result<Vec<Goal>, String> {
    let mut goals = Vec::new();
    for label in labels {
        if let Some(goal) = parse_goal(Some(label))? {
            if !goals.contains(&goal) {
                goals.push(goal);
            }
        }
    }
    Ok(goals)
}

fn validate_nutrition(n: &Nutrition) -> Result<(), String> {
    let fields = [
        ("calories", n.calories),
        ("protein", n.protein),
        ("carbs", n.carbs),
        ("fat", n.fat),
        ("fiber", n.fiber),
        ("sodium", n.sodium),
        ("sugar", n.sugar),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{} cannot be negative", name));
        }
    }
    Ok(())
}

/// Food as entered, with category and goals still as labels
#[derive(Debug, Clone, Default)]
pub struct FoodForm {
    pub name: String,
    pub category: Option<String>,
    pub suitable_goals: Vec<String>,
    pub portion_g: f64,
    pub nutrition: Nutrition,
    pub notes: Option<String>,
}

/// Field changes for update_food, labels unparsed
#[derive(Debug, Clone, Default)]
pub struct FoodChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub suitable_goals: Option<Vec<String>>,
    pub portion_g: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub sugar: Option<f64>,
    pub notes: Option<String>,
}

/// Response for add_food
#[derive(Debug, Serialize)]
pub struct AddFoodResponse {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
}

/// Food with the diets that reference it
#[derive(Debug, Serialize)]
pub struct FoodDetail {
    #[serde(flatten)]
    pub food: FoodItem,
    pub used_in_diets: Vec<String>,
}

/// Food summary for list results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
    pub portion_g: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl From<&FoodItem> for FoodSummary {
    fn from(f: &FoodItem) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            category: f.category,
            portion_g: f.portion_g,
            calories: f.nutrition.calories,
            protein: f.nutrition.protein,
            carbs: f.nutrition.carbs,
            fat: f.nutrition.fat,
        }
    }
}

/// Response for list_foods
#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

/// Response for update_food
#[derive(Debug, Serialize)]
pub struct UpdateFoodResponse {
    pub success: bool,
    pub food: FoodItem,
}

/// Response for delete_food blocked
#[derive(Debug, Serialize)]
pub struct DeleteFoodBlockedResponse {
    pub error: String,
    pub used_in_diets: Vec<String>,
}

/// Response for successful delete_food
#[derive(Debug, Serialize)]
pub struct DeleteFoodSuccessResponse {
    pub success: bool,
    pub deleted_id: String,
}

/// Add a food to the catalog
pub fn add_food(
    db: &Database,
    ids: &dyn IdGenerator,
    form: FoodForm,
) -> Result<AddFoodResponse, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    if !form.portion_g.is_finite() || form.portion_g <= 0.0 {
        return Err("portion_g must be greater than 0".to_string());
    }
    validate_nutrition(&form.nutrition)?;

    let data = FoodItemCreate {
        name: name.to_string(),
        category: match form.category.as_deref() {
            Some(label) => parse_category(label)?,
            None => FoodCategory::default(),
        },
        suitable_goals: parse_goals(&form.suitable_goals)?,
        portion_g: form.portion_g,
        nutrition: form.nutrition,
        notes: form.notes,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food = FoodItem::create(&conn, ids, data)
        .map_err(|e| format!("Failed to create food: {}", e))?;

    Ok(AddFoodResponse {
        id: food.id,
        name: food.name,
        category: food.category,
    })
}

/// Get a food by ID with diet usage
pub fn get_food(db: &Database, id: &str) -> Result<Option<FoodDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = FoodItem::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get food: {}", e))?;

    match food {
        Some(food) => {
            let used_in_diets = Diet::using_food(&conn, id)
                .map_err(|e| format!("Failed to get diet usage: {}", e))?
                .into_iter()
                .map(|d| d.name)
                .collect();
            Ok(Some(FoodDetail { food, used_in_diets }))
        }
        None => Ok(None),
    }
}

/// List foods, filtered by category, goal and name fragment
pub fn list_foods(
    db: &Database,
    category: Option<&str>,
    goal: Option<&str>,
    name: Option<&str>,
) -> Result<ListFoodsResponse, String> {
    let filter = FoodFilter {
        category: category.map(parse_category).transpose()?,
        goal: parse_goal(goal)?,
        name: name.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let foods = FoodItem::list(&conn, &filter)
        .map_err(|e| format!("Failed to list foods: {}", e))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();
    Ok(ListFoodsResponse { items, total })
}

/// Update a food. Diet totals pick up the change on next read.
pub fn update_food(
    db: &Database,
    id: &str,
    changes: FoodChanges,
) -> Result<UpdateFoodResponse, String> {
    if let Some(ref name) = changes.name {
        if name.trim().is_empty() {
            return Err("Food name cannot be empty".to_string());
        }
    }
    if let Some(portion) = changes.portion_g {
        if !portion.is_finite() || portion <= 0.0 {
            return Err("portion_g must be greater than 0".to_string());
        }
    }
    let values = [
        ("calories", changes.calories),
        ("protein", changes.protein),
        ("carbs", changes.carbs),
        ("fat", changes.fat),
        ("fiber", changes.fiber),
        ("sodium", changes.sodium),
        ("sugar", changes.sugar),
    ];
    for (field, value) in values {
        if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
            return Err(format!("{} cannot be negative", field));
        }
    }

    let data = FoodItemUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        category: changes.category.as_deref().map(parse_category).transpose()?,
        suitable_goals: changes
            .suitable_goals
            .as_deref()
            .map(parse_goals)
            .transpose()?,
        portion_g: changes.portion_g,
        calories: changes.calories,
        protein: changes.protein,
        carbs: changes.carbs,
        fat: changes.fat,
        fiber: changes.fiber,
        sodium: changes.sodium,
        sugar: changes.sugar,
        notes: changes.notes,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = FoodItem::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update food: {}", e))?;

    match updated {
        Some(food) => Ok(UpdateFoodResponse { success: true, food }),
        None => Err(format!("Food not found with id: {}", id)),
    }
}

/// Delete a food (blocked while any diet uses it)
pub fn delete_food(
    db: &Database,
    id: &str,
) -> Result<Result<DeleteFoodSuccessResponse, DeleteFoodBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = FoodItem::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if food.is_none() {
        return Err(format!("Food not found with id: {}", id));
    }

    let diets = Diet::using_food(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;
    if !diets.is_empty() {
        return Ok(Err(DeleteFoodBlockedResponse {
            error: format!("Cannot delete food: used in {} diet(s)", diets.len()),
            used_in_diets: diets.into_iter().map(|d| d.name).collect(),
        }));
    }

    FoodItem::delete(&conn, id).map_err(|e| format!("Failed to delete food: {}", e))?;

    Ok(Ok(DeleteFoodSuccessResponse {
        success: true,
        deleted_id: id.to_string(),
    }))
}
