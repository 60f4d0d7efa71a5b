//! Diet Plan Tools
//!
//! Diets reference catalog foods by id; totals are always computed from the
//! current catalog, never stored.

use std::collections::HashMap;

use serde::Serialize;

use crate::calc::{macro_distribution_for_goal, Clock, Goal, IdGenerator, MacroDistribution};
use crate::db::Database;
use crate::models::{
    calculate_diet_totals, Diet, DietCreate, DietUpdate, FoodFilter, FoodItem, Meal, Nutrition,
    Patient,
};
use super::calculator::parse_goal;

fn validate_macros(macros: &MacroDistribution) -> Result<(), String> {
    if macros.total() != 100 {
        return Err(format!(
            "Macro percentages must total 100 (got {})",
            macros.total()
        ));
    }
    Ok(())
}

fn validate_target_calories(kcal: f64) -> Result<(), String> {
    if !kcal.is_finite() || kcal <= 0.0 {
        return Err("target_calories must be greater than 0".to_string());
    }
    Ok(())
}

/// Check that a meal has a positive quantity and refers to a catalog food
fn validate_meal(meal: &Meal, foods: &HashMap<String, FoodItem>) -> Result<(), String> {
    if !meal.quantity_g.is_finite() || meal.quantity_g <= 0.0 {
        return Err("quantity_g must be greater than 0".to_string());
    }
    if !foods.contains_key(&meal.food_id) {
        return Err(format!("Food not found with id: {}", meal.food_id));
    }
    Ok(())
}

fn load_foods(db_conn: &rusqlite::Connection) -> Result<HashMap<String, FoodItem>, String> {
    let foods = FoodItem::list(db_conn, &FoodFilter::default())
        .map_err(|e| format!("Failed to load foods: {}", e))?;
    Ok(foods.into_iter().map(|f| (f.id.clone(), f)).collect())
}

/// Diet as entered, goal still a label
#[derive(Debug, Clone, Default)]
pub struct DietForm {
    pub name: String,
    pub goal: Option<String>,
    pub description: String,
    pub target_calories: f64,
    /// Defaults to the goal's split when absent
    pub macros: Option<MacroDistribution>,
    pub meals: Vec<Meal>,
    pub duration_weeks: Option<u32>,
    pub instructions: String,
}

/// Field changes for update_diet
#[derive(Debug, Clone, Default)]
pub struct DietChanges {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub description: Option<String>,
    pub target_calories: Option<f64>,
    pub macros: Option<MacroDistribution>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

/// Response for create_diet
#[derive(Debug, Serialize)]
pub struct CreateDietResponse {
    pub id: String,
    pub name: String,
    pub totals: Nutrition,
}

/// One meal line with its food resolved
#[derive(Debug, Serialize)]
pub struct MealDetail {
    pub index: usize,
    pub food_id: String,
    /// `None` when the food has left the catalog
    pub food_name: Option<String>,
    pub quantity_g: f64,
    pub time_slot: String,
    pub nutrition: Option<Nutrition>,
}

/// Full diet with resolved meals and totals
#[derive(Debug, Serialize)]
pub struct DietDetail {
    pub id: String,
    pub name: String,
    pub goal: Option<Goal>,
    pub description: String,
    pub target_calories: f64,
    pub macros: MacroDistribution,
    pub meals: Vec<MealDetail>,
    pub totals: Nutrition,
    /// Totals minus target, in kcal
    pub calorie_difference: f64,
    pub duration_weeks: Option<u32>,
    pub instructions: String,
    pub created_at: String,
}

/// Diet summary for list results
#[derive(Debug, Serialize)]
pub struct DietSummary {
    pub id: String,
    pub name: String,
    pub goal: Option<Goal>,
    pub target_calories: f64,
    pub meal_count: usize,
    pub created_at: String,
}

impl From<&Diet> for DietSummary {
    fn from(d: &Diet) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            goal: d.goal,
            target_calories: d.target_calories,
            meal_count: d.meals.len(),
            created_at: d.created_at.clone(),
        }
    }
}

/// Response for list_diets
#[derive(Debug, Serialize)]
pub struct ListDietsResponse {
    pub diets: Vec<DietSummary>,
    pub total: usize,
}

/// Response for meal edits and updates
#[derive(Debug, Serialize)]
pub struct DietChangeResponse {
    pub success: bool,
    pub id: String,
    pub meal_count: usize,
    pub totals: Nutrition,
}

/// Response for delete_diet
#[derive(Debug, Serialize)]
pub struct DeleteDietResponse {
    pub success: bool,
    pub deleted_id: String,
    /// Patients whose assignment was cleared
    pub unassigned_patients: Vec<String>,
}

/// Create a diet plan
pub fn create_diet(
    db: &Database,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
    form: DietForm,
) -> Result<CreateDietResponse, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Diet name cannot be empty".to_string());
    }
    validate_target_calories(form.target_calories)?;
    let goal = parse_goal(form.goal.as_deref())?;
    let macros = form.macros.unwrap_or_else(|| macro_distribution_for_goal(goal));
    validate_macros(&macros)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let foods = load_foods(&conn)?;
    for meal in &form.meals {
        validate_meal(meal, &foods)?;
    }

    let diet = Diet::create(
        &conn,
        ids,
        clock.timestamp(),
        DietCreate {
            name: name.to_string(),
            goal,
            description: form.description,
            target_calories: form.target_calories,
            macros,
            meals: form.meals,
            duration_weeks: form.duration_weeks,
            instructions: form.instructions,
        },
    )
    .map_err(|e| format!("Failed to create diet: {}", e))?;

    let all_foods: Vec<FoodItem> = foods.into_values().collect();
    tracing::info!("Created diet {} with {} meal(s)", diet.id, diet.meals.len());

    Ok(CreateDietResponse {
        totals: calculate_diet_totals(&diet.meals, &all_foods),
        id: diet.id,
        name: diet.name,
    })
}

/// Get a diet with meals resolved against the catalog
pub fn get_diet(db: &Database, id: &str) -> Result<Option<DietDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(diet) = Diet::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get diet: {}", e))?
    else {
        return Ok(None);
    };

    let foods = load_foods(&conn)?;
    let meals = diet
        .meals
        .iter()
        .enumerate()
        .map(|(index, meal)| {
            let food = foods.get(&meal.food_id);
            MealDetail {
                index,
                food_id: meal.food_id.clone(),
                food_name: food.map(|f| f.name.clone()),
                quantity_g: meal.quantity_g,
                time_slot: meal.time_slot.clone(),
                nutrition: food.map(|f| {
                    calculate_diet_totals(std::slice::from_ref(meal), std::slice::from_ref(f))
                }),
            }
        })
        .collect();

    let all_foods: Vec<FoodItem> = foods.into_values().collect();
    let totals = calculate_diet_totals(&diet.meals, &all_foods);

    Ok(Some(DietDetail {
        calorie_difference: crate::calc::round_to(totals.calories - diet.target_calories, 0),
        totals,
        meals,
        id: diet.id,
        name: diet.name,
        goal: diet.goal,
        description: diet.description,
        target_calories: diet.target_calories,
        macros: diet.macros,
        duration_weeks: diet.duration_weeks,
        instructions: diet.instructions,
        created_at: diet.created_at,
    }))
}

/// List diets, optionally by goal and name fragment
pub fn list_diets(
    db: &Database,
    goal: Option<&str>,
    name: Option<&str>,
) -> Result<ListDietsResponse, String> {
    let goal = parse_goal(goal)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let diets = Diet::list(&conn, goal, name.map(str::trim).filter(|s| !s.is_empty()))
        .map_err(|e| format!("Failed to list diets: {}", e))?;

    let diets: Vec<DietSummary> = diets.iter().map(DietSummary::from).collect();
    let total = diets.len();
    Ok(ListDietsResponse { diets, total })
}

/// Update diet fields other than meals
pub fn update_diet(
    db: &Database,
    id: &str,
    changes: DietChanges,
) -> Result<DietChangeResponse, String> {
    if let Some(ref name) = changes.name {
        if name.trim().is_empty() {
            return Err("Diet name cannot be empty".to_string());
        }
    }
    if let Some(kcal) = changes.target_calories {
        validate_target_calories(kcal)?;
    }
    if let Some(ref macros) = changes.macros {
        validate_macros(macros)?;
    }

    let data = DietUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        goal: parse_goal(changes.goal.as_deref())?,
        description: changes.description,
        target_calories: changes.target_calories,
        macros: changes.macros,
        duration_weeks: changes.duration_weeks,
        instructions: changes.instructions,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let diet = Diet::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update diet: {}", e))?
        .ok_or_else(|| format!("Diet not found with id: {}", id))?;

    let totals = diet
        .totals(&conn)
        .map_err(|e| format!("Failed to compute totals: {}", e))?;

    Ok(DietChangeResponse {
        success: true,
        meal_count: diet.meals.len(),
        id: diet.id,
        totals,
    })
}

/// Delete a diet and clear it from every patient it was assigned to
pub fn delete_diet(db: &Database, id: &str) -> Result<DeleteDietResponse, String> {
    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let tx = conn
        .transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    if !Diet::delete(&tx, id).map_err(|e| format!("Failed to delete diet: {}", e))? {
        return Err(format!("Diet not found with id: {}", id));
    }

    let mut unassigned_patients = Vec::new();
    let patients = Patient::list(&tx).map_err(|e| format!("Failed to list patients: {}", e))?;
    for mut patient in patients {
        if patient.assigned_diet_id.as_deref() == Some(id) {
            patient.assigned_diet_id = None;
            patient
                .save(&tx)
                .map_err(|e| format!("Failed to update patient: {}", e))?;
            unassigned_patients.push(patient.id);
        }
    }

    tx.commit().map_err(|e| format!("Database error: {}", e))?;
    tracing::info!(
        "Deleted diet {} ({} patient(s) unassigned)",
        id,
        unassigned_patients.len()
    );

    Ok(DeleteDietResponse {
        success: true,
        deleted_id: id.to_string(),
        unassigned_patients,
    })
}

/// Append a meal line to a diet
pub fn add_meal(db: &Database, diet_id: &str, meal: Meal) -> Result<DietChangeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut diet = Diet::get_by_id(&conn, diet_id)
        .map_err(|e| format!("Failed to get diet: {}", e))?
        .ok_or_else(|| format!("Diet not found with id: {}", diet_id))?;

    let foods = load_foods(&conn)?;
    validate_meal(&meal, &foods)?;

    diet.meals.push(meal);
    diet.save(&conn).map_err(|e| format!("Failed to save diet: {}", e))?;

    let all_foods: Vec<FoodItem> = foods.into_values().collect();
    Ok(DietChangeResponse {
        success: true,
        meal_count: diet.meals.len(),
        totals: calculate_diet_totals(&diet.meals, &all_foods),
        id: diet.id,
    })
}

/// Remove the meal line at `index` (0-based, as shown by get_diet)
pub fn remove_meal(db: &Database, diet_id: &str, index: usize) -> Result<DietChangeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut diet = Diet::get_by_id(&conn, diet_id)
        .map_err(|e| format!("Failed to get diet: {}", e))?
        .ok_or_else(|| format!("Diet not found with id: {}", diet_id))?;

    if index >= diet.meals.len() {
        return Err(format!(
            "Meal index {} out of range (diet has {} meal(s))",
            index,
            diet.meals.len()
        ));
    }
    diet.meals.remove(index);
    diet.save(&conn).map_err(|e| format!("Failed to save diet: {}", e))?;

    let totals = diet
        .totals(&conn)
        .map_err(|e| format!("Failed to compute totals: {}", e))?;

    Ok(DietChangeResponse {
        success: true,
        meal_count: diet.meals.len(),
        id: diet.id,
        totals,
    })
}
