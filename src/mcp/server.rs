//! Nutrisys MCP Server Implementation
//!
//! Exposes the calculator, patient records, catalogs and plans as MCP tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::calc::{
    Circumferences, Clock, IdGenerator, MacroDistribution, MeasurementInput, Skinfolds,
};
use crate::db::{migrations, Database};
use crate::models::{DietaryAssessment, Lifestyle, Meal, MedicalHistory, Nutrition, Prescription};
use crate::tools::diets::{DietChanges, DietForm};
use crate::tools::exercises::{ExerciseChanges, ExerciseForm};
use crate::tools::foods::{FoodChanges, FoodForm};
use crate::tools::patients::PatientForm;
use crate::tools::routines::{RoutineChanges, RoutineForm};
use crate::tools::status::StatusTracker;
use crate::tools::{calculator, dashboard, diets, exercises, foods, patients, routines};

/// Nutrisys MCP Service
#[derive(Clone)]
pub struct NutrisysService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    tool_router: ToolRouter<NutrisysService>,
}

impl NutrisysService {
    pub fn new(
        database_path: PathBuf,
        database: Database,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            ids,
            clock,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Measurement Parameter Structs
// ============================================================================

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct SkinfoldParams {
    /// Triceps skinfold in mm
    pub triceps_mm: Option<f64>,
    /// Subscapular skinfold in mm
    pub subscapular_mm: Option<f64>,
    /// Suprailiac skinfold in mm
    pub suprailiac_mm: Option<f64>,
    /// Abdominal skinfold in mm
    pub abdominal_mm: Option<f64>,
    /// Thigh skinfold in mm
    pub thigh_mm: Option<f64>,
    /// Calf skinfold in mm
    pub calf_mm: Option<f64>,
    /// Chest skinfold in mm (male 3-site sum)
    pub chest_mm: Option<f64>,
}

impl From<SkinfoldParams> for Skinfolds {
    fn from(p: SkinfoldParams) -> Self {
        Self {
            triceps: p.triceps_mm,
            subscapular: p.subscapular_mm,
            suprailiac: p.suprailiac_mm,
            abdominal: p.abdominal_mm,
            thigh: p.thigh_mm,
            calf: p.calf_mm,
            chest: p.chest_mm,
        }
    }
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct MeasurementParams {
    /// Body weight in kg (required)
    pub weight_kg: Option<f64>,
    /// Height in cm (required)
    pub height_cm: Option<f64>,
    /// Waist circumference in cm
    pub waist_cm: Option<f64>,
    /// Hip circumference in cm
    pub hip_cm: Option<f64>,
    /// Neck circumference in cm
    pub neck_cm: Option<f64>,
    /// Arm circumference in cm
    pub arm_cm: Option<f64>,
    /// Thigh circumference in cm
    pub thigh_cm: Option<f64>,
    /// Calf circumference in cm
    pub calf_cm: Option<f64>,
    /// Chest circumference in cm
    pub chest_cm: Option<f64>,
    #[serde(flatten)]
    pub skinfolds: SkinfoldParams,
    /// Measured body fat %, overrides the Navy estimate
    pub body_fat_percent: Option<f64>,
    /// Measured lean mass in kg
    pub lean_mass_kg: Option<f64>,
    /// Measured waist/hip ratio
    pub waist_hip_ratio: Option<f64>,
}

impl From<MeasurementParams> for MeasurementInput {
    fn from(p: MeasurementParams) -> Self {
        Self {
            id: None,
            timestamp: None,
            weight_kg: p.weight_kg,
            height_cm: p.height_cm,
            circumferences: Circumferences {
                waist: p.waist_cm,
                hip: p.hip_cm,
                neck: p.neck_cm,
                arm: p.arm_cm,
                thigh: p.thigh_cm,
                calf: p.calf_cm,
                chest: p.chest_cm,
            },
            skinfolds: p.skinfolds.into(),
            body_fat_percent: p.body_fat_percent,
            lean_mass_kg: p.lean_mass_kg,
            waist_hip_ratio: p.waist_hip_ratio,
        }
    }
}

/// JSON body for a lookup that found nothing
fn not_found(what: &str, id: &str) -> serde_json::Value {
    serde_json::json!({ "error": format!("{} not found", what), "id": id })
}

/// Build a macro split only when all three percentages are given
fn macro_split(
    protein: Option<u8>,
    carbs: Option<u8>,
    fat: Option<u8>,
) -> Result<Option<MacroDistribution>, McpError> {
    match (protein, carbs, fat) {
        (None, None, None) => Ok(None),
        (Some(protein), Some(carbs), Some(fat)) => Ok(Some(MacroDistribution { protein, carbs, fat })),
        _ => Err(McpError::invalid_params(
            "protein_percent, carbs_percent and fat_percent must be given together",
            None,
        )),
    }
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateMeasurementsParams {
    /// Age in years
    pub age: u32,
    /// male or female
    pub sex: String,
    /// sedentary, light, moderate, active or very_active
    pub activity_level: String,
    #[serde(flatten)]
    pub measurements: MeasurementParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ClassifyBmiParams {
    /// BMI value
    pub bmi: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GoalTargetsParams {
    /// Total daily energy expenditure in kcal
    pub tdee: f64,
    /// Goal label; unknown labels get maintenance targets
    pub goal: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SkinfoldBodyFatParams {
    /// Age in years
    pub age: u32,
    /// male or female
    pub sex: String,
    #[serde(flatten)]
    pub skinfolds: SkinfoldParams,
}

// ============================================================================
// Patient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatientProfileParams {
    pub first_name: String,
    pub last_name: String,
    /// male or female
    pub sex: String,
    /// Age in years (> 0)
    pub age: u32,
    /// sedentary, light, moderate, active or very_active
    pub activity_level: String,
    /// YYYY-MM-DD
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub past_surgeries: Vec<String>,
    pub family_history: Option<String>,
    #[serde(default)]
    pub drinks_alcohol: bool,
    pub alcohol_frequency: Option<String>,
    #[serde(default)]
    pub smoker: bool,
    pub cigarettes_per_day: Option<u32>,
    pub sleep_hours: Option<f64>,
    /// 1 (low) to 10 (high)
    pub stress_level: Option<u8>,
    /// reduce_weight, gain_weight, cut_define, gain_muscle, maintain or cardiovascular
    pub goal: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub target_body_fat_percent: Option<f64>,
    /// YYYY-MM-DD
    pub target_date: Option<String>,
    pub goal_notes: Option<String>,
    /// Free-text 24-hour dietary recall
    pub recall_24h: Option<String>,
    pub intake_frequency: Option<String>,
    #[serde(default)]
    pub food_preferences: Vec<String>,
    #[serde(default)]
    pub food_dislikes: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

impl From<PatientProfileParams> for PatientForm {
    fn from(p: PatientProfileParams) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            sex: p.sex,
            age: p.age,
            activity_level: p.activity_level,
            birth_date: p.birth_date,
            phone: p.phone,
            email: p.email,
            occupation: p.occupation,
            medical_history: MedicalHistory {
                chronic_conditions: p.chronic_conditions,
                allergies: p.allergies,
                current_medications: p.current_medications,
                past_surgeries: p.past_surgeries,
                family_history: p.family_history,
            },
            lifestyle: Lifestyle {
                drinks_alcohol: p.drinks_alcohol,
                alcohol_frequency: p.alcohol_frequency,
                smoker: p.smoker,
                cigarettes_per_day: p.cigarettes_per_day,
                sleep_hours: p.sleep_hours,
                stress_level: p.stress_level,
            },
            goal: p.goal,
            target_weight_kg: p.target_weight_kg,
            target_body_fat_percent: p.target_body_fat_percent,
            target_date: p.target_date,
            goal_notes: p.goal_notes,
            dietary_assessment: DietaryAssessment {
                recall_24h: p.recall_24h,
                intake_frequency: p.intake_frequency,
                preferences: p.food_preferences,
                dislikes: p.food_dislikes,
                restrictions: p.dietary_restrictions,
            },
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SavePatientParams {
    /// Existing patient ID to update; omit to register a new patient
    pub id: Option<String>,
    #[serde(flatten)]
    pub profile: PatientProfileParams,
    #[serde(flatten)]
    pub measurements: MeasurementParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PatientIdParams {
    /// Patient ID
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPatientsParams {
    /// Case-insensitive match on first or last name (optional)
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddConsultationNoteParams {
    /// Patient ID
    pub patient_id: String,
    /// Note text (required)
    pub note: String,
    /// Weight at the consultation; defaults to the current measurement
    pub weight_kg: Option<f64>,
    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AssignDietParams {
    /// Patient ID
    pub patient_id: String,
    /// Diet ID; omit to clear the assignment
    pub diet_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AssignRoutineParams {
    /// Patient ID
    pub patient_id: String,
    /// Routine ID; omit to clear the assignment
    pub routine_id: Option<String>,
}

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodParams {
    pub name: String,
    /// protein, carbohydrate, fat, vegetable, fruit, dairy, beverage or other (default other)
    pub category: Option<String>,
    /// Goal labels this food suits
    #[serde(default)]
    pub suitable_goals: Vec<String>,
    /// Standard portion in grams; nutrition values are per portion
    pub portion_g: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    /// Sodium in mg
    #[serde(default)]
    pub sodium: f64,
    #[serde(default)]
    pub sugar: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    /// Category filter (optional)
    pub category: Option<String>,
    /// Only foods suitable for this goal (optional)
    pub goal: Option<String>,
    /// Name substring (optional)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    /// Replaces the whole goal list
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

// ============================================================================
// Diet Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealParams {
    /// Catalog food ID
    pub food_id: String,
    /// Quantity in grams
    pub quantity_g: f64,
    /// e.g. breakfast, lunch, dinner, snack
    #[serde(default = "default_time_slot")]
    pub time_slot: String,
}

fn default_time_slot() -> String { "any".to_string() }

impl From<MealParams> for Meal {
    fn from(p: MealParams) -> Self {
        Self {
            food_id: p.food_id,
            quantity_g: p.quantity_g,
            time_slot: p.time_slot,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateDietParams {
    pub name: String,
    /// Goal label (optional)
    pub goal: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Daily calorie target (> 0)
    pub target_calories: f64,
    /// Protein % (give all three or none; none uses the goal's split)
    pub protein_percent: Option<u8>,
    pub carbs_percent: Option<u8>,
    pub fat_percent: Option<u8>,
    #[serde(default)]
    pub meals: Vec<MealParams>,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDietsParams {
    /// Goal filter (optional)
    pub goal: Option<String>,
    /// Name substring (optional)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDietParams {
    pub id: String,
    pub name: Option<String>,
    pub goal: Option<String>,
    pub description: Option<String>,
    pub target_calories: Option<f64>,
    pub protein_percent: Option<u8>,
    pub carbs_percent: Option<u8>,
    pub fat_percent: Option<u8>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddDietMealParams {
    /// Diet ID
    pub diet_id: String,
    #[serde(flatten)]
    pub meal: MealParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveDietMealParams {
    /// Diet ID
    pub diet_id: String,
    /// 0-based meal index as shown by get_diet
    pub index: usize,
}

// ============================================================================
// Exercise Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddExerciseParams {
    pub name: String,
    /// cardio, strength, flexibility or functional
    pub kind: String,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    /// beginner, intermediate and/or advanced
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Estimated kcal burned per 30 minutes
    pub calories_per_30min: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListExercisesParams {
    /// Kind filter (optional)
    pub kind: Option<String>,
    /// Level filter (optional)
    pub level: Option<String>,
    /// Muscle group, exact name (optional)
    pub muscle_group: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateExerciseParams {
    pub id: String,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub muscle_groups: Option<Vec<String>>,
    pub levels: Option<Vec<String>>,
    pub description: Option<String>,
    pub calories_per_30min: Option<f64>,
}

// ============================================================================
// Routine Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRoutineParams {
    pub name: String,
    /// beginner, intermediate or advanced (default beginner)
    pub level: Option<String>,
    /// What the routine is for (required)
    pub objective: String,
    /// Training days per week, 1-7
    pub days_per_week: u8,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRoutinesParams {
    /// Level filter (optional)
    pub level: Option<String>,
    /// Name substring (optional)
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRoutineParams {
    pub id: String,
    pub name: Option<String>,
    pub level: Option<String>,
    pub objective: Option<String>,
    pub days_per_week: Option<u8>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRoutineExerciseParams {
    /// Routine ID
    pub routine_id: String,
    /// Catalog exercise ID
    pub exercise_id: String,
    /// Sets (ignored for cardio)
    pub sets: Option<u32>,
    /// Reps, e.g. "10-12" (ignored for cardio)
    pub reps: Option<String>,
    /// Duration, e.g. "30 min" (cardio only)
    pub duration: Option<String>,
    /// Rest between sets, e.g. "60 s"
    pub rest: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRoutineExerciseParams {
    /// Routine ID
    pub routine_id: String,
    /// 0-based exercise index as shown by get_routine
    pub index: usize,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutrisysService {
    // --- Status ---

    #[tool(description = "Get the current status of the Nutrisys service including build info, database status, and process information")]
    async fn nutrisys_status(&self) -> Result<CallToolResult, McpError> {
        let schema_version = self.database.with_conn(migrations::get_schema_version).ok();
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(schema_version);
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the consultation workflow guide. Call this at the start of a session or when unsure which tool to use.")]
    fn consultation_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CONSULTATION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CONSULTATION_INSTRUCTIONS)]))
    }

    #[tool(description = "Get the measurement guide: units, which inputs each derived value needs, and the formulas used.")]
    fn measurement_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::MEASUREMENT_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(MEASUREMENT_INSTRUCTIONS)]))
    }

    #[tool(description = "Practice overview: number of patients, diets, routines, foods and exercises, and patients per goal")]
    fn dashboard(&self) -> Result<CallToolResult, McpError> {
        let result = dashboard::dashboard(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Calculator ---

    #[tool(description = "Compute BMI, ideal weight, BMR, TDEE, body fat, lean mass and waist/hip ratio from raw measurements without saving anything. Weight and height are required.")]
    fn calculate_measurements(&self, Parameters(p): Parameters<CalculateMeasurementsParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::calculate_measurements(
            p.measurements.into(), p.age, &p.sex, &p.activity_level, self.ids.as_ref(), self.clock.as_ref(),
        ).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Classify a BMI value into its clinical band")]
    fn classify_bmi(&self, Parameters(p): Parameters<ClassifyBmiParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::classify_bmi(p.bmi).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Daily calorie target, macro split and macro grams for a goal. Unknown goals get maintenance targets (goal_recognized=false).")]
    fn goal_targets(&self, Parameters(p): Parameters<GoalTargetsParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::goal_targets(p.tdee, &p.goal).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Body fat % from Jackson-Pollock 3-site skinfolds (men: chest, abdominal, thigh; women: triceps, suprailiac, thigh)")]
    fn body_fat_from_skinfolds(&self, Parameters(p): Parameters<SkinfoldBodyFatParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::body_fat_from_skinfolds(p.skinfolds.into(), p.age, &p.sex)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Patients ---

    #[tool(description = "Register a patient (no id) or record a follow-up visit (with id). The full profile is replaced and the measurements become a new snapshot appended to the history. Notes and plan assignments are kept.")]
    fn save_patient(&self, Parameters(p): Parameters<SavePatientParams>) -> Result<CallToolResult, McpError> {
        let result = patients::save_patient(
            &self.database, self.ids.as_ref(), self.clock.as_ref(),
            p.id.as_deref(), p.profile.into(), p.measurements.into(),
        ).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the full patient record including measurement history and consultation notes")]
    fn get_patient(&self, Parameters(p): Parameters<PatientIdParams>) -> Result<CallToolResult, McpError> {
        let result = patients::get_patient(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(patient) => serde_json::to_string_pretty(&patient),
            None => serde_json::to_string_pretty(&not_found("Patient", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List patients, optionally filtered by a name fragment")]
    fn list_patients(&self, Parameters(p): Parameters<ListPatientsParams>) -> Result<CallToolResult, McpError> {
        let result = patients::list_patients(&self.database, p.query.as_deref()).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a patient and their whole history")]
    fn delete_patient(&self, Parameters(p): Parameters<PatientIdParams>) -> Result<CallToolResult, McpError> {
        let result = patients::delete_patient(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Clinical summary: BMI band, ideal body fat range, calorie target and macros for the patient's goal, assigned plans and the last 10 measurements")]
    fn patient_summary(&self, Parameters(p): Parameters<PatientIdParams>) -> Result<CallToolResult, McpError> {
        let result = patients::patient_summary(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(summary) => serde_json::to_string_pretty(&summary),
            None => serde_json::to_string_pretty(&not_found("Patient", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "All measurement snapshots of a patient, oldest first")]
    fn measurement_history(&self, Parameters(p): Parameters<PatientIdParams>) -> Result<CallToolResult, McpError> {
        let result = patients::measurement_history(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(history) => serde_json::to_string_pretty(&history),
            None => serde_json::to_string_pretty(&not_found("Patient", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Add a consultation note to a patient. Weight defaults to the current measurement.")]
    fn add_consultation_note(&self, Parameters(p): Parameters<AddConsultationNoteParams>) -> Result<CallToolResult, McpError> {
        let result = patients::add_consultation_note(
            &self.database, self.ids.as_ref(), self.clock.as_ref(),
            &p.patient_id, &p.note, p.weight_kg, p.observations,
        ).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Assign a diet to a patient, or clear the assignment by omitting diet_id")]
    fn assign_diet(&self, Parameters(p): Parameters<AssignDietParams>) -> Result<CallToolResult, McpError> {
        let result = patients::assign_diet(&self.database, &p.patient_id, p.diet_id.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Assign a routine to a patient, or clear the assignment by omitting routine_id")]
    fn assign_routine(&self, Parameters(p): Parameters<AssignRoutineParams>) -> Result<CallToolResult, McpError> {
        let result = patients::assign_routine(&self.database, &p.patient_id, p.routine_id.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Foods ---

    #[tool(description = "Add a food to the catalog with nutrition per standard portion")]
    fn add_food(&self, Parameters(p): Parameters<AddFoodParams>) -> Result<CallToolResult, McpError> {
        let form = FoodForm {
            name: p.name, category: p.category, suitable_goals: p.suitable_goals, portion_g: p.portion_g,
            nutrition: Nutrition {
                calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
                fiber: p.fiber, sodium: p.sodium, sugar: p.sugar,
            },
            notes: p.notes,
        };
        let result = foods::add_food(&self.database, self.ids.as_ref(), form).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a food with its nutrition and the diets that use it")]
    fn get_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::get_food(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(food) => serde_json::to_string_pretty(&food),
            None => serde_json::to_string_pretty(&not_found("Food", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List catalog foods, optionally by category, suitable goal and name")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_foods(&self.database, p.category.as_deref(), p.goal.as_deref(), p.name.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a food. Diet totals reflect the change immediately.")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        let changes = FoodChanges {
            name: p.name, category: p.category, suitable_goals: p.suitable_goals, portion_g: p.portion_g,
            calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
            fiber: p.fiber, sodium: p.sodium, sugar: p.sugar, notes: p.notes,
        };
        let result = foods::update_food(&self.database, &p.id, changes).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a food (only allowed if no diet uses it)")]
    fn delete_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::delete_food(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Diets ---

    #[tool(description = "Create a diet plan. Macro percentages must total 100; when omitted they follow the goal. Meal foods must exist in the catalog.")]
    fn create_diet(&self, Parameters(p): Parameters<CreateDietParams>) -> Result<CallToolResult, McpError> {
        let form = DietForm {
            name: p.name, goal: p.goal, description: p.description, target_calories: p.target_calories,
            macros: macro_split(p.protein_percent, p.carbs_percent, p.fat_percent)?,
            meals: p.meals.into_iter().map(Meal::from).collect(),
            duration_weeks: p.duration_weeks, instructions: p.instructions,
        };
        let result = diets::create_diet(&self.database, self.ids.as_ref(), self.clock.as_ref(), form)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a diet with each meal's nutrition, the totals and the difference from the calorie target")]
    fn get_diet(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = diets::get_diet(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(diet) => serde_json::to_string_pretty(&diet),
            None => serde_json::to_string_pretty(&not_found("Diet", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List diets, optionally by goal and name")]
    fn list_diets(&self, Parameters(p): Parameters<ListDietsParams>) -> Result<CallToolResult, McpError> {
        let result = diets::list_diets(&self.database, p.goal.as_deref(), p.name.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update diet fields other than meals (use add_diet_meal / remove_diet_meal for meals)")]
    fn update_diet(&self, Parameters(p): Parameters<UpdateDietParams>) -> Result<CallToolResult, McpError> {
        let changes = DietChanges {
            name: p.name, goal: p.goal, description: p.description, target_calories: p.target_calories,
            macros: macro_split(p.protein_percent, p.carbs_percent, p.fat_percent)?,
            duration_weeks: p.duration_weeks, instructions: p.instructions,
        };
        let result = diets::update_diet(&self.database, &p.id, changes).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a diet. Patients it was assigned to are left without a diet.")]
    fn delete_diet(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = diets::delete_diet(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Add a food line (grams) to a diet")]
    fn add_diet_meal(&self, Parameters(p): Parameters<AddDietMealParams>) -> Result<CallToolResult, McpError> {
        let result = diets::add_meal(&self.database, &p.diet_id, p.meal.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a meal line from a diet by its index")]
    fn remove_diet_meal(&self, Parameters(p): Parameters<RemoveDietMealParams>) -> Result<CallToolResult, McpError> {
        let result = diets::remove_meal(&self.database, &p.diet_id, p.index)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Exercises ---

    #[tool(description = "Add an exercise to the catalog")]
    fn add_exercise(&self, Parameters(p): Parameters<AddExerciseParams>) -> Result<CallToolResult, McpError> {
        let form = ExerciseForm {
            name: p.name, kind: p.kind, muscle_groups: p.muscle_groups, levels: p.levels,
            description: p.description, calories_per_30min: p.calories_per_30min,
        };
        let result = exercises::add_exercise(&self.database, self.ids.as_ref(), form)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get an exercise and the routines that use it")]
    fn get_exercise(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = exercises::get_exercise(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(exercise) => serde_json::to_string_pretty(&exercise),
            None => serde_json::to_string_pretty(&not_found("Exercise", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List catalog exercises, optionally by kind, level and muscle group")]
    fn list_exercises(&self, Parameters(p): Parameters<ListExercisesParams>) -> Result<CallToolResult, McpError> {
        let result = exercises::list_exercises(&self.database, p.kind.as_deref(), p.level.as_deref(), p.muscle_group.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an exercise")]
    fn update_exercise(&self, Parameters(p): Parameters<UpdateExerciseParams>) -> Result<CallToolResult, McpError> {
        let changes = ExerciseChanges {
            name: p.name, kind: p.kind, muscle_groups: p.muscle_groups, levels: p.levels,
            description: p.description, calories_per_30min: p.calories_per_30min,
        };
        let result = exercises::update_exercise(&self.database, &p.id, changes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete an exercise (only allowed if no routine uses it)")]
    fn delete_exercise(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = exercises::delete_exercise(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Routines ---

    #[tool(description = "Create an exercise routine (1-7 days per week)")]
    fn create_routine(&self, Parameters(p): Parameters<CreateRoutineParams>) -> Result<CallToolResult, McpError> {
        let form = RoutineForm {
            name: p.name, level: p.level, objective: p.objective, days_per_week: p.days_per_week,
            duration_weeks: p.duration_weeks, instructions: p.instructions,
        };
        let result = routines::create_routine(&self.database, self.ids.as_ref(), self.clock.as_ref(), form)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a routine with its exercises resolved against the catalog")]
    fn get_routine(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = routines::get_routine(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(routine) => serde_json::to_string_pretty(&routine),
            None => serde_json::to_string_pretty(&not_found("Routine", &p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List routines, optionally by level and name")]
    fn list_routines(&self, Parameters(p): Parameters<ListRoutinesParams>) -> Result<CallToolResult, McpError> {
        let result = routines::list_routines(&self.database, p.level.as_deref(), p.name.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update routine fields other than its exercises")]
    fn update_routine(&self, Parameters(p): Parameters<UpdateRoutineParams>) -> Result<CallToolResult, McpError> {
        let changes = RoutineChanges {
            name: p.name, level: p.level, objective: p.objective, days_per_week: p.days_per_week,
            duration_weeks: p.duration_weeks, instructions: p.instructions,
        };
        let result = routines::update_routine(&self.database, &p.id, changes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a routine. Patients it was assigned to are left without a routine.")]
    fn delete_routine(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = routines::delete_routine(&self.database, &p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Add a catalog exercise to a routine. Cardio keeps only the duration; other kinds keep sets and reps.")]
    fn add_routine_exercise(&self, Parameters(p): Parameters<AddRoutineExerciseParams>) -> Result<CallToolResult, McpError> {
        let prescription = Prescription {
            sets: p.sets, reps: p.reps, duration: p.duration, rest: p.rest, notes: p.notes,
        };
        let result = routines::add_routine_exercise(&self.database, &p.routine_id, &p.exercise_id, prescription)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove an exercise from a routine by its index")]
    fn remove_routine_exercise(&self, Parameters(p): Parameters<RemoveRoutineExerciseParams>) -> Result<CallToolResult, McpError> {
        let result = routines::remove_routine_exercise(&self.database, &p.routine_id, p.index)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for NutrisysService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrisys".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Nutrisys".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Nutrisys - Nutrition practice records with anthropometric calculations. \
                 IMPORTANT: Call consultation_instructions first; measurement_instructions explains units and formulas. \
                 Calculator: calculate_measurements, classify_bmi, goal_targets, body_fat_from_skinfolds. \
                 Patients: save_patient, get_patient, list_patients, delete_patient, patient_summary, \
                 measurement_history, add_consultation_note, assign_diet, assign_routine. \
                 Foods: add/get/list/update/delete_food. \
                 Diets: create/get/list/update/delete_diet, add_diet_meal, remove_diet_meal. \
                 Exercises: add/get/list/update/delete_exercise. \
                 Routines: create/get/list/update/delete_routine, add_routine_exercise, remove_routine_exercise. \
                 Overview: dashboard, nutrisys_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_escapes_id() {
        let id = r#"a"b\c"#;
        let body = serde_json::to_string_pretty(&not_found("Patient", id)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["error"], "Patient not found");
        assert_eq!(parsed["id"], id);
    }

    #[test]
    fn test_macro_split_all_or_none() {
        assert_eq!(macro_split(None, None, None).unwrap(), None);
        assert_eq!(
            macro_split(Some(30), Some(40), Some(30)).unwrap(),
            Some(MacroDistribution { protein: 30, carbs: 40, fat: 30 })
        );
        assert!(macro_split(Some(30), None, Some(30)).is_err());
    }

    #[test]
    fn test_measurement_params_flatten() {
        let params: SavePatientParams = serde_json::from_value(serde_json::json!({
            "first_name": "Ana",
            "last_name": "Lopez",
            "sex": "female",
            "age": 34,
            "activity_level": "light",
            "weight_kg": 62.0,
            "height_cm": 165.0,
            "waist_cm": 80.0,
            "triceps_mm": 15.0
        }))
        .unwrap();

        assert_eq!(params.id, None);
        let input: MeasurementInput = params.measurements.into();
        assert_eq!(input.weight_kg, Some(62.0));
        assert_eq!(input.circumferences.waist, Some(80.0));
        assert_eq!(input.skinfolds.triceps, Some(15.0));
        let form: PatientForm = params.profile.into();
        assert_eq!(form.first_name, "Ana");
    }
}
