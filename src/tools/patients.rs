//! Patient Tools
//!
//! Saving a patient always records a new measurement snapshot.

use serde::Serialize;

use crate::calc::{
    calorie_target_for_goal, complete_snapshot, ideal_body_fat_range,
    macro_distribution_for_goal, ActivityLevel, BodyFatRange, Clock, Goal, IdGenerator,
    MacroDistribution, MeasurementInput, MeasurementSnapshot, Sex,
};
use crate::db::Database;
use crate::models::{
    ConsultationNote, Diet, DietaryAssessment, Lifestyle, MedicalHistory, Patient, PatientGoals,
    PatientProfile, Routine,
};
use super::calculator::{
    check_body_size, parse_activity_level, parse_goal, parse_sex, BmiClassificationResponse,
};

/// How many history points the summary shows
const SUMMARY_HISTORY_POINTS: usize = 10;

/// Patient profile as entered, with enum fields still as labels
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub age: u32,
    pub activity_level: String,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub medical_history: MedicalHistory,
    pub lifestyle: Lifestyle,
    pub goal: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub target_body_fat_percent: Option<f64>,
    pub target_date: Option<String>,
    pub goal_notes: Option<String>,
    pub dietary_assessment: DietaryAssessment,
}

impl PatientForm {
    /// Validate and convert into a stored profile
    pub fn into_profile(self) -> Result<PatientProfile, String> {
        let first_name = self.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err("first_name is required".to_string());
        }
        let last_name = self.last_name.trim().to_string();
        if last_name.is_empty() {
            return Err("last_name is required".to_string());
        }
        if self.age == 0 {
            return Err("age must be greater than 0".to_string());
        }
        if let Some(level) = self.lifestyle.stress_level {
            if !(1..=10).contains(&level) {
                return Err("stress_level must be between 1 and 10".to_string());
            }
        }

        Ok(PatientProfile {
            first_name,
            last_name,
            sex: parse_sex(&self.sex)?,
            age: self.age,
            activity_level: parse_activity_level(&self.activity_level)?,
            birth_date: self.birth_date,
            phone: self.phone,
            email: self.email,
            occupation: self.occupation,
            medical_history: self.medical_history,
            lifestyle: self.lifestyle,
            goals: PatientGoals {
                target_weight_kg: self.target_weight_kg,
                target_body_fat_percent: self.target_body_fat_percent,
                goal: parse_goal(self.goal.as_deref())?,
                target_date: self.target_date,
                notes: self.goal_notes,
            },
            dietary_assessment: self.dietary_assessment,
        })
    }
}

/// Response for save_patient
#[derive(Debug, Serialize)]
pub struct SavePatientResponse {
    pub id: String,
    pub full_name: String,
    pub created: bool,
    pub snapshot: MeasurementSnapshot,
    pub history_length: usize,
}

/// One row of list_patients
#[derive(Debug, Serialize)]
pub struct PatientListItem {
    pub id: String,
    pub full_name: String,
    pub sex: Sex,
    pub age: u32,
    pub goal: Option<Goal>,
    pub current_weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub last_consultation_at: Option<String>,
}

impl From<&Patient> for PatientListItem {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id.clone(),
            full_name: p.full_name(),
            sex: p.profile.sex,
            age: p.profile.age,
            goal: p.profile.goals.goal,
            current_weight_kg: p.current_weight(),
            bmi: p.current_measurements.as_ref().map(|m| m.bmi),
            last_consultation_at: p.last_consultation_at.clone(),
        }
    }
}

/// Response for list_patients
#[derive(Debug, Serialize)]
pub struct ListPatientsResponse {
    pub patients: Vec<PatientListItem>,
    pub total: usize,
}

/// Name of an assigned diet or routine
#[derive(Debug, Serialize)]
pub struct AssignedPlan {
    pub id: String,
    /// `None` when the plan no longer exists
    pub name: Option<String>,
}

/// Compact history entry for trend display
#[derive(Debug, Serialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    pub weight_kg: f64,
    pub bmi: f64,
    pub body_fat_percent: Option<f64>,
}

/// Response for patient_summary
#[derive(Debug, Serialize)]
pub struct PatientSummaryResponse {
    pub id: String,
    pub full_name: String,
    pub sex: Sex,
    pub age: u32,
    pub activity_level: ActivityLevel,
    pub goal: Option<Goal>,
    pub current: Option<MeasurementSnapshot>,
    pub bmi_classification: Option<BmiClassificationResponse>,
    pub ideal_body_fat_range: BodyFatRange,
    pub calorie_target: Option<i64>,
    pub macros: MacroDistribution,
    pub assigned_diet: Option<AssignedPlan>,
    pub assigned_routine: Option<AssignedPlan>,
    pub recent_history: Vec<HistoryPoint>,
    pub consultation_count: usize,
    pub last_consultation_at: Option<String>,
}

/// Response for measurement_history
#[derive(Debug, Serialize)]
pub struct MeasurementHistoryResponse {
    pub patient_id: String,
    pub entries: Vec<MeasurementSnapshot>,
    pub total: usize,
}

/// Response for add_consultation_note
#[derive(Debug, Serialize)]
pub struct AddConsultationNoteResponse {
    pub patient_id: String,
    pub note: ConsultationNote,
    pub total_notes: usize,
}

/// Response for assign_diet / assign_routine
#[derive(Debug, Serialize)]
pub struct AssignPlanResponse {
    pub patient_id: String,
    pub plan: Option<AssignedPlan>,
}

/// Response for delete_patient
#[derive(Debug, Serialize)]
pub struct DeletePatientResponse {
    pub success: bool,
    pub deleted_id: String,
}

/// Create a patient (no id) or update one (id given).
///
/// Weight and height are required on every save. The measurements are
/// completed into a new snapshot that becomes current and is appended to the
/// history. Registration time, notes and plan assignments of an existing
/// patient are kept.
pub fn save_patient(
    db: &Database,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
    id: Option<&str>,
    form: PatientForm,
    mut measurements: MeasurementInput,
) -> Result<SavePatientResponse, String> {
    let profile = form.into_profile()?;
    check_body_size(&measurements)?;

    // Each save is a new visit
    measurements.id = None;
    measurements.timestamp = None;
    let snapshot = complete_snapshot(
        &measurements,
        profile.age,
        profile.sex,
        profile.activity_level,
        ids,
        clock,
    )
    .map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let now = clock.timestamp();

    let (mut patient, created) = match id {
        Some(id) => {
            let existing = Patient::get_by_id(&conn, id)
                .map_err(|e| format!("Failed to get patient: {}", e))?
                .ok_or_else(|| format!("Patient not found with id: {}", id))?;
            (existing, false)
        }
        None => (Patient::new(ids.next_id(), profile.clone(), now.clone()), true),
    };

    patient.profile = profile;
    patient.record_measurement(snapshot.clone());
    patient.last_consultation_at = Some(now);

    patient
        .save(&conn)
        .map_err(|e| format!("Failed to save patient: {}", e))?;

    tracing::info!(
        "Saved patient {} ({}), {} measurement(s)",
        patient.id,
        if created { "new" } else { "updated" },
        patient.measurement_history.len()
    );

    Ok(SavePatientResponse {
        full_name: patient.full_name(),
        history_length: patient.measurement_history.len(),
        id: patient.id,
        created,
        snapshot,
    })
}

/// Get the full patient record
pub fn get_patient(db: &Database, id: &str) -> Result<Option<Patient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Patient::get_by_id(&conn, id).map_err(|e| format!("Failed to get patient: {}", e))
}

/// List patients, optionally matching a name fragment
pub fn list_patients(db: &Database, query: Option<&str>) -> Result<ListPatientsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let patients = Patient::search(&conn, query.unwrap_or(""))
        .map_err(|e| format!("Failed to list patients: {}", e))?;

    let patients: Vec<PatientListItem> = patients.iter().map(PatientListItem::from).collect();
    let total = patients.len();
    Ok(ListPatientsResponse { patients, total })
}

pub fn delete_patient(db: &Database, id: &str) -> Result<DeletePatientResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Patient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete patient: {}", e))?;
    if !deleted {
        return Err(format!("Patient not found with id: {}", id));
    }

    tracing::info!("Deleted patient {}", id);
    Ok(DeletePatientResponse {
        success: true,
        deleted_id: id.to_string(),
    })
}

/// Clinical overview: classification, targets, plans and recent trend
pub fn patient_summary(db: &Database, id: &str) -> Result<Option<PatientSummaryResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(patient) = Patient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get patient: {}", e))?
    else {
        return Ok(None);
    };

    let goal = patient.profile.goals.goal;
    let current = patient.current_measurements.clone();

    let assigned_diet = match &patient.assigned_diet_id {
        Some(diet_id) => {
            let diet = Diet::get_by_id(&conn, diet_id)
                .map_err(|e| format!("Failed to get diet: {}", e))?;
            Some(AssignedPlan {
                id: diet_id.clone(),
                name: diet.map(|d| d.name),
            })
        }
        None => None,
    };
    let assigned_routine = match &patient.assigned_routine_id {
        Some(routine_id) => {
            let routine = Routine::get_by_id(&conn, routine_id)
                .map_err(|e| format!("Failed to get routine: {}", e))?;
            Some(AssignedPlan {
                id: routine_id.clone(),
                name: routine.map(|r| r.name),
            })
        }
        None => None,
    };

    let skip = patient
        .measurement_history
        .len()
        .saturating_sub(SUMMARY_HISTORY_POINTS);
    let recent_history = patient
        .measurement_history
        .iter()
        .skip(skip)
        .map(|m| HistoryPoint {
            timestamp: m.timestamp.clone(),
            weight_kg: m.weight_kg,
            bmi: m.bmi,
            body_fat_percent: m.body_fat_percent,
        })
        .collect();

    Ok(Some(PatientSummaryResponse {
        full_name: patient.full_name(),
        id: patient.id,
        sex: patient.profile.sex,
        age: patient.profile.age,
        activity_level: patient.profile.activity_level,
        goal,
        bmi_classification: current
            .as_ref()
            .map(|m| BmiClassificationResponse::for_bmi(m.bmi)),
        ideal_body_fat_range: ideal_body_fat_range(patient.profile.sex),
        calorie_target: current
            .as_ref()
            .map(|m| calorie_target_for_goal(m.tdee_kcal, goal)),
        macros: macro_distribution_for_goal(goal),
        current,
        assigned_diet,
        assigned_routine,
        recent_history,
        consultation_count: patient.consultation_notes.len(),
        last_consultation_at: patient.last_consultation_at,
    }))
}

/// All snapshots of a patient, oldest first
pub fn measurement_history(
    db: &Database,
    id: &str,
) -> Result<Option<MeasurementHistoryResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let patient = Patient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get patient: {}", e))?;

    Ok(patient.map(|p| MeasurementHistoryResponse {
        total: p.measurement_history.len(),
        patient_id: p.id,
        entries: p.measurement_history,
    }))
}

/// Record a consultation note. Weight defaults to the current measurement.
pub fn add_consultation_note(
    db: &Database,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
    patient_id: &str,
    note: &str,
    weight_kg: Option<f64>,
    observations: Option<String>,
) -> Result<AddConsultationNoteResponse, String> {
    let note = note.trim();
    if note.is_empty() {
        return Err("note cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut patient = Patient::get_by_id(&conn, patient_id)
        .map_err(|e| format!("Failed to get patient: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    let entry = ConsultationNote {
        id: ids.next_id(),
        timestamp: clock.timestamp(),
        note: note.to_string(),
        weight_kg: weight_kg.or_else(|| patient.current_weight()),
        observations,
    };

    patient.last_consultation_at = Some(entry.timestamp.clone());
    patient.consultation_notes.push(entry.clone());
    patient
        .save(&conn)
        .map_err(|e| format!("Failed to save patient: {}", e))?;

    Ok(AddConsultationNoteResponse {
        patient_id: patient.id,
        total_notes: patient.consultation_notes.len(),
        note: entry,
    })
}

/// Assign a diet to a patient, or clear it with `None`
pub fn assign_diet(
    db: &Database,
    patient_id: &str,
    diet_id: Option<&str>,
) -> Result<AssignPlanResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut patient = Patient::get_by_id(&conn, patient_id)
        .map_err(|e| format!("Failed to get patient: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    let plan = match diet_id {
        Some(diet_id) => {
            let diet = Diet::get_by_id(&conn, diet_id)
                .map_err(|e| format!("Failed to get diet: {}", e))?
                .ok_or_else(|| format!("Diet not found with id: {}", diet_id))?;
            Some(AssignedPlan {
                id: diet.id,
                name: Some(diet.name),
            })
        }
        None => None,
    };

    patient.assigned_diet_id = plan.as_ref().map(|p| p.id.clone());
    patient
        .save(&conn)
        .map_err(|e| format!("Failed to save patient: {}", e))?;

    Ok(AssignPlanResponse {
        patient_id: patient.id,
        plan,
    })
}

/// Assign a routine to a patient, or clear it with `None`
pub fn assign_routine(
    db: &Database,
    patient_id: &str,
    routine_id: Option<&str>,
) -> Result<AssignPlanResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut patient = Patient::get_by_id(&conn, patient_id)
        .map_err(|e| format!("Failed to get patient: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    let plan = match routine_id {
        Some(routine_id) => {
            let routine = Routine::get_by_id(&conn, routine_id)
                .map_err(|e| format!("Failed to get routine: {}", e))?
                .ok_or_else(|| format!("Routine not found with id: {}", routine_id))?;
            Some(AssignedPlan {
                id: routine.id,
                name: Some(routine.name),
            })
        }
        None => None,
    };

    patient.assigned_routine_id = plan.as_ref().map(|p| p.id.clone());
    patient
        .save(&conn)
        .map_err(|e| format!("Failed to save patient: {}", e))?;

    Ok(AssignPlanResponse {
        patient_id: patient.id,
        plan,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::{migrated_db, FixedClock, SequentialIds};

    pub(crate) fn form(first: &str, last: &str) -> PatientForm {
        PatientForm {
            first_name: first.to_string(),
            last_name: last.to_string(),
            sex: "male".to_string(),
            age: 30,
            activity_level: "moderate".to_string(),
            goal: Some("reduce_weight".to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn measurements(weight: f64) -> MeasurementInput {
        MeasurementInput {
            weight_kg: Some(weight),
            height_cm: Some(175.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_new_patient() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();

        let r = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), measurements(70.0))
            .unwrap();
        assert!(r.created);
        assert_eq!(r.full_name, "Juan Perez");
        assert_eq!(r.snapshot.bmi, 22.86);
        assert_eq!(r.history_length, 1);

        let patient = get_patient(&db, &r.id).unwrap().unwrap();
        assert_eq!(patient.registered_at, "2026-01-15T09:30:00Z");
        assert_eq!(patient.last_consultation_at.as_deref(), Some("2026-01-15T09:30:00Z"));
        assert_eq!(patient.profile.goals.goal, Some(Goal::ReduceWeight));
    }

    #[test]
    fn test_save_twice_appends_history() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let first_visit = FixedClock::default();
        let second_visit = FixedClock::at("2026-02-15T09:30:00Z");

        let r = save_patient(&db, &ids, &first_visit, None, form("Juan", "Perez"), measurements(70.0))
            .unwrap();
        add_consultation_note(&db, &ids, &first_visit, &r.id, "First visit", None, None).unwrap();

        let r2 = save_patient(
            &db,
            &ids,
            &second_visit,
            Some(&r.id),
            form("Juan", "Perez"),
            measurements(68.0),
        )
        .unwrap();
        assert!(!r2.created);
        assert_eq!(r2.history_length, 2);

        let patient = get_patient(&db, &r.id).unwrap().unwrap();
        assert_eq!(patient.measurement_history.len(), 2);
        assert_eq!(patient.current_weight(), Some(68.0));
        assert_eq!(patient.current_measurements.as_ref(), patient.measurement_history.last());
        assert_eq!(patient.registered_at, "2026-01-15T09:30:00Z");
        assert_eq!(patient.consultation_notes.len(), 1);
        assert_ne!(patient.measurement_history[0].id, patient.measurement_history[1].id);
    }

    #[test]
    fn test_save_requires_weight_and_height() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();

        let err = save_patient(
            &db,
            &ids,
            &clock,
            None,
            form("Juan", "Perez"),
            MeasurementInput::default(),
        )
        .unwrap_err();
        assert_eq!(err, "Missing required field: weight_kg");
        assert_eq!(list_patients(&db, None).unwrap().total, 0);
    }

    #[test]
    fn test_save_rejects_negative_height() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();

        let mut bad = measurements(70.0);
        bad.height_cm = Some(-175.0);
        let err = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), bad).unwrap_err();
        assert_eq!(err, "height_cm must be a positive number");
        assert_eq!(list_patients(&db, None).unwrap().total, 0);
    }

    #[test]
    fn test_save_validation() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();

        let mut bad = form(" ", "Perez");
        assert!(save_patient(&db, &ids, &clock, None, bad.clone(), measurements(70.0)).is_err());

        bad = form("Juan", "Perez");
        bad.age = 0;
        assert!(save_patient(&db, &ids, &clock, None, bad.clone(), measurements(70.0)).is_err());

        bad = form("Juan", "Perez");
        bad.activity_level = "couch".to_string();
        let err = save_patient(&db, &ids, &clock, None, bad, measurements(70.0)).unwrap_err();
        assert!(err.contains("activity_level"));
    }

    #[test]
    fn test_update_unknown_patient() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let err = save_patient(
            &db,
            &ids,
            &clock,
            Some("ghost"),
            form("Juan", "Perez"),
            measurements(70.0),
        )
        .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_summary_targets() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let r = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), measurements(70.0))
            .unwrap();

        let summary = patient_summary(&db, &r.id).unwrap().unwrap();
        // TDEE 2628.29 * 0.8
        assert_eq!(summary.calorie_target, Some(2103));
        assert_eq!(summary.macros, MacroDistribution { protein: 35, carbs: 35, fat: 30 });
        assert_eq!(summary.recent_history.len(), 1);
        assert!(summary.assigned_diet.is_none());

        assert!(patient_summary(&db, "ghost").unwrap().is_none());
    }

    #[test]
    fn test_summary_history_capped() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let r = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), measurements(80.0))
            .unwrap();
        for i in 1..12 {
            save_patient(
                &db,
                &ids,
                &clock,
                Some(&r.id),
                form("Juan", "Perez"),
                measurements(80.0 - i as f64),
            )
            .unwrap();
        }

        let summary = patient_summary(&db, &r.id).unwrap().unwrap();
        assert_eq!(summary.recent_history.len(), 10);
        assert_eq!(summary.recent_history.last().unwrap().weight_kg, 69.0);

        let history = measurement_history(&db, &r.id).unwrap().unwrap();
        assert_eq!(history.total, 12);
    }

    #[test]
    fn test_consultation_note_defaults_weight() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let r = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), measurements(70.0))
            .unwrap();

        let added =
            add_consultation_note(&db, &ids, &clock, &r.id, "Doing well", None, None).unwrap();
        assert_eq!(added.note.weight_kg, Some(70.0));

        let added =
            add_consultation_note(&db, &ids, &clock, &r.id, "Scale at home", Some(69.2), None)
                .unwrap();
        assert_eq!(added.note.weight_kg, Some(69.2));
        assert_eq!(added.total_notes, 2);

        assert!(add_consultation_note(&db, &ids, &clock, &r.id, "  ", None, None).is_err());
    }

    #[test]
    fn test_assign_requires_existing_plan() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let r = save_patient(&db, &ids, &clock, None, form("Juan", "Perez"), measurements(70.0))
            .unwrap();

        assert!(assign_diet(&db, &r.id, Some("no-diet")).is_err());
        assert!(assign_routine(&db, &r.id, Some("no-routine")).is_err());
        assert!(assign_diet(&db, "ghost", None).is_err());
    }

    #[test]
    fn test_list_and_delete() {
        let db = migrated_db();
        let ids = SequentialIds::new("id");
        let clock = FixedClock::default();
        let a = save_patient(&db, &ids, &clock, None, form("Ana", "Lopez"), measurements(60.0))
            .unwrap();
        save_patient(&db, &ids, &clock, None, form("Luis", "Garcia"), measurements(80.0)).unwrap();

        let found = list_patients(&db, Some("lop")).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.patients[0].bmi, Some(19.59));

        delete_patient(&db, &a.id).unwrap();
        assert!(delete_patient(&db, &a.id).is_err());
        assert_eq!(list_patients(&db, None).unwrap().total, 1);
    }
}
