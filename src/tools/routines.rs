//! Exercise Routine Tools

use std::collections::HashMap;

use serde::Serialize;

use crate::calc::{Clock, IdGenerator};
use crate::db::Database;
use crate::models::{
    Exercise, ExerciseKind, ExerciseLevel, Patient, Prescription, Routine, RoutineCreate,
    RoutineExercise, RoutineUpdate,
};
use super::exercises::parse_level;

fn validate_days(days: u8) -> Result<(), String> {
    if !(1..=7).contains(&days) {
        return Err("days_per_week must be between 1 and 7".to_string());
    }
    Ok(())
}

/// Routine as entered, level still a label
#[derive(Debug, Clone, Default)]
pub struct RoutineForm {
    pub name: String,
    pub level: Option<String>,
    pub objective: String,
    pub days_per_week: u8,
    pub duration_weeks: Option<u32>,
    pub instructions: String,
}

/// Field changes for update_routine
#[derive(Debug, Clone, Default)]
pub struct RoutineChanges {
    pub name: Option<String>,
    pub level: Option<String>,
    pub objective: Option<String>,
    pub days_per_week: Option<u8>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

/// Response for create_routine
#[derive(Debug, Serialize)]
pub struct CreateRoutineResponse {
    pub id: String,
    pub name: String,
    pub level: ExerciseLevel,
    pub days_per_week: u8,
}

/// A routine entry with its exercise resolved
#[derive(Debug, Serialize)]
pub struct RoutineExerciseDetail {
    pub index: usize,
    #[serde(flatten)]
    pub entry: RoutineExercise,
    /// `None` when the exercise has left the catalog
    pub exercise_name: Option<String>,
    pub kind: Option<ExerciseKind>,
}

/// Full routine with resolved exercises
#[derive(Debug, Serialize)]
pub struct RoutineDetail {
    pub id: String,
    pub name: String,
    pub level: ExerciseLevel,
    pub objective: String,
    pub days_per_week: u8,
    pub exercises: Vec<RoutineExerciseDetail>,
    pub duration_weeks: Option<u32>,
    pub instructions: String,
    pub created_at: String,
}

/// Routine summary for list results
#[derive(Debug, Serialize)]
pub struct RoutineSummary {
    pub id: String,
    pub name: String,
    pub level: ExerciseLevel,
    pub objective: String,
    pub days_per_week: u8,
    pub exercise_count: usize,
}

impl From<&Routine> for RoutineSummary {
    fn from(r: &Routine) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            level: r.level,
            objective: r.objective.clone(),
            days_per_week: r.days_per_week,
            exercise_count: r.exercises.len(),
        }
    }
}

/// Response for list_routines
#[derive(Debug, Serialize)]
pub struct ListRoutinesResponse {
    pub routines: Vec<RoutineSummary>,
    pub total: usize,
}

/// Response for routine edits
#[derive(Debug, Serialize)]
pub struct RoutineChangeResponse {
    pub success: bool,
    pub id: String,
    pub exercise_count: usize,
}

/// Response for delete_routine
#[derive(Debug, Serialize)]
pub struct DeleteRoutineResponse {
    pub success: bool,
    pub deleted_id: String,
    pub unassigned_patients: Vec<String>,
}

pub fn create_routine(
    db: &Database,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
    form: RoutineForm,
) -> Result<CreateRoutineResponse, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Routine name cannot be empty".to_string());
    }
    let objective = form.objective.trim();
    if objective.is_empty() {
        return Err("Routine objective cannot be empty".to_string());
    }
    validate_days(form.days_per_week)?;
    let level = match form.level.as_deref() {
        Some(label) => parse_level(label)?,
        None => ExerciseLevel::default(),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let routine = Routine::create(
        &conn,
        ids,
        clock.timestamp(),
        RoutineCreate {
            name: name.to_string(),
            level,
            objective: objective.to_string(),
            days_per_week: form.days_per_week,
            duration_weeks: form.duration_weeks,
            instructions: form.instructions,
        },
    )
    .map_err(|e| format!("Failed to create routine: {}", e))?;

    tracing::info!("Created routine {}", routine.id);

    Ok(CreateRoutineResponse {
        id: routine.id,
        name: routine.name,
        level: routine.level,
        days_per_week: routine.days_per_week,
    })
}

pub fn get_routine(db: &Database, id: &str) -> Result<Option<RoutineDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(routine) = Routine::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get routine: {}", e))?
    else {
        return Ok(None);
    };

    let catalog: HashMap<String, Exercise> = Exercise::list(&conn, None, None, None)
        .map_err(|e| format!("Failed to load exercises: {}", e))?
        .into_iter()
        .map(|e| (e.id.clone(), e))
        .collect();

    let exercises = routine
        .exercises
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let exercise = catalog.get(&entry.exercise_id);
            RoutineExerciseDetail {
                index,
                exercise_name: exercise.map(|e| e.name.clone()),
                kind: exercise.map(|e| e.kind),
                entry,
            }
        })
        .collect();

    Ok(Some(RoutineDetail {
        id: routine.id,
        name: routine.name,
        level: routine.level,
        objective: routine.objective,
        days_per_week: routine.days_per_week,
        exercises,
        duration_weeks: routine.duration_weeks,
        instructions: routine.instructions,
        created_at: routine.created_at,
    }))
}

pub fn list_routines(
    db: &Database,
    level: Option<&str>,
    name: Option<&str>,
) -> Result<ListRoutinesResponse, String> {
    let level = level.map(parse_level).transpose()?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let routines = Routine::list(&conn, level, name.map(str::trim).filter(|s| !s.is_empty()))
        .map_err(|e| format!("Failed to list routines: {}", e))?;

    let routines: Vec<RoutineSummary> = routines.iter().map(RoutineSummary::from).collect();
    let total = routines.len();
    Ok(ListRoutinesResponse { routines, total })
}

pub fn update_routine(
    db: &Database,
    id: &str,
    changes: RoutineChanges,
) -> Result<RoutineChangeResponse, String> {
    for (field, value) in [("name", &changes.name), ("objective", &changes.objective)] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(format!("Routine {} cannot be empty", field));
        }
    }
    if let Some(days) = changes.days_per_week {
        validate_days(days)?;
    }

    let data = RoutineUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        level: changes.level.as_deref().map(parse_level).transpose()?,
        objective: changes.objective.map(|o| o.trim().to_string()),
        days_per_week: changes.days_per_week,
        duration_weeks: changes.duration_weeks,
        instructions: changes.instructions,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let routine = Routine::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update routine: {}", e))?
        .ok_or_else(|| format!("Routine not found with id: {}", id))?;

    Ok(RoutineChangeResponse {
        success: true,
        exercise_count: routine.exercises.len(),
        id: routine.id,
    })
}

/// Delete a routine and clear it from every patient it was assigned to
pub fn delete_routine(db: &Database, id: &str) -> Result<DeleteRoutineResponse, String> {
    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let tx = conn
        .transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    if !Routine::delete(&tx, id).map_err(|e| format!("Failed to delete routine: {}", e))? {
        return Err(format!("Routine not found with id: {}", id));
    }

    let mut unassigned_patients = Vec::new();
    let patients = Patient::list(&tx).map_err(|e| format!("Failed to list patients: {}", e))?;
    for mut patient in patients {
        if patient.assigned_routine_id.as_deref() == Some(id) {
            patient.assigned_routine_id = None;
            patient
                .save(&tx)
                .map_err(|e| format!("Failed to update patient: {}", e))?;
            unassigned_patients.push(patient.id);
        }
    }

    tx.commit().map_err(|e| format!("Database error: {}", e))?;
    tracing::info!(
        "Deleted routine {} ({} patient(s) unassigned)",
        id,
        unassigned_patients.len()
    );

    Ok(DeleteRoutineResponse {
        success: true,
        deleted_id: id.to_string(),
        unassigned_patients,
    })
}

/// Add a catalog exercise to a routine.
///
/// Cardio entries keep only the duration; other kinds keep sets and reps.
pub fn add_routine_exercise(
    db: &Database,
    routine_id: &str,
    exercise_id: &str,
    prescription: Prescription,
) -> Result<RoutineChangeResponse, String> {
    if prescription.sets == Some(0) {
        return Err("sets must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut routine = Routine::get_by_id(&conn, routine_id)
        .map_err(|e| format!("Failed to get routine: {}", e))?
        .ok_or_else(|| format!("Routine not found with id: {}", routine_id))?;
    let exercise = Exercise::get_by_id(&conn, exercise_id)
        .map_err(|e| format!("Failed to get exercise: {}", e))?
        .ok_or_else(|| format!("Exercise not found with id: {}", exercise_id))?;

    routine
        .exercises
        .push(RoutineExercise::prescribe(&exercise, prescription));
    routine
        .save(&conn)
        .map_err(|e| format!("Failed to save routine: {}", e))?;

    Ok(RoutineChangeResponse {
        success: true,
        exercise_count: routine.exercises.len(),
        id: routine.id,
    })
}

/// Remove the routine entry at `index` (0-based, as shown by get_routine)
pub fn remove_routine_exercise(
    db: &Database,
    routine_id: &str,
    index: usize,
) -> Result<RoutineChangeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let mut routine = Routine::get_by_id(&conn, routine_id)
        .map_err(|e| format!("Failed to get routine: {}", e))?
        .ok_or_else(|| format!("Routine not found with id: {}", routine_id))?;

    if index >= routine.exercises.len() {
        return Err(format!(
            "Exercise index {} out of range (routine has {} exercise(s))",
            index,
            routine.exercises.len()
        ));
    }
    routine.exercises.remove(index);
    routine
        .save(&conn)
        .map_err(|e| format!("Failed to save routine: {}", e))?;

    Ok(RoutineChangeResponse {
        success: true,
        exercise_count: routine.exercises.len(),
        id: routine.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_db, FixedClock, SequentialIds};
    use crate::tools::patients::{self, tests as patient_fixtures};

    fn form() -> RoutineForm {
        RoutineForm {
            name: "Full body A".to_string(),
            level: Some("beginner".to_string()),
            objective: "General conditioning".to_string(),
            days_per_week: 3,
            duration_weeks: Some(6),
            instructions: String::new(),
        }
    }

    fn prescription() -> Prescription {
        Prescription {
            sets: Some(3),
            reps: Some("12".to_string()),
            duration: Some("20 min".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_routine_validation() {
        let db = migrated_db();
        let ids = SequentialIds::new("r");
        let clock = FixedClock::default();

        let mut bad = form();
        bad.days_per_week = 8;
        assert_eq!(
            create_routine(&db, &ids, &clock, bad).unwrap_err(),
            "days_per_week must be between 1 and 7"
        );

        let mut bad = form();
        bad.objective = " ".to_string();
        assert!(create_routine(&db, &ids, &clock, bad).is_err());

        let mut bad = form();
        bad.level = Some("expert".to_string());
        assert!(create_routine(&db, &ids, &clock, bad).is_err());

        let created = create_routine(&db, &ids, &clock, form()).unwrap();
        assert_eq!(created.level, ExerciseLevel::Beginner);
    }

    #[test]
    fn test_routine_exercises() {
        let db = migrated_db();
        let ids = SequentialIds::new("r");
        let clock = FixedClock::default();
        let created = create_routine(&db, &ids, &clock, form()).unwrap();

        add_routine_exercise(&db, &created.id, "exercise-7", prescription()).unwrap();
        let changed =
            add_routine_exercise(&db, &created.id, "exercise-14", prescription()).unwrap();
        assert_eq!(changed.exercise_count, 2);
        assert!(add_routine_exercise(&db, &created.id, "exercise-999", prescription()).is_err());

        let detail = get_routine(&db, &created.id).unwrap().unwrap();
        let squat = &detail.exercises[0];
        assert_eq!(squat.exercise_name.as_deref(), Some("Squat"));
        assert_eq!(squat.entry.sets, Some(3));
        assert_eq!(squat.entry.duration, None);
        let running = &detail.exercises[1];
        assert_eq!(running.kind, Some(ExerciseKind::Cardio));
        assert_eq!(running.entry.sets, None);
        assert_eq!(running.entry.duration.as_deref(), Some("20 min"));

        assert!(remove_routine_exercise(&db, &created.id, 2).is_err());
        let changed = remove_routine_exercise(&db, &created.id, 0).unwrap();
        assert_eq!(changed.exercise_count, 1);
    }

    #[test]
    fn test_update_and_list_routines() {
        let db = migrated_db();
        let ids = SequentialIds::new("r");
        let clock = FixedClock::default();
        let created = create_routine(&db, &ids, &clock, form()).unwrap();

        assert!(update_routine(
            &db,
            &created.id,
            RoutineChanges {
                days_per_week: Some(0),
                ..Default::default()
            }
        )
        .is_err());

        update_routine(
            &db,
            &created.id,
            RoutineChanges {
                level: Some("advanced".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(list_routines(&db, Some("advanced"), None).unwrap().total, 1);
        assert_eq!(list_routines(&db, Some("beginner"), None).unwrap().total, 0);
        assert_eq!(list_routines(&db, None, Some("body")).unwrap().total, 1);
    }

    #[test]
    fn test_delete_routine_unassigns_patients() {
        let db = migrated_db();
        let ids = SequentialIds::new("x");
        let clock = FixedClock::default();
        let created = create_routine(&db, &ids, &clock, form()).unwrap();

        let patient = patients::save_patient(
            &db,
            &ids,
            &clock,
            None,
            patient_fixtures::form("Luis", "Garcia"),
            patient_fixtures::measurements(85.0),
        )
        .unwrap();
        patients::assign_routine(&db, &patient.id, Some(&created.id)).unwrap();

        let deleted = delete_routine(&db, &created.id).unwrap();
        assert_eq!(deleted.unassigned_patients, vec![patient.id.clone()]);

        let reloaded = patients::get_patient(&db, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.assigned_routine_id, None);
        assert!(delete_routine(&db, &created.id).is_err());
    }
}
