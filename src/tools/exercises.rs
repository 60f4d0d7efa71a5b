//! Exercise Catalog Tools

use serde::Serialize;

use crate::calc::IdGenerator;
use crate::db::Database;
use crate::models::{Exercise, ExerciseCreate, ExerciseKind, ExerciseLevel, ExerciseUpdate, Routine};

pub(crate) fn parse_kind(label: &str) -> Result<ExerciseKind, String> {
    ExerciseKind::from_str(label).ok_or_else(|| {
        format!(
            "Invalid kind '{}' (expected cardio, strength, flexibility or functional)",
            label
        )
    })
}

pub(crate) fn parse_level(label: &str) -> Result<ExerciseLevel, String> {
    ExerciseLevel::from_str(label).ok_or_else(|| {
        format!(
            "Invalid level '{}' (expected beginner, intermediate or advanced)",
            label
        )
    })
}

fn parse_levels(labels: &[String]) -> Result<Vec<ExerciseLevel>, String> {
    let mut levels = Vec::new();
    for label in labels {
        let level = parse_level(label)?;
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    Ok(levels)
}

/// Trimmed, non-empty muscle group names
fn clean_groups(groups: Vec<String>) -> Vec<String> {
    groups
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

fn validate_calories(kcal: Option<f64>) -> Result<(), String> {
    if matches!(kcal, Some(v) if !v.is_finite() || v < 0.0) {
        return Err("calories_per_30min cannot be negative".to_string());
    }
    Ok(())
}

/// Exercise as entered, labels unparsed
#[derive(Debug, Clone, Default)]
pub struct ExerciseForm {
    pub name: String,
    pub kind: String,
    pub muscle_groups: Vec<String>,
    pub levels: Vec<String>,
    pub description: String,
    pub calories_per_30min: Option<f64>,
}

/// Field changes for update_exercise
#[derive(Debug, Clone, Default)]
pub struct ExerciseChanges {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub muscle_groups: Option<Vec<String>>,
    pub levels: Option<Vec<String>>,
    pub description: Option<String>,
    pub calories_per_30min: Option<f64>,
}

/// Response for add_exercise
#[derive(Debug, Serialize)]
pub struct AddExerciseResponse {
    pub id: String,
    pub name: String,
    pub kind: ExerciseKind,
}

/// Exercise with the routines that reference it
#[derive(Debug, Serialize)]
pub struct ExerciseDetail {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub used_in_routines: Vec<String>,
}

/// Response for list_exercises
#[derive(Debug, Serialize)]
pub struct ListExercisesResponse {
    pub exercises: Vec<Exercise>,
    pub total: usize,
}

/// Response for update_exercise
#[derive(Debug, Serialize)]
pub struct UpdateExerciseResponse {
    pub success: bool,
    pub exercise: Exercise,
}

/// Response for delete_exercise blocked
#[derive(Debug, Serialize)]
pub struct DeleteExerciseBlockedResponse {
    pub error: String,
    pub used_in_routines: Vec<String>,
}

/// Response for successful delete_exercise
#[derive(Debug, Serialize)]
pub struct DeleteExerciseSuccessResponse {
    pub success: bool,
    pub deleted_id: String,
}

/// Add an exercise to the catalog
pub fn add_exercise(
    db: &Database,
    ids: &dyn IdGenerator,
    form: ExerciseForm,
) -> Result<AddExerciseResponse, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Exercise name cannot be empty".to_string());
    }
    validate_calories(form.calories_per_30min)?;

    let data = ExerciseCreate {
        name: name.to_string(),
        kind: parse_kind(&form.kind)?,
        muscle_groups: clean_groups(form.muscle_groups),
        levels: parse_levels(&form.levels)?,
        description: form.description,
        calories_per_30min: form.calories_per_30min,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let exercise = Exercise::create(&conn, ids, data)
        .map_err(|e| format!("Failed to create exercise: {}", e))?;

    Ok(AddExerciseResponse {
        id: exercise.id,
        name: exercise.name,
        kind: exercise.kind,
    })
}

/// Get an exercise by ID with routine usage
pub fn get_exercise(db: &Database, id: &str) -> Result<Option<ExerciseDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(exercise) = Exercise::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get exercise: {}", e))?
    else {
        return Ok(None);
    };

    let used_in_routines = Routine::using_exercise(&conn, id)
        .map_err(|e| format!("Failed to get routine usage: {}", e))?
        .into_iter()
        .map(|r| r.name)
        .collect();

    Ok(Some(ExerciseDetail {
        exercise,
        used_in_routines,
    }))
}

/// List exercises by kind, level and muscle group
pub fn list_exercises(
    db: &Database,
    kind: Option<&str>,
    level: Option<&str>,
    muscle_group: Option<&str>,
) -> Result<ListExercisesResponse, String> {
    let kind = kind.map(parse_kind).transpose()?;
    let level = level.map(parse_level).transpose()?;
    let muscle_group = muscle_group.map(str::trim).filter(|s| !s.is_empty());

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let exercises = Exercise::list(&conn, kind, level, muscle_group)
        .map_err(|e| format!("Failed to list exercises: {}", e))?;

    let total = exercises.len();
    Ok(ListExercisesResponse { exercises, total })
}

pub fn update_exercise(
    db: &Database,
    id: &str,
    changes: ExerciseChanges,
) -> Result<UpdateExerciseResponse, String> {
    if let Some(ref name) = changes.name {
        if name.trim().is_empty() {
            return Err("Exercise name cannot be empty".to_string());
        }
    }
    validate_calories(changes.calories_per_30min)?;

    let data = ExerciseUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        kind: changes.kind.as_deref().map(parse_kind).transpose()?,
        muscle_groups: changes.muscle_groups.map(clean_groups),
        levels: changes.levels.as_deref().map(parse_levels).transpose()?,
        description: changes.description,
        calories_per_30min: changes.calories_per_30min,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    match Exercise::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update exercise: {}", e))?
    {
        Some(exercise) => Ok(UpdateExerciseResponse {
            success: true,
            exercise,
        }),
        None => Err(format!("Exercise not found with id: {}", id)),
    }
}

/// Delete an exercise (blocked while any routine uses it)
pub fn delete_exercise(
    db: &Database,
    id: &str,
) -> Result<Result<DeleteExerciseSuccessResponse, DeleteExerciseBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let exercise = Exercise::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if exercise.is_none() {
        return Err(format!("Exercise not found with id: {}", id));
    }

    let routines = Routine::using_exercise(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;
    if !routines.is_empty() {
        return Ok(Err(DeleteExerciseBlockedResponse {
            error: format!("Cannot delete exercise: used in {} routine(s)", routines.len()),
            used_in_routines: routines.into_iter().map(|r| r.name).collect(),
        }));
    }

    Exercise::delete(&conn, id).map_err(|e| format!("Failed to delete exercise: {}", e))?;

    Ok(Ok(DeleteExerciseSuccessResponse {
        success: true,
        deleted_id: id.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Prescription, RoutineCreate, RoutineExercise};
    use crate::test_support::{migrated_db, SequentialIds};

    #[test]
    fn test_add_exercise() {
        let db = migrated_db();
        let ids = SequentialIds::new("e");

        let added = add_exercise(
            &db,
            &ids,
            ExerciseForm {
                name: "Kettlebell swing".to_string(),
                kind: "functional".to_string(),
                muscle_groups: vec![" glutes ".to_string(), "".to_string()],
                levels: vec!["intermediate".to_string(), "advanced".to_string()],
                description: String::new(),
                calories_per_30min: Some(300.0),
            },
        )
        .unwrap();
        assert_eq!(added.kind, ExerciseKind::Functional);

        let detail = get_exercise(&db, &added.id).unwrap().unwrap();
        assert_eq!(detail.exercise.muscle_groups, vec!["glutes".to_string()]);
        assert_eq!(detail.exercise.levels.len(), 2);

        let bad = ExerciseForm {
            name: "Yoga".to_string(),
            kind: "zen".to_string(),
            ..Default::default()
        };
        assert!(add_exercise(&db, &ids, bad).unwrap_err().contains("Invalid kind"));
    }

    #[test]
    fn test_list_exercises_filters() {
        let db = migrated_db();

        let cardio = list_exercises(&db, Some("cardio"), None, None).unwrap();
        assert_eq!(cardio.total, 5);
        assert!(cardio.exercises.iter().all(|e| e.kind == ExerciseKind::Cardio));

        assert!(list_exercises(&db, None, Some("expert"), None).is_err());
    }

    #[test]
    fn test_update_exercise() {
        let db = migrated_db();
        let updated = update_exercise(
            &db,
            "exercise-7",
            ExerciseChanges {
                calories_per_30min: Some(220.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.exercise.calories_per_30min, Some(220.0));
        assert_eq!(updated.exercise.name, "Squat");

        assert!(update_exercise(&db, "missing", ExerciseChanges::default()).is_err());
    }

    #[test]
    fn test_delete_exercise_blocked_by_routine() {
        let db = migrated_db();
        let conn = db.get_conn().unwrap();
        let ids = SequentialIds::new("r");

        let mut routine = Routine::create(
            &conn,
            &ids,
            "2026-01-15T09:30:00Z".to_string(),
            RoutineCreate {
                name: "Legs".to_string(),
                level: ExerciseLevel::Beginner,
                objective: "Strength".to_string(),
                days_per_week: 2,
                duration_weeks: None,
                instructions: String::new(),
            },
        )
        .unwrap();
        let squat = Exercise::get_by_id(&conn, "exercise-7").unwrap().unwrap();
        routine
            .exercises
            .push(RoutineExercise::prescribe(&squat, Prescription::default()));
        routine.save(&conn).unwrap();
        drop(conn);

        let blocked = delete_exercise(&db, "exercise-7").unwrap().unwrap_err();
        assert_eq!(blocked.used_in_routines, vec!["Legs".to_string()]);

        assert!(delete_exercise(&db, "exercise-14").unwrap().is_ok());
        assert!(delete_exercise(&db, "exercise-14").is_err());
    }
}
