//! Workout module - treinos and their exercise plans

pub mod session;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{self, Storage, StorageError, keys};

/// XP awarded for creating a workout.
pub const CREATION_XP: u64 = 50;

/// Workout kind assumed when none is given.
pub const DEFAULT_KIND: &str = "musculacao";

/// One planned exercise inside a workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "series")]
    pub sets: u32,
    #[serde(rename = "repeticoes")]
    pub reps: u32,
    #[serde(rename = "concluido", default)]
    pub done: bool,
}

/// Workout record as stored in `gymfit_treinos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "objetivo")]
    pub goal: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "duracao")]
    pub duration_min: Option<u32>,
    #[serde(rename = "exercicios")]
    pub exercises: Vec<Exercise>,
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
}

/// Workout creation form.
#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub name: String,
    pub description: String,
    pub goal: String,
    pub kind: String,
    pub duration_min: Option<u32>,
    pub exercises: Vec<NewExercise>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
}

impl NewExercise {
    /// Parse a `nome:SERIESxREPS` spec, e.g. `Supino:4x12`.
    pub fn parse(spec: &str) -> Result<Self, WorkoutError> {
        let (name, counts) = spec.rsplit_once(':').ok_or(WorkoutError::InvalidExercise)?;
        let (sets, reps) = counts.split_once('x').ok_or(WorkoutError::InvalidExercise)?;
        let sets: u32 = sets.trim().parse().map_err(|_| WorkoutError::InvalidExercise)?;
        let reps: u32 = reps.trim().parse().map_err(|_| WorkoutError::InvalidExercise)?;
        let name = name.trim();
        if name.is_empty() || sets == 0 || reps == 0 {
            return Err(WorkoutError::InvalidExercise);
        }
        Ok(Self {
            name: name.to_string(),
            sets,
            reps,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkoutError {
    #[error("Preencha todos os campos e adicione pelo menos um exercício")]
    MissingFields,

    #[error("Preencha todos os campos do exercício")]
    InvalidExercise,

    #[error("Treino não encontrado.")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Workout operations over the shared store.
#[derive(Clone)]
pub struct Workouts {
    store: Arc<dyn Storage>,
}

impl Workouts {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Save a new workout owned by this user.
    pub async fn create(&self, user_id: i64, data: NewWorkout) -> Result<Workout, WorkoutError> {
        if data.name.is_empty()
            || data.description.is_empty()
            || data.goal.is_empty()
            || data.exercises.is_empty()
        {
            return Err(WorkoutError::MissingFields);
        }
        for ex in &data.exercises {
            if ex.name.is_empty() || ex.sets == 0 || ex.reps == 0 {
                return Err(WorkoutError::InvalidExercise);
            }
        }

        let now = Utc::now();
        let base_id = storage::next_id();
        let exercises = data
            .exercises
            .into_iter()
            .enumerate()
            .map(|(i, ex)| Exercise {
                // index offset keeps ids unique within one batched create
                id: (base_id + i as i64).to_string(),
                name: ex.name,
                sets: ex.sets,
                reps: ex.reps,
                done: false,
            })
            .collect();

        let workout = Workout {
            id: base_id,
            name: data.name,
            description: data.description,
            goal: data.goal,
            kind: if data.kind.is_empty() {
                DEFAULT_KIND.to_string()
            } else {
                data.kind
            },
            duration_min: data.duration_min,
            exercises,
            user_id,
            created_at: now,
        };

        let mut all: Vec<Workout> = storage::load_list(self.store.as_ref(), keys::WORKOUTS).await?;
        all.push(workout.clone());
        storage::save_list(self.store.as_ref(), keys::WORKOUTS, &all).await?;

        info!(workout_id = workout.id, user_id, "treino salvo");
        Ok(workout)
    }

    /// All workouts owned by this user.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Workout>, WorkoutError> {
        let all: Vec<Workout> = storage::load_list(self.store.as_ref(), keys::WORKOUTS).await?;
        Ok(all.into_iter().filter(|w| w.user_id == user_id).collect())
    }

    pub async fn get(&self, user_id: i64, workout_id: i64) -> Result<Workout, WorkoutError> {
        self.list_for_user(user_id)
            .await?
            .into_iter()
            .find(|w| w.id == workout_id)
            .ok_or(WorkoutError::NotFound)
    }
}
