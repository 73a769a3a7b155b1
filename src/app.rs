//! App facade - the services wired over one shared store
//!
//! Mirrors what the screens compose by hand: creating a workout pays
//! XP, finishing one pays XP, logs history and moves any joined
//! "treinos" challenge along, completing a challenge pays its reward.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::{Accounts, AuthError};
use crate::challenge::{Challenge, ChallengeError, Challenges};
use crate::history::{self, HistoryEntry};
use crate::storage::{Storage, StorageError};
use crate::workout::session::{SessionError, WorkoutSession};
use crate::workout::{CREATION_XP, NewWorkout, Workout, WorkoutError, Workouts};

/// What finishing a workout produced.
#[derive(Debug, Clone)]
pub struct CompletionSummary {
    pub xp_earned: u64,
    pub elapsed_secs: u32,
    /// Names of the challenges the workout was counted toward.
    pub challenges_advanced: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Workout(#[from] WorkoutError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct GymFit {
    store: Arc<dyn Storage>,
    pub accounts: Accounts,
    pub workouts: Workouts,
    pub challenges: Challenges,
}

impl GymFit {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            accounts: Accounts::new(store.clone()),
            workouts: Workouts::new(store.clone()),
            challenges: Challenges::new(store.clone()),
            store,
        }
    }

    /// Create a workout for the logged-in user. Worth +50 XP.
    pub async fn create_workout(&self, data: NewWorkout) -> Result<Workout, AppError> {
        let user = self.accounts.require_current().await?;
        let workout = self.workouts.create(user.id, data).await?;
        self.accounts.award_xp(&user, CREATION_XP).await?;
        Ok(workout)
    }

    /// Close out a performed workout: minimum-time gate, XP award,
    /// history entry, then automatic progress on joined "treinos"
    /// challenges.
    pub async fn complete_workout(
        &self,
        session: &WorkoutSession,
    ) -> Result<CompletionSummary, AppError> {
        let user = self.accounts.require_current().await?;
        let xp = session.finish()?;
        let workout = session.workout();

        self.accounts.award_xp(&user, xp).await?;

        history::append(
            self.store.as_ref(),
            HistoryEntry {
                workout_id: workout.id,
                workout_name: workout.name.clone(),
                date: Utc::now(),
                elapsed_secs: session.elapsed_secs(),
                xp,
            },
        )
        .await?;

        let advanced = self
            .challenges
            .track_completed_workout(user.id, workout.id)
            .await?;

        info!(workout_id = workout.id, xp, "treino concluído");
        Ok(CompletionSummary {
            xp_earned: xp,
            elapsed_secs: session.elapsed_secs(),
            challenges_advanced: advanced.into_iter().map(|c| c.name).collect(),
        })
    }

    /// Complete a challenge and collect its XP reward.
    pub async fn complete_challenge(&self, challenge_id: i64) -> Result<Challenge, AppError> {
        let user = self.accounts.require_current().await?;
        let challenge = self.challenges.complete(challenge_id).await?;
        self.accounts.award_xp(&user, challenge.xp_reward).await?;
        Ok(challenge)
    }

    /// Full workout history, newest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(history::list(self.store.as_ref()).await?)
    }
}
