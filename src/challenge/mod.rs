//! Challenge module - desafios, participation and progress
//!
//! Challenges are shared records: any account sees the full list and
//! joins by id. Progress on "treinos" challenges moves automatically
//! when a joined user finishes a workout; other kinds are tracked by
//! hand with the mark/unmark toggle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::User;
use crate::catalog;
use crate::storage::{self, Storage, StorageError, keys};

/// Reward assumed for challenges stored without one.
const DEFAULT_XP_REWARD: u64 = 100;

/// Kind whose progress moves automatically on workout completion.
pub const AUTO_TRACKED_KIND: &str = "treinos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    #[serde(rename = "disponivel")]
    Available,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "pronto_para_concluir")]
    ReadyToComplete,
    #[serde(rename = "concluido")]
    Completed,
}

impl ChallengeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChallengeStatus::Available => "Disponível",
            ChallengeStatus::InProgress => "Em Andamento",
            ChallengeStatus::ReadyToComplete => "Pronto para Concluir",
            ChallengeStatus::Completed => "Concluído",
        }
    }

    /// Counts workouts and accepts the mark toggle.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ChallengeStatus::InProgress | ChallengeStatus::ReadyToComplete
        )
    }
}

/// Challenge record as stored in `gymfit_desafios`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "meta")]
    pub goal: u32,
    #[serde(rename = "tipo")]
    pub kind: String,
    pub status: ChallengeStatus,
    #[serde(rename = "criadorId")]
    pub creator_id: i64,
    #[serde(rename = "criadorNome")]
    pub creator_name: String,
    #[serde(rename = "participantes", default)]
    pub participants: Vec<i64>,
    #[serde(rename = "treinosCompletados", default)]
    pub completed_workouts: Vec<i64>,
    #[serde(rename = "progresso", default)]
    pub progress: u32,
    #[serde(rename = "xpRecompensa", default = "default_xp_reward")]
    pub xp_reward: u64,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "dataConclusao",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_xp_reward() -> u64 {
    DEFAULT_XP_REWARD
}

impl Challenge {
    /// Goal treated as at least one workout.
    pub fn effective_goal(&self) -> u32 {
        self.goal.max(1)
    }

    /// Progress percentage, capped at 100.
    pub fn percent(&self) -> u32 {
        (self.progress * 100 / self.effective_goal()).min(100)
    }
}

/// Challenge creation form.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub name: String,
    pub description: String,
    pub goal: u32,
    pub kind: String,
    pub xp_reward: u64,
}

/// What the mark toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked { progress: u32, goal: u32 },
    GoalReached { progress: u32, goal: u32 },
    Unmarked { progress: u32, goal: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("Preencha todos os campos")]
    MissingFields,

    #[error("Tipo de desafio inválido.")]
    UnknownKind,

    #[error("Recompensa de XP inválida.")]
    InvalidReward,

    #[error("Desafio não encontrado.")]
    NotFound,

    #[error("Este desafio já foi iniciado.")]
    AlreadyStarted,

    #[error("Este desafio não está em andamento.")]
    NotActive,

    #[error("Este desafio já foi concluído.")]
    AlreadyCompleted,

    #[error("Você precisa completar {goal} treinos para concluir este desafio!")]
    GoalNotReached { goal: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Challenge operations over the shared store.
#[derive(Clone)]
pub struct Challenges {
    store: Arc<dyn Storage>,
}

impl Challenges {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Every stored challenge, any creator.
    pub async fn list(&self) -> Result<Vec<Challenge>, ChallengeError> {
        Ok(storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?)
    }

    pub async fn create(
        &self,
        creator: &User,
        data: NewChallenge,
    ) -> Result<Challenge, ChallengeError> {
        if data.name.is_empty() || data.description.is_empty() {
            return Err(ChallengeError::MissingFields);
        }
        if catalog::find_challenge_kind(&data.kind).is_none() {
            return Err(ChallengeError::UnknownKind);
        }
        if !catalog::XP_REWARD_CHOICES.contains(&data.xp_reward) {
            return Err(ChallengeError::InvalidReward);
        }

        let challenge = Challenge {
            id: storage::next_id(),
            name: data.name,
            description: data.description,
            goal: data.goal,
            kind: data.kind,
            status: ChallengeStatus::Available,
            creator_id: creator.id,
            creator_name: if creator.name.is_empty() {
                "Usuário".to_string()
            } else {
                creator.name.clone()
            },
            participants: Vec::new(),
            completed_workouts: Vec::new(),
            progress: 0,
            xp_reward: data.xp_reward,
            created_at: Utc::now(),
            completed_at: None,
        };

        let mut all: Vec<Challenge> =
            storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?;
        all.push(challenge.clone());
        storage::save_list(self.store.as_ref(), keys::CHALLENGES, &all).await?;

        info!(challenge_id = challenge.id, "desafio criado");
        Ok(challenge)
    }

    /// Join an available challenge and start tracking it.
    pub async fn join(&self, user_id: i64, challenge_id: i64) -> Result<Challenge, ChallengeError> {
        let mut all: Vec<Challenge> =
            storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?;
        let challenge = all
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or(ChallengeError::NotFound)?;

        if challenge.status != ChallengeStatus::Available {
            return Err(ChallengeError::AlreadyStarted);
        }
        challenge.status = ChallengeStatus::InProgress;
        if !challenge.participants.contains(&user_id) {
            challenge.participants.push(user_id);
        }

        let joined = challenge.clone();
        storage::save_list(self.store.as_ref(), keys::CHALLENGES, &all).await?;

        info!(challenge_id, user_id, "desafio iniciado");
        Ok(joined)
    }

    /// Toggle a workout in an active challenge's completed list.
    /// Unmarking may drop a ready challenge back to in-progress; that
    /// is the only backward status move there is.
    pub async fn toggle_workout(
        &self,
        challenge_id: i64,
        workout_id: i64,
    ) -> Result<MarkOutcome, ChallengeError> {
        let mut all: Vec<Challenge> =
            storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?;
        let challenge = all
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or(ChallengeError::NotFound)?;

        if !challenge.status.is_active() {
            return Err(ChallengeError::NotActive);
        }

        let already_counted = challenge.completed_workouts.contains(&workout_id);
        if already_counted {
            challenge.completed_workouts.retain(|&id| id != workout_id);
        } else {
            challenge.completed_workouts.push(workout_id);
        }

        challenge.progress = challenge.completed_workouts.len() as u32;
        let goal = challenge.effective_goal();
        let progress = challenge.progress;
        challenge.status = if progress >= goal {
            ChallengeStatus::ReadyToComplete
        } else {
            ChallengeStatus::InProgress
        };

        storage::save_list(self.store.as_ref(), keys::CHALLENGES, &all).await?;

        Ok(if already_counted {
            MarkOutcome::Unmarked { progress, goal }
        } else if progress >= goal {
            MarkOutcome::GoalReached { progress, goal }
        } else {
            MarkOutcome::Marked { progress, goal }
        })
    }

    /// Close out a challenge whose goal was met. The XP reward goes
    /// to the acting user (awarded by the caller).
    pub async fn complete(&self, challenge_id: i64) -> Result<Challenge, ChallengeError> {
        let mut all: Vec<Challenge> =
            storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?;
        let challenge = all
            .iter_mut()
            .find(|c| c.id == challenge_id)
            .ok_or(ChallengeError::NotFound)?;

        if challenge.status == ChallengeStatus::Completed {
            return Err(ChallengeError::AlreadyCompleted);
        }
        if challenge.progress < challenge.effective_goal() {
            return Err(ChallengeError::GoalNotReached {
                goal: challenge.effective_goal(),
            });
        }

        challenge.status = ChallengeStatus::Completed;
        challenge.completed_at = Some(Utc::now());

        let completed = challenge.clone();
        storage::save_list(self.store.as_ref(), keys::CHALLENGES, &all).await?;

        info!(challenge_id, "desafio concluído");
        Ok(completed)
    }

    /// Count a finished workout toward every active "treinos"
    /// challenge this user joined. Already-counted workouts stay as
    /// they are. Returns the challenges that moved.
    pub async fn track_completed_workout(
        &self,
        user_id: i64,
        workout_id: i64,
    ) -> Result<Vec<Challenge>, ChallengeError> {
        let mut all: Vec<Challenge> =
            storage::load_list(self.store.as_ref(), keys::CHALLENGES).await?;

        let mut advanced = Vec::new();
        for challenge in all.iter_mut() {
            if challenge.kind != AUTO_TRACKED_KIND
                || !challenge.status.is_active()
                || !challenge.participants.contains(&user_id)
                || challenge.completed_workouts.contains(&workout_id)
            {
                continue;
            }

            challenge.completed_workouts.push(workout_id);
            challenge.progress = challenge.completed_workouts.len() as u32;
            challenge.status = if challenge.progress >= challenge.effective_goal() {
                ChallengeStatus::ReadyToComplete
            } else {
                ChallengeStatus::InProgress
            };

            info!(
                challenge_id = challenge.id,
                progress = challenge.progress,
                "treino contado no desafio"
            );
            advanced.push(challenge.clone());
        }

        if !advanced.is_empty() {
            storage::save_list(self.store.as_ref(), keys::CHALLENGES, &all).await?;
        }
        Ok(advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn challenges() -> Challenges {
        Challenges::new(Arc::new(MemoryStore::new()))
    }

    fn creator() -> User {
        User {
            id: 7,
            name: "Ana".to_string(),
            email: "ana@gym.fit".to_string(),
            password: "segredo".to_string(),
            age: 28,
            goal: "forca".to_string(),
            created_at: Utc::now(),
            xp: 0,
        }
    }

    fn new_challenge(goal: u32) -> NewChallenge {
        NewChallenge {
            name: "Semana Forte".to_string(),
            description: "Complete os treinos da semana".to_string(),
            goal,
            kind: "treinos".to_string(),
            xp_reward: 100,
        }
    }

    async fn created_and_joined(service: &Challenges, goal: u32) -> Challenge {
        let challenge = service.create(&creator(), new_challenge(goal)).await.unwrap();
        service.join(7, challenge.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_starts_available_with_no_progress() {
        let service = challenges();
        let challenge = service.create(&creator(), new_challenge(3)).await.unwrap();

        assert_eq!(challenge.status, ChallengeStatus::Available);
        assert_eq!(challenge.progress, 0);
        assert!(challenge.participants.is_empty());
        assert_eq!(challenge.creator_name, "Ana");
        assert!(challenge.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_kind() {
        let service = challenges();
        let mut data = new_challenge(3);
        data.kind = "corrida".to_string();
        let err = service.create(&creator(), data).await.unwrap_err();
        assert!(matches!(err, ChallengeError::UnknownKind));
    }

    #[tokio::test]
    async fn test_create_rejects_off_menu_reward() {
        let service = challenges();
        let mut data = new_challenge(3);
        data.xp_reward = 123;
        let err = service.create(&creator(), data).await.unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidReward));
    }

    #[tokio::test]
    async fn test_join_moves_to_in_progress() {
        let service = challenges();
        let challenge = service.create(&creator(), new_challenge(3)).await.unwrap();

        let joined = service.join(7, challenge.id).await.unwrap();
        assert_eq!(joined.status, ChallengeStatus::InProgress);
        assert_eq!(joined.participants, vec![7]);
    }

    #[tokio::test]
    async fn test_join_twice_fails() {
        let service = challenges();
        let challenge = created_and_joined(&service, 3).await;
        let err = service.join(7, challenge.id).await.unwrap_err();
        assert!(matches!(err, ChallengeError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_toggle_marks_and_unmarks() {
        let service = challenges();
        let challenge = created_and_joined(&service, 3).await;

        let outcome = service.toggle_workout(challenge.id, 101).await.unwrap();
        assert_eq!(outcome, MarkOutcome::Marked { progress: 1, goal: 3 });

        let outcome = service.toggle_workout(challenge.id, 101).await.unwrap();
        assert_eq!(outcome, MarkOutcome::Unmarked { progress: 0, goal: 3 });

        let stored = &service.list().await.unwrap()[0];
        assert!(stored.completed_workouts.is_empty());
        assert_eq!(stored.status, ChallengeStatus::InProgress);
    }

    #[tokio::test]
    async fn test_toggle_reaching_goal_flips_status() {
        let service = challenges();
        let challenge = created_and_joined(&service, 2).await;

        service.toggle_workout(challenge.id, 101).await.unwrap();
        let outcome = service.toggle_workout(challenge.id, 102).await.unwrap();
        assert_eq!(outcome, MarkOutcome::GoalReached { progress: 2, goal: 2 });

        let stored = &service.list().await.unwrap()[0];
        assert_eq!(stored.status, ChallengeStatus::ReadyToComplete);
    }

    #[tokio::test]
    async fn test_unmark_reverts_ready_to_in_progress() {
        let service = challenges();
        let challenge = created_and_joined(&service, 1).await;

        service.toggle_workout(challenge.id, 101).await.unwrap();
        let outcome = service.toggle_workout(challenge.id, 101).await.unwrap();
        assert_eq!(outcome, MarkOutcome::Unmarked { progress: 0, goal: 1 });

        let stored = &service.list().await.unwrap()[0];
        assert_eq!(stored.status, ChallengeStatus::InProgress);
    }

    #[tokio::test]
    async fn test_toggle_requires_active_challenge() {
        let service = challenges();
        let challenge = service.create(&creator(), new_challenge(3)).await.unwrap();
        let err = service.toggle_workout(challenge.id, 101).await.unwrap_err();
        assert!(matches!(err, ChallengeError::NotActive));
    }

    #[tokio::test]
    async fn test_zero_goal_behaves_as_one() {
        let service = challenges();
        let challenge = created_and_joined(&service, 0).await;

        let outcome = service.toggle_workout(challenge.id, 101).await.unwrap();
        assert_eq!(outcome, MarkOutcome::GoalReached { progress: 1, goal: 1 });
    }

    #[tokio::test]
    async fn test_complete_requires_goal() {
        let service = challenges();
        let challenge = created_and_joined(&service, 2).await;

        let err = service.complete(challenge.id).await.unwrap_err();
        assert!(matches!(err, ChallengeError::GoalNotReached { goal: 2 }));
    }

    #[tokio::test]
    async fn test_complete_sets_status_and_timestamp() {
        let service = challenges();
        let challenge = created_and_joined(&service, 1).await;
        service.toggle_workout(challenge.id, 101).await.unwrap();

        let completed = service.complete(challenge.id).await.unwrap();
        assert_eq!(completed.status, ChallengeStatus::Completed);
        assert!(completed.completed_at.is_some());

        let err = service.complete(challenge.id).await.unwrap_err();
        assert!(matches!(err, ChallengeError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn test_track_advances_joined_treinos_challenges() {
        let service = challenges();
        let challenge = created_and_joined(&service, 2).await;

        let advanced = service.track_completed_workout(7, 101).await.unwrap();
        assert_eq!(advanced.len(), 1);
        assert_eq!(advanced[0].progress, 1);
        assert_eq!(advanced[0].status, ChallengeStatus::InProgress);

        let advanced = service.track_completed_workout(7, 102).await.unwrap();
        assert_eq!(advanced[0].progress, 2);
        assert_eq!(advanced[0].status, ChallengeStatus::ReadyToComplete);

        // invariant: progress always equals the counted list length
        let stored = &service.list().await.unwrap()[0];
        assert_eq!(stored.progress as usize, stored.completed_workouts.len());
    }

    #[tokio::test]
    async fn test_track_skips_repeated_workout() {
        let service = challenges();
        let challenge = created_and_joined(&service, 3).await;

        service.track_completed_workout(7, 101).await.unwrap();
        let advanced = service.track_completed_workout(7, 101).await.unwrap();
        assert!(advanced.is_empty());

        let stored = &service.list().await.unwrap()[0];
        assert_eq!(stored.progress, 1);
        assert_eq!(stored.id, challenge.id);
    }

    #[tokio::test]
    async fn test_track_skips_non_participants_and_other_kinds() {
        let service = challenges();
        created_and_joined(&service, 3).await;

        let mut data = new_challenge(3);
        data.kind = "tempo".to_string();
        let other_kind = service.create(&creator(), data).await.unwrap();
        service.join(7, other_kind.id).await.unwrap();

        // user 99 joined nothing
        let advanced = service.track_completed_workout(99, 101).await.unwrap();
        assert!(advanced.is_empty());

        // user 7: only the "treinos" challenge moves
        let advanced = service.track_completed_workout(7, 101).await.unwrap();
        assert_eq!(advanced.len(), 1);
        assert_eq!(advanced[0].kind, AUTO_TRACKED_KIND);
    }

    #[tokio::test]
    async fn test_track_skips_available_challenges() {
        let service = challenges();
        service.create(&creator(), new_challenge(3)).await.unwrap();

        let advanced = service.track_completed_workout(7, 101).await.unwrap();
        assert!(advanced.is_empty());
    }

    #[test]
    fn test_percent_caps_at_hundred() {
        let mut challenge = Challenge {
            id: 1,
            name: "x".to_string(),
            description: "y".to_string(),
            goal: 2,
            kind: "treinos".to_string(),
            status: ChallengeStatus::InProgress,
            creator_id: 7,
            creator_name: "Ana".to_string(),
            participants: vec![7],
            completed_workouts: vec![1, 2, 3],
            progress: 3,
            xp_reward: 100,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(challenge.percent(), 100);
        challenge.progress = 1;
        assert_eq!(challenge.percent(), 50);
    }

    #[test]
    fn test_status_roundtrips_original_json_names() {
        let json = serde_json::to_string(&ChallengeStatus::ReadyToComplete).unwrap();
        assert_eq!(json, "\"pronto_para_concluir\"");
        let status: ChallengeStatus = serde_json::from_str("\"em_andamento\"").unwrap();
        assert_eq!(status, ChallengeStatus::InProgress);
    }
}
