//! Auth module - local accounts and the logged-in session
//!
//! Users are plain JSON records in the key-value store. There is no
//! backend: the password is checked against the stored record as-is.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{self, Storage, StorageError, keys};

/// Minimum password length accepted at signup.
const MIN_PASSWORD_LEN: usize = 6;

/// XP needed to advance one level.
const XP_PER_LEVEL: u64 = 1000;

/// User record as stored in `gymfit_users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "idade")]
    pub age: u32,
    #[serde(rename = "objetivo", default)]
    pub goal: String,
    #[serde(rename = "dataCadastro")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub xp: u64,
}

impl User {
    pub fn level(&self) -> u64 {
        self.xp / XP_PER_LEVEL + 1
    }

    /// XP still missing to reach the next level.
    pub fn xp_to_next_level(&self) -> u64 {
        self.level() * XP_PER_LEVEL - self.xp
    }
}

/// Signup form data.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: u32,
    pub goal: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Preencha todos os campos")]
    MissingFields,

    #[error("A senha deve ter pelo menos 6 caracteres!")]
    PasswordTooShort,

    #[error("Este e-mail já está cadastrado.")]
    EmailTaken,

    #[error("E-mail ou senha incorretos.")]
    InvalidCredentials,

    #[error("Nenhum usuário logado.")]
    NotLoggedIn,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Account operations over the shared store.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn Storage>,
}

impl Accounts {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Create an account and log it in.
    pub async fn register(&self, data: NewUser) -> Result<User, AuthError> {
        if data.name.is_empty()
            || data.email.is_empty()
            || data.password.is_empty()
            || data.goal.is_empty()
        {
            return Err(AuthError::MissingFields);
        }
        if data.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }

        let mut users: Vec<User> = storage::load_list(self.store.as_ref(), keys::USERS).await?;
        if users.iter().any(|u| u.email == data.email) {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: storage::next_id(),
            name: data.name,
            email: data.email,
            password: data.password,
            age: data.age,
            goal: data.goal,
            created_at: Utc::now(),
            xp: 0,
        };
        users.push(user.clone());
        storage::save_list(self.store.as_ref(), keys::USERS, &users).await?;
        self.persist_session(&user).await?;

        info!(user_id = user.id, "conta criada");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let users: Vec<User> = storage::load_list(self.store.as_ref(), keys::USERS).await?;
        let user = users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        self.persist_session(&user).await?;
        info!(user_id = user.id, "login");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.remove_item(keys::CURRENT_USER).await?;
        Ok(())
    }

    /// The persisted session user, if any.
    pub async fn current(&self) -> Result<Option<User>, AuthError> {
        match self.store.get_item(keys::CURRENT_USER).await? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).map_err(StorageError::from)?,
            )),
            None => Ok(None),
        }
    }

    pub async fn require_current(&self) -> Result<User, AuthError> {
        self.current().await?.ok_or(AuthError::NotLoggedIn)
    }

    /// Replace the stored record and refresh the session blob.
    /// A no-op when the id is no longer in the user list.
    pub async fn update_user(&self, updated: &User) -> Result<(), AuthError> {
        let mut users: Vec<User> = storage::load_list(self.store.as_ref(), keys::USERS).await?;
        if let Some(slot) = users.iter_mut().find(|u| u.id == updated.id) {
            *slot = updated.clone();
            storage::save_list(self.store.as_ref(), keys::USERS, &users).await?;
            self.persist_session(updated).await?;
        }
        Ok(())
    }

    /// Profile save: name, email and age are mandatory, goal may change.
    pub async fn save_profile(
        &self,
        name: String,
        email: String,
        age: u32,
        goal: String,
    ) -> Result<User, AuthError> {
        if name.is_empty() || email.is_empty() || age == 0 {
            return Err(AuthError::MissingFields);
        }
        let mut user = self.require_current().await?;
        user.name = name;
        user.email = email;
        user.age = age;
        user.goal = goal;
        self.update_user(&user).await?;
        Ok(user)
    }

    /// Add XP to a user and persist it.
    pub async fn award_xp(&self, user: &User, amount: u64) -> Result<User, AuthError> {
        let mut updated = user.clone();
        updated.xp += amount;
        self.update_user(&updated).await?;
        info!(user_id = updated.id, amount, xp = updated.xp, "xp ganho");
        Ok(updated)
    }

    async fn persist_session(&self, user: &User) -> Result<(), StorageError> {
        self.store
            .set_item(keys::CURRENT_USER, &serde_json::to_string(user)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn accounts() -> Accounts {
        Accounts::new(Arc::new(MemoryStore::new()))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "segredo".to_string(),
            age: 28,
            goal: "ganhar_massa".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_starts_at_zero_xp_and_logs_in() {
        let accounts = accounts();
        let user = accounts.register(new_user("ana@gym.fit")).await.unwrap();
        assert_eq!(user.xp, 0);

        let current = accounts.current().await.unwrap().unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.email, "ana@gym.fit");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let accounts = accounts();
        accounts.register(new_user("ana@gym.fit")).await.unwrap();
        let err = accounts.register(new_user("ana@gym.fit")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let accounts = accounts();
        let mut data = new_user("ana@gym.fit");
        data.password = "curta".to_string();
        let err = accounts.register(data).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort));
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let accounts = accounts();
        let mut data = new_user("ana@gym.fit");
        data.name = String::new();
        let err = accounts.register(data).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingFields));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let accounts = accounts();
        accounts.register(new_user("ana@gym.fit")).await.unwrap();
        accounts.logout().await.unwrap();

        let err = accounts.login("ana@gym.fit", "errada").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(accounts.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let accounts = accounts();
        accounts.register(new_user("ana@gym.fit")).await.unwrap();
        accounts.logout().await.unwrap();

        let user = accounts.login("ana@gym.fit", "segredo").await.unwrap();
        assert_eq!(user.email, "ana@gym.fit");

        accounts.logout().await.unwrap();
        assert!(accounts.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_unknown_id_is_noop() {
        let accounts = accounts();
        let registered = accounts.register(new_user("ana@gym.fit")).await.unwrap();

        let mut ghost = registered.clone();
        ghost.id += 1;
        ghost.name = "Fantasma".to_string();
        accounts.update_user(&ghost).await.unwrap();

        // The session user is untouched.
        let current = accounts.current().await.unwrap().unwrap();
        assert_eq!(current.name, "Ana");
    }

    #[tokio::test]
    async fn test_save_profile_updates_list_and_session() {
        let accounts = accounts();
        accounts.register(new_user("ana@gym.fit")).await.unwrap();

        let updated = accounts
            .save_profile(
                "Ana Clara".to_string(),
                "ana@gym.fit".to_string(),
                29,
                "forca".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(updated.age, 29);

        let current = accounts.current().await.unwrap().unwrap();
        assert_eq!(current.name, "Ana Clara");
        assert_eq!(current.goal, "forca");
    }

    #[tokio::test]
    async fn test_award_xp_accumulates_and_refreshes_session() {
        let accounts = accounts();
        let user = accounts.register(new_user("ana@gym.fit")).await.unwrap();

        let user = accounts.award_xp(&user, 50).await.unwrap();
        let updated = accounts.award_xp(&user, 150).await.unwrap();
        assert_eq!(updated.xp, 200);

        let current = accounts.current().await.unwrap().unwrap();
        assert_eq!(current.xp, 200);
    }

    #[tokio::test]
    async fn test_level_math() {
        let mut user = accounts()
            .register(new_user("ana@gym.fit"))
            .await
            .unwrap();

        assert_eq!(user.level(), 1);
        assert_eq!(user.xp_to_next_level(), 1000);

        user.xp = 999;
        assert_eq!(user.level(), 1);
        assert_eq!(user.xp_to_next_level(), 1);

        user.xp = 1000;
        assert_eq!(user.level(), 2);
        assert_eq!(user.xp_to_next_level(), 1000);

        user.xp = 2500;
        assert_eq!(user.level(), 3);
        assert_eq!(user.xp_to_next_level(), 500);
    }
}
