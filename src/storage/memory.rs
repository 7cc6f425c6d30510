use crate::domain::user::{NewUser, TAKEN, User, ValidationErrors};
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store used when no database is configured, and by tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.users.read().await.iter().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.token_hash == token_hash).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;

        // Mirrors the `lower(email)` unique index.
        let email = user.email.to_lowercase();
        let mut errors = ValidationErrors::default();
        if users.iter().any(|u| u.email.to_lowercase() == email) {
            errors.add("email", TAKEN);
        }
        if users.iter().any(|u| u.token_hash == user.token_hash) {
            errors.add("token", TAKEN);
        }
        if users.iter().any(|u| u.id == user.id) {
            return Err(AppError::Internal);
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let created = User {
            id: user.id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            token_hash: user.token_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, token_hash: &str) -> NewUser {
        NewUser {
            id: Uuid::now_v7(),
            name: "Ann".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            token_hash: token_hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("a@x.com", "h1")).await.unwrap();

        assert_eq!(repo.find_by_id(user.id).await.unwrap().unwrap().email, "a@x.com");
        assert_eq!(repo.find_by_token_hash("h1").await.unwrap().unwrap().id, user.id);
        assert_eq!(repo.find_by_email("A@X.COM").await.unwrap().unwrap().id, user.id);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(repo.find_by_token_hash("h2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = InMemoryUserRepository::new();
        let first = repo.insert(new_user("a@x.com", "h1")).await.unwrap();
        let second = repo.insert(new_user("b@x.com", "h2")).await.unwrap();

        let ids: Vec<Uuid> = repo.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_duplicates_are_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("a@x.com", "h1")).await.unwrap();

        let err = repo.insert(new_user("A@x.com", "h1")).await.unwrap_err();
        let AppError::Validation(errors) = err else { panic!("expected validation error, got {err:?}") };
        assert_eq!(errors.get("email"), Some(&[TAKEN.to_string()][..]));
        assert_eq!(errors.get("token"), Some(&[TAKEN.to_string()][..]));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_case_folding_is_not_ascii_only() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("Élodie@x.com", "h1")).await.unwrap();

        assert_eq!(repo.find_by_email("élodie@X.COM").await.unwrap().unwrap().id, user.id);

        let err = repo.insert(new_user("éLODIE@x.com", "h2")).await.unwrap_err();
        let AppError::Validation(errors) = err else { panic!("expected validation error, got {err:?}") };
        assert_eq!(errors.get("email"), Some(&[TAKEN.to_string()][..]));
        assert!(errors.get("token").is_none());
    }
}
