use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::search::{SearchQuery, Sort, SortDirection, SortField};

/// Repository trait for User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Get a user by ID
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Get all users whose ids appear in `ids`
    async fn find_by_ids(&self, ids: &[Uuid]) -> UserResult<Vec<User>>;

    /// Update an existing user
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user by ID; returns whether a record was removed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Delete all users whose ids appear in `ids`; returns the number of
    /// removed records
    async fn delete_many(&self, ids: &[Uuid]) -> UserResult<u64>;

    /// Count users with exactly this email (uniqueness pre-check)
    async fn count_by_email(&self, email: &str) -> UserResult<u64>;

    /// Filter, sort, and slice one page of users, plus the total count of
    /// matching records
    async fn search(&self, query: &SearchQuery) -> UserResult<(Vec<User>, u64)>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Order users by the requested sort keys, breaking ties by id so equal
/// sort values cannot shuffle rows between pages.
fn compare(a: &User, b: &User, sorts: &[Sort]) -> Ordering {
    for sort in sorts {
        let ordering = match sort.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedDate => a.created_date.cmp(&b.created_date),
            SortField::ModifiedDate => a.modified_date.cmp(&b.modified_date),
        };
        let ordering = match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        if users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_many(&self, ids: &[Uuid]) -> UserResult<u64> {
        let mut users = self.users.write().await;

        let mut removed = 0;
        for id in ids {
            if users.remove(id).is_some() {
                removed += 1;
            }
        }

        tracing::info!(count = removed, "Deleted users in batch");
        Ok(removed)
    }

    async fn count_by_email(&self, email: &str) -> UserResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.email == email).count() as u64)
    }

    async fn search(&self, query: &SearchQuery) -> UserResult<(Vec<User>, u64)> {
        let users = self.users.read().await;

        let mut matching: Vec<User> = users
            .values()
            .filter(|u| query.filters().matches(u))
            .cloned()
            .collect();

        matching.sort_by(|a, b| compare(a, b, query.sorts()));

        let total = matching.len() as u64;
        let content: Vec<User> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.size() as usize)
            .collect();

        Ok((content, total))
    }
}
