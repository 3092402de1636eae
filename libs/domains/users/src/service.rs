use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use crate::agify::AgeLookup;
use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User, UserResponse};
use crate::repository::UserRepository;
use crate::search::{PageResponse, SearchParams, SearchQuery};

/// Most ids accepted by a single batch delete request
pub const MAX_BATCH_DELETE: usize = 100;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z].*@.+\..+$").expect("email regex must compile"));

/// Service layer for user business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository, A: AgeLookup> {
    repository: Arc<R>,
    age_lookup: Arc<A>,
}

impl<R: UserRepository, A: AgeLookup> UserService<R, A> {
    pub fn new(repository: R, age_lookup: A) -> Self {
        Self {
            repository: Arc::new(repository),
            age_lookup: Arc::new(age_lookup),
        }
    }

    /// Search users with filters, sorting, and pagination.
    ///
    /// Sort keys are validated first, then pagination bounds; both abort
    /// with `InvalidArgument` before the repository is touched.
    pub async fn search_users(
        &self,
        params: SearchParams,
    ) -> UserResult<PageResponse<UserResponse>> {
        let query = SearchQuery::parse(params)?;
        let (users, total) = self.repository.search(&query).await?;
        let content: Vec<UserResponse> = users.into_iter().map(|u| u.into()).collect();
        Ok(PageResponse::new(content, query.page(), query.size(), total))
    }

    /// Create a new user.
    ///
    /// Name and phone are trimmed before persisting. The age is fetched
    /// from the external lookup and may be absent; a failed lookup never
    /// fails creation.
    pub async fn create_user(&self, payload: CreateUser) -> UserResult<UserResponse> {
        tracing::debug!("Trying to create new user");

        validate_email(&payload.email)?;
        let name = non_blank(&payload.name, "name")?;
        let phone = non_blank(&payload.phone, "phone")?;

        // Pre-check; the unique constraint on email closes the remaining
        // race window at the storage layer.
        if self.repository.count_by_email(&payload.email).await? > 0 {
            return Err(UserError::DuplicateEmail(payload.email));
        }

        let age = self.age_lookup.age_for_name(&name).await;

        let user = User::new(name, payload.email, phone, age);
        let created = self.repository.insert(user).await?;

        tracing::debug!(user_id = %created.id, "New user was successfully created");
        Ok(created.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// Apply a partial update to an existing user.
    ///
    /// Present fields are validated with the create rules; a name change
    /// refreshes the looked-up age.
    pub async fn update_user(&self, id: Uuid, payload: UpdateUser) -> UserResult<UserResponse> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if let Some(ref email) = payload.email {
            validate_email(email)?;
            if *email != user.email && self.repository.count_by_email(email).await? > 0 {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }
        let new_name = payload
            .name
            .as_deref()
            .map(|name| non_blank(name, "name"))
            .transpose()?;
        let new_phone = payload
            .phone
            .as_deref()
            .map(|phone| non_blank(phone, "phone"))
            .transpose()?;

        if let Some(name) = new_name {
            if name != user.name {
                // age is derived from the name, so a rename refreshes it
                user.age = self.age_lookup.age_for_name(&name).await;
                user.name = name;
            }
        }
        if let Some(email) = payload.email {
            user.email = email;
        }
        if let Some(phone) = new_phone {
            user.phone = phone;
        }
        user.modified_date = chrono::Utc::now();

        let updated = self.repository.update(user).await?;

        tracing::debug!(user_id = %id, "User was successfully updated");
        Ok(updated.into())
    }

    /// Delete a user by ID
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    /// Delete a batch of users. Nothing is deleted unless every id
    /// resolves to an existing user.
    pub async fn delete_users(&self, ids: &[Uuid]) -> UserResult<()> {
        if ids.is_empty() {
            return Err(UserError::InvalidArgument("No user ids provided.".to_owned()));
        }
        if ids.len() > MAX_BATCH_DELETE {
            return Err(UserError::InvalidArgument(format!(
                "Too many ids in one request. Max batch size: {}.",
                MAX_BATCH_DELETE
            )));
        }

        let found = self.repository.find_by_ids(ids).await?;
        let found_ids: HashSet<Uuid> = found.iter().map(|u| u.id).collect();
        if let Some(missing) = ids.iter().find(|id| !found_ids.contains(id)) {
            return Err(UserError::NotFound(*missing));
        }

        self.repository.delete_many(ids).await?;
        Ok(())
    }
}

fn validate_email(email: &str) -> UserResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(UserError::InvalidUserData(format!(
            "'{}' is not a valid email. Please correct.",
            email
        )));
    }
    Ok(())
}

/// Trim `value`, rejecting blank input with a field-specific message
fn non_blank(value: &str, field: &str) -> UserResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::InvalidUserData(format!(
            "User {} cannot be empty. Please correct.",
            field
        )));
    }
    Ok(trimmed.to_owned())
}
