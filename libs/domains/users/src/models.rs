use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User entity - domain representation
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// User display name
    pub name: String,
    /// User email (unique across all users)
    pub email: String,
    /// Contact phone number
    pub phone: String,
    /// Estimated age, derived from the external age lookup. Never
    /// client-supplied.
    pub age: Option<i32>,
    /// Creation timestamp
    pub created_date: DateTime<Utc>,
    /// Last update timestamp
    pub modified_date: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and timestamps
    pub fn new(name: String, email: String, phone: String, age: Option<i32>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            email,
            phone,
            age,
            created_date: now,
            modified_date: now,
        }
    }
}

/// User response DTO - the public shape, without internal timestamps
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: Option<i32>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            age: user.age,
        }
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub email: String,
    #[validate(length(max = 64))]
    pub phone: String,
}

/// DTO for updating an existing user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
}
