use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entity;
use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::repository::UserRepository;
use crate::search::{SearchQuery, SortDirection, SortField, UserFilters};

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Conjunction of the present filters. Name matching upper-cases both
/// sides so the comparison is case-insensitive regardless of collation.
fn filter_condition(filters: &UserFilters) -> Condition {
    let mut condition = Condition::all();

    if let Some(name) = filters.name() {
        condition = condition.add(
            Func::upper(Expr::col(entity::Column::Name))
                .like(format!("%{}%", name.to_uppercase())),
        );
    }
    if let Some(email) = filters.email() {
        condition = condition.add(entity::Column::Email.eq(email));
    }
    if let Some(phone) = filters.phone() {
        condition = condition.add(entity::Column::Phone.eq(phone));
    }

    condition
}

/// Map an allow-listed sort field to its entity column
fn sort_column(field: SortField) -> entity::Column {
    match field {
        SortField::Name => entity::Column::Name,
        SortField::CreatedDate => entity::Column::CreatedDate,
        SortField::ModifiedDate => entity::Column::ModifiedDate,
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("duplicate key") || message.contains("unique constraint")
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: User) -> UserResult<User> {
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateEmail(email)
            } else {
                UserError::Internal(format!("Database error: {}", e))
            }
        })?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(|m| m.into()))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .filter(entity::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id;
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let model = active_model.update(&self.db).await.map_err(|e| {
            if matches!(e, DbErr::RecordNotUpdated) {
                UserError::NotFound(id)
            } else if is_unique_violation(&e) {
                UserError::DuplicateEmail(email)
            } else {
                UserError::Internal(format!("Database error: {}", e))
            }
        })?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_many(&self, ids: &[Uuid]) -> UserResult<u64> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        tracing::info!(count = result.rows_affected, "Deleted users in batch");
        Ok(result.rows_affected)
    }

    async fn count_by_email(&self, email: &str) -> UserResult<u64> {
        entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))
    }

    async fn search(&self, query: &SearchQuery) -> UserResult<(Vec<User>, u64)> {
        let condition = filter_condition(query.filters());

        let total = entity::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        let mut select = entity::Entity::find().filter(condition);
        for sort in query.sorts() {
            let order = match sort.direction {
                SortDirection::Ascending => Order::Asc,
                SortDirection::Descending => Order::Desc,
            };
            select = select.order_by(sort_column(sort.field), order);
        }
        // id tie-break keeps equal sort values from shuffling across pages
        select = select.order_by_asc(entity::Column::Id);

        let models = select
            .limit(query.size())
            .offset(query.offset())
            .all(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok((models.into_iter().map(|m| m.into()).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchParams;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, RuntimeErr, Value};
    use std::collections::BTreeMap;

    fn model(name: &str, email: &str, phone: &str) -> entity::Model {
        entity::Model {
            id: Uuid::now_v7(),
            name: name.to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            age: Some(30),
            created_date: Utc::now().into(),
            modified_date: Utc::now().into(),
        }
    }

    fn count_row(count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(count)))])
    }

    #[tokio::test]
    async fn test_search_returns_rows_and_total() {
        let rows = vec![model("User A", "a@mail.com", "1"), model("User B", "b@mail.com", "2")];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(5)]])
            .append_query_results([rows.clone()])
            .into_connection();

        let repo = PgUserRepository::new(db);
        let query = SearchQuery::parse(SearchParams {
            size: Some(2),
            ..Default::default()
        })
        .unwrap();

        let (users, total) = repo.search(&query).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "User A");
        assert_eq!(users[0].age, Some(30));
        assert_eq!(users[1].email, "b@mail.com");
    }

    #[tokio::test]
    async fn test_insert_maps_unique_violation_to_duplicate_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"users_email_key\"".to_owned(),
            ))])
            .into_connection();

        let repo = PgUserRepository::new(db);
        let user = User::new(
            "John".to_owned(),
            "john@mail.com".to_owned(),
            "12345".to_owned(),
            None,
        );

        let result = repo.insert(user).await;
        match result {
            Err(UserError::DuplicateEmail(email)) => assert_eq!(email, "john@mail.com"),
            other => panic!("expected DuplicateEmail, got {:?}", other.map(|u| u.email)),
        }
    }

    #[tokio::test]
    async fn test_search_issues_count_and_fetch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(0)]])
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();

        let repo = PgUserRepository::new(db);
        let query = SearchQuery::parse(SearchParams {
            page: Some(1),
            size: Some(10),
            sort: Some("createdDate,desc".to_owned()),
            name: Some("john".to_owned()),
            email: Some("j@mail.com".to_owned()),
            ..Default::default()
        })
        .unwrap();

        let (users, total) = repo.search(&query).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(total, 0);

        // one count query plus one page fetch
        let log = repo.db.into_transaction_log();
        assert_eq!(log.len(), 2);
    }
}
