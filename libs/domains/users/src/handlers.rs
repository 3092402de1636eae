use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{UuidPath, ValidatedJson};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::agify::AgeLookup;
use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repository::UserRepository;
use crate::search::{PageResponse, SearchParams};
use crate::service::UserService;

/// Create the users router with all HTTP endpoints
pub fn router<R, A>(service: UserService<R, A>) -> Router
where
    R: UserRepository + 'static,
    A: AgeLookup + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/",
            get(search_users).post(create_user).delete(delete_users),
        )
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(shared_service)
}

/// Search users with filters, sorting, and pagination
///
/// GET /users?page=0&size=20&sort=name,desc&name=&email=&phone=
async fn search_users<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    Query(params): Query<SearchParams>,
) -> UserResult<Json<PageResponse<UserResponse>>> {
    let page = service.search_users(params).await?;
    Ok(Json(page))
}

/// Create a new user
///
/// POST /users
async fn create_user<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    ValidatedJson(payload): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
///
/// GET /users/:id
async fn get_user<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user
///
/// PUT /users/:id
async fn update_user<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(payload): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_user(id, payload).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /users/:id
async fn delete_user<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    UuidPath(id): UuidPath,
) -> UserResult<impl IntoResponse> {
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Batch delete request parameters
#[derive(Debug, Deserialize)]
struct DeleteUsersParams {
    /// Comma-separated list of user ids
    ids: String,
}

/// Delete a batch of users
///
/// DELETE /users?ids=id1,id2,...
async fn delete_users<R: UserRepository, A: AgeLookup>(
    State(service): State<Arc<UserService<R, A>>>,
    Query(params): Query<DeleteUsersParams>,
) -> UserResult<impl IntoResponse> {
    let ids = parse_ids(&params.ids)?;
    service.delete_users(&ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_ids(raw: &str) -> UserResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| UserError::InvalidArgument(format!("Invalid user id: '{}'.", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FixedAge(Option<i32>);

    #[async_trait]
    impl AgeLookup for FixedAge {
        async fn age_for_name(&self, _name: &str) -> Option<i32> {
            self.0
        }
    }

    fn app() -> Router {
        router(UserService::new(
            InMemoryUserRepository::new(),
            FixedAge(Some(30)),
        ))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json_body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json_body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(app: &Router, name: &str, email: &str, phone: &str) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/",
            Some(json!({"name": name, "email": email, "phone": phone})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }

    #[tokio::test]
    async fn test_create_returns_created_user_with_age() {
        let app = app();
        let body = create(&app, "John", "john@mail.com", "12345").await;

        assert_eq!(body["name"], "John");
        assert_eq!(body["email"], "john@mail.com");
        assert_eq!(body["phone"], "12345");
        assert_eq!(body["age"], 30);
        assert!(body["id"].is_string());
        // internal timestamps are not exposed
        assert!(body.get("createdDate").is_none());
        assert!(body.get("modifiedDate").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/",
            Some(json!({"name": "John", "email": "not_an_email", "phone": "1"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_user_data");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let app = app();
        create(&app, "John", "john@mail.com", "1").await;

        let (status, body) = send(
            &app,
            "POST",
            "/",
            Some(json!({"name": "Clone", "email": "john@mail.com", "phone": "2"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_user_data");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("already exists")
        );
    }

    #[tokio::test]
    async fn test_pagination_walk() {
        let app = app();
        for i in 0..5 {
            create(&app, &format!("User {i}"), &format!("e{i}@mail.com"), "123456").await;
        }

        let (status, page1) = send(&app, "GET", "/?page=0&size=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page1["content"].as_array().unwrap().len(), 2);
        assert_eq!(page1["number"], 0);
        assert_eq!(page1["size"], 2);
        assert_eq!(page1["totalElements"], 5);
        assert_eq!(page1["hasNext"], true);

        let (_, page2) = send(&app, "GET", "/?page=1&size=2", None).await;
        assert_eq!(page2["content"].as_array().unwrap().len(), 2);
        assert_eq!(page2["hasNext"], true);

        let (_, page3) = send(&app, "GET", "/?page=2&size=2", None).await;
        assert_eq!(page3["content"].as_array().unwrap().len(), 1);
        assert_eq!(page3["hasNext"], false);

        // the three pages cover the full set with no duplicates
        let mut ids: Vec<String> = [&page1, &page2, &page3]
            .iter()
            .flat_map(|page| page["content"].as_array().unwrap())
            .map(|user| user["id"].as_str().unwrap().to_owned())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_sort_by_name_descending() {
        let app = app();
        for (name, email) in [
            ("User C", "ec@mail.com"),
            ("User A", "ea@mail.com"),
            ("User E", "ee@mail.com"),
            ("User B", "eb@mail.com"),
            ("User D", "ed@mail.com"),
        ] {
            create(&app, name, email, "123456").await;
        }

        let (status, page) = send(&app, "GET", "/?size=10&sort=name,desc", None).await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = page["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|user| user["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["User E", "User D", "User C", "User B", "User A"]);
    }

    #[tokio::test]
    async fn test_search_by_name_substring_case_insensitive() {
        let app = app();
        create(&app, "John", "john@mail.com", "123456").await;
        create(&app, "Johnathan", "johnathan@mail.com", "123456").await;
        create(&app, "James", "james@mail.com", "123456").await;

        let (_, page) = send(&app, "GET", "/?name=John&sort=name,desc", None).await;
        assert_eq!(page["totalElements"], 2);
        let names: Vec<&str> = page["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|user| user["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Johnathan", "John"]);

        let (_, page) = send(&app, "GET", "/?name=nathan", None).await;
        assert_eq!(page["totalElements"], 1);
        assert_eq!(page["content"][0]["name"], "Johnathan");
    }

    #[tokio::test]
    async fn test_search_by_exact_email() {
        let app = app();
        create(&app, "John", "john@mail.com", "123456").await;
        create(&app, "James", "james@mail.com", "123456").await;

        let (_, page) = send(&app, "GET", "/?email=james@mail.com", None).await;
        assert_eq!(page["totalElements"], 1);
        assert_eq!(page["content"][0]["name"], "James");

        // substring email search is unsupported
        let (_, page) = send(&app, "GET", "/?email=@mail.com", None).await;
        assert_eq!(page["totalElements"], 0);
        assert_eq!(page["hasNext"], false);
    }

    #[tokio::test]
    async fn test_search_by_exact_phone() {
        let app = app();
        create(&app, "John", "john@mail.com", "1234").await;
        create(&app, "Johnathan", "johnathan@mail.com", "12345").await;
        create(&app, "James", "james@mail.com", "123456").await;

        let (_, page) = send(&app, "GET", "/?phone=1234", None).await;
        assert_eq!(page["totalElements"], 1);
        assert_eq!(page["content"][0]["name"], "John");

        let (_, page) = send(&app, "GET", "/?phone=234", None).await;
        assert_eq!(page["totalElements"], 0);
    }

    #[tokio::test]
    async fn test_search_by_combined_filters() {
        let app = app();
        create(&app, "John", "john@mail.com", "1234").await;
        create(&app, "Johnathan", "johnathan@mail.com", "12345").await;
        create(&app, "James", "james@mail.com", "123456").await;

        let (_, page) = send(&app, "GET", "/?name=john&phone=12345", None).await;
        assert_eq!(page["totalElements"], 1);
        assert_eq!(page["content"][0]["name"], "Johnathan");
    }

    #[tokio::test]
    async fn test_search_rejects_unsupported_sort_property() {
        let app = app();
        let (status, body) = send(&app, "GET", "/?sort=email,asc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_argument");
        assert_eq!(
            body["error"]["message"],
            "Unsupported sort property: 'email'."
        );
    }

    #[tokio::test]
    async fn test_search_rejects_bad_pagination() {
        let app = app();

        let (status, body) = send(&app, "GET", "/?page=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid page number param.");

        let (status, body) = send(&app, "GET", "/?size=101", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Invalid page size param. Max page size: 100."
        );
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let app = app();
        let created = create(&app, "John", "john@mail.com", "1").await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(&app, "GET", &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "John");

        let (status, _) = send(&app, "GET", &format!("/{}", Uuid::now_v7()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_user() {
        let app = app();
        let created = create(&app, "John", "john@mail.com", "1").await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/{id}"),
            Some(json!({"phone": "999"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phone"], "999");
        assert_eq!(body["name"], "John");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/{}", Uuid::now_v7()),
            Some(json!({"phone": "999"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = app();
        let created = create(&app, "John", "john@mail.com", "1").await;
        let id = created["id"].as_str().unwrap();

        let (status, _) = send(&app, "DELETE", &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_delete() {
        let app = app();
        let a = create(&app, "A", "a@mail.com", "1").await;
        let b = create(&app, "B", "b@mail.com", "2").await;
        create(&app, "C", "c@mail.com", "3").await;

        let uri = format!(
            "/?ids={},{}",
            a["id"].as_str().unwrap(),
            b["id"].as_str().unwrap()
        );
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, page) = send(&app, "GET", "/", None).await;
        assert_eq!(page["totalElements"], 1);
    }

    #[tokio::test]
    async fn test_batch_delete_rejects_malformed_id() {
        let app = app();
        let (status, body) = send(&app, "DELETE", "/?ids=not-a-uuid", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_argument");
        assert_eq!(body["error"]["message"], "Invalid user id: 'not-a-uuid'.");
    }

    #[tokio::test]
    async fn test_batch_delete_rejects_unknown_id() {
        let app = app();
        let a = create(&app, "A", "a@mail.com", "1").await;

        let uri = format!("/?ids={},{}", a["id"].as_str().unwrap(), Uuid::now_v7());
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // nothing was deleted
        let (_, page) = send(&app, "GET", "/", None).await;
        assert_eq!(page["totalElements"], 1);
    }

    #[tokio::test]
    async fn test_batch_delete_rejects_oversized_id_list() {
        let app = app();
        let ids: Vec<String> = (0..101).map(|_| Uuid::now_v7().to_string()).collect();

        let (status, body) = send(&app, "DELETE", &format!("/?ids={}", ids.join(",")), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("Max batch size: 100.")
        );
    }
}
