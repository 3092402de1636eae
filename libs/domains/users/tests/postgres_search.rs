//! End-to-end repository tests against a real PostgreSQL instance.
//!
//! These need a Docker daemon for Testcontainers and are ignored by
//! default; run with `cargo test -- --ignored` on a machine with Docker.

use domain_users::{
    PgUserRepository, SearchParams, SearchQuery, User, UserError, UserRepository,
};
use test_utils::TestDatabase;

fn user(name: &str, email: &str, phone: &str) -> User {
    User::new(name.to_owned(), email.to_owned(), phone.to_owned(), None)
}

fn query(params: SearchParams) -> SearchQuery {
    SearchQuery::parse(params).unwrap()
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn search_filters_sorts_and_paginates() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());

    for (name, email, phone) in [
        ("John", "john@mail.com", "1234"),
        ("Johnathan", "johnathan@mail.com", "12345"),
        ("James", "james@mail.com", "123456"),
        ("User A", "ua@mail.com", "1"),
        ("User B", "ub@mail.com", "2"),
    ] {
        repo.insert(user(name, email, phone)).await.unwrap();
    }

    // case-insensitive substring on the name, descending
    let (users, total) = repo
        .search(&query(SearchParams {
            name: Some("john".to_owned()),
            sort: Some("name,desc".to_owned()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(total, 2);
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Johnathan", "John"]);

    // exact email match only
    let (_, total) = repo
        .search(&query(SearchParams {
            email: Some("@mail.com".to_owned()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(total, 0);

    // page walk is exhaustive and non-overlapping
    let mut seen = std::collections::HashSet::new();
    for page in 0..3 {
        let (users, total) = repo
            .search(&query(SearchParams {
                page: Some(page),
                size: Some(2),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(total, 5);
        for u in users {
            assert!(seen.insert(u.id));
        }
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn unique_constraint_closes_duplicate_email_race() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());

    repo.insert(user("John", "john@mail.com", "1")).await.unwrap();

    // Bypassing the service-level pre-check entirely: the database
    // constraint alone must reject the duplicate.
    let result = repo.insert(user("Clone", "john@mail.com", "2")).await;
    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}
