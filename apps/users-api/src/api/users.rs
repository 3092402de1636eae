use axum::Router;
use domain_users::{AgifyClient, PgUserRepository, UserService, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgUserRepository::new(state.db.clone());
    let service = UserService::new(repository, AgifyClient::new());
    handlers::router(service)
}
