use domain_users::{CreateUser, PageResponse, UpdateUser, UserResponse};
use utoipa::OpenApi;

/// Users API documentation
#[derive(OpenApi)]
#[openapi(
    components(schemas(
        CreateUser,
        UpdateUser,
        UserResponse,
        PageResponse<UserResponse>,
    )),
    tags((name = "users", description = "User management and search"))
)]
pub struct ApiDoc;
