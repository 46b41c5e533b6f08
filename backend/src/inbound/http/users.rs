//! User API handlers.
//!
//! ```text
//! POST   /users       {"name":"Ada"}
//! GET    /users/{id}
//! PUT    /users/{id}  {"name":"Ada Lovelace"}
//! DELETE /users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{FieldError, User, UserDraft, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::map_catalogue_error;
use crate::inbound::http::responses::{WriteAck, invalid_field};
use crate::inbound::http::state::HttpState;

/// Request body for creating or renaming a user.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserRequest {
    pub name: String,
}

impl TryFrom<UserRequest> for UserDraft {
    type Error = FieldError;

    fn try_from(value: UserRequest) -> Result<Self, Self::Error> {
        Self::new(value.name)
    }
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    let draft = UserDraft::try_from(payload.into_inner()).map_err(invalid_field)?;
    let user = state
        .commands
        .create_user(draft, &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Created().json(WriteAck::created("User created successfully", user.id)))
}

#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<User>> {
    let user = state
        .queries
        .get_user(UserId::new(path.into_inner()))
        .await
        .map_err(map_catalogue_error)?;
    Ok(web::Json(user))
}

/// Rename a user. Every project the user belongs to is re-synced.
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    let draft = UserDraft::try_from(payload.into_inner()).map_err(invalid_field)?;
    state
        .commands
        .update_user(UserId::new(path.into_inner()), draft, &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("User updated successfully")))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    state
        .commands
        .delete_user(UserId::new(path.into_inner()), &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("User deleted successfully")))
}
