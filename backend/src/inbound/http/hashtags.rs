//! Hashtag API handlers.
//!
//! ```text
//! POST   /hashtags       {"name":"rust"}
//! GET    /hashtags/{id}
//! PUT    /hashtags/{id}  {"name":"rustlang"}
//! DELETE /hashtags/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{FieldError, Hashtag, HashtagDraft, HashtagId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::map_catalogue_error;
use crate::inbound::http::responses::{WriteAck, invalid_field};
use crate::inbound::http::state::HttpState;

/// Request body for creating or relabelling a hashtag.
#[derive(Debug, Deserialize, Serialize)]
pub struct HashtagRequest {
    pub name: String,
}

impl TryFrom<HashtagRequest> for HashtagDraft {
    type Error = FieldError;

    fn try_from(value: HashtagRequest) -> Result<Self, Self::Error> {
        Self::new(value.name)
    }
}

#[post("/hashtags")]
pub async fn create_hashtag(
    state: web::Data<HttpState>,
    payload: web::Json<HashtagRequest>,
) -> ApiResult<HttpResponse> {
    let draft = HashtagDraft::try_from(payload.into_inner()).map_err(invalid_field)?;
    let hashtag = state
        .commands
        .create_hashtag(draft, &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Created().json(WriteAck::created(
        "Hashtag created successfully",
        hashtag.id,
    )))
}

#[get("/hashtags/{id}")]
pub async fn get_hashtag(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Hashtag>> {
    let hashtag = state
        .queries
        .get_hashtag(HashtagId::new(path.into_inner()))
        .await
        .map_err(map_catalogue_error)?;
    Ok(web::Json(hashtag))
}

/// Relabel a hashtag and re-sync every project tagged with it.
#[put("/hashtags/{id}")]
pub async fn update_hashtag(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<HashtagRequest>,
) -> ApiResult<HttpResponse> {
    let draft = HashtagDraft::try_from(payload.into_inner()).map_err(invalid_field)?;
    state
        .commands
        .update_hashtag(
            HashtagId::new(path.into_inner()),
            draft,
            &state.request_token(),
        )
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("Hashtag updated successfully")))
}

#[delete("/hashtags/{id}")]
pub async fn delete_hashtag(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    state
        .commands
        .delete_hashtag(HashtagId::new(path.into_inner()), &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("Hashtag deleted successfully")))
}
