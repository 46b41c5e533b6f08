//! Project API handlers.
//!
//! ```text
//! POST   /projects       {"name":"Fold","slug":"fold","description":"","user_ids":[1],"hashtag_ids":[2]}
//! GET    /projects
//! GET    /projects/{id}
//! PUT    /projects/{id}  (same body as POST; associations are replaced)
//! DELETE /projects/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    FieldError, HashtagId, ProjectDetails, ProjectDraft, ProjectId, ProjectLinks, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::map_catalogue_error;
use crate::inbound::http::responses::{WriteAck, invalid_field};
use crate::inbound::http::state::HttpState;

/// Request body for creating or replacing a project.
///
/// Omitted id lists mean "no associations".
#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_ids: Vec<i32>,
    #[serde(default)]
    pub hashtag_ids: Vec<i32>,
}

impl ProjectRequest {
    fn into_parts(self) -> Result<(ProjectDraft, ProjectLinks), FieldError> {
        let draft = ProjectDraft::new(self.name, self.slug, self.description)?;
        let links = ProjectLinks::new(
            self.user_ids.into_iter().map(UserId::new),
            self.hashtag_ids.into_iter().map(HashtagId::new),
        );
        Ok((draft, links))
    }
}

/// Create a project with its associations and publish its first snapshot.
#[post("/projects")]
pub async fn create_project(
    state: web::Data<HttpState>,
    payload: web::Json<ProjectRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, links) = payload.into_inner().into_parts().map_err(invalid_field)?;
    let project = state
        .commands
        .create_project(draft, links, &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Created().json(WriteAck::created(
        "Project created successfully",
        project.id,
    )))
}

#[get("/projects")]
pub async fn list_projects(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<ProjectDetails>>> {
    let projects = state
        .queries
        .list_projects()
        .await
        .map_err(map_catalogue_error)?;
    Ok(web::Json(projects))
}

#[get("/projects/{id}")]
pub async fn get_project(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<ProjectDetails>> {
    let project = state
        .queries
        .get_project(ProjectId::new(path.into_inner()))
        .await
        .map_err(map_catalogue_error)?;
    Ok(web::Json(project))
}

#[put("/projects/{id}")]
pub async fn update_project(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<ProjectRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, links) = payload.into_inner().into_parts().map_err(invalid_field)?;
    state
        .commands
        .update_project(
            ProjectId::new(path.into_inner()),
            draft,
            links,
            &state.request_token(),
        )
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("Project updated successfully")))
}

#[delete("/projects/{id}")]
pub async fn delete_project(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    state
        .commands
        .delete_project(ProjectId::new(path.into_inner()), &state.request_token())
        .await
        .map_err(map_catalogue_error)?;
    Ok(HttpResponse::Ok().json(WriteAck::new("Project deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCatalogueCommand, MockCatalogueQuery};
    use crate::domain::{CatalogueError, EntityKind};
    use crate::inbound::http::test_utils::test_app;
    use crate::test_support::fixed_instant;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn details(id: i32, user_ids: &[i32], hashtag_ids: &[i32]) -> ProjectDetails {
        ProjectDetails {
            id: ProjectId::new(id),
            name: "Fold".to_owned(),
            slug: "fold".to_owned(),
            description: "search sync".to_owned(),
            created_at: fixed_instant(),
            user_ids: user_ids.iter().copied().map(UserId::new).collect(),
            hashtag_ids: hashtag_ids.iter().copied().map(HashtagId::new).collect(),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn create_collapses_duplicate_ids() {
        let mut commands = MockCatalogueCommand::new();
        commands
            .expect_create_project()
            .withf(|draft, links, _| {
                draft.slug() == "fold"
                    && links.user_ids.len() == 1
                    && links.hashtag_ids.iter().copied().eq([HashtagId::new(2), HashtagId::new(5)])
            })
            .times(1)
            .returning(|_, _, _| Ok(details(11, &[1], &[2, 5])));
        let app = actix_test::init_service(test_app(commands, MockCatalogueQuery::new())).await;

        let request = actix_test::TestRequest::post()
            .uri("/projects")
            .set_json(json!({
                "name": "Fold",
                "slug": "fold",
                "description": "search sync",
                "user_ids": [1, 1],
                "hashtag_ids": [5, 2, 5]
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: WriteAck = actix_test::read_body_json(response).await;
        assert_eq!(body, WriteAck::created("Project created successfully", 11));
    }

    #[rstest]
    #[case(json!({"name": "Fold", "slug": "Fold Sync"}), "slug `Fold Sync` may only contain lowercase letters, digits, and hyphens")]
    #[case(json!({"name": " ", "slug": "fold"}), "name must not be blank")]
    #[actix_web::test]
    async fn invalid_fields_are_rejected(#[case] payload: Value, #[case] reason: &str) {
        let mut commands = MockCatalogueCommand::new();
        commands.expect_create_project().never();
        let app = actix_test::init_service(test_app(commands, MockCatalogueQuery::new())).await;

        let request = actix_test::TestRequest::post()
            .uri("/projects")
            .set_json(payload)
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["reason"], reason);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_association_is_a_bad_request() {
        let mut commands = MockCatalogueCommand::new();
        commands
            .expect_update_project()
            .returning(|_, _, _, _| Err(CatalogueError::validation(EntityKind::Hashtag, 9)));
        let app = actix_test::init_service(test_app(commands, MockCatalogueQuery::new())).await;

        let request = actix_test::TestRequest::put()
            .uri("/projects/3")
            .set_json(json!({"name": "Fold", "slug": "fold", "hashtag_ids": [9]}))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"], json!({"entity": "hashtag", "id": 9}));
    }

    #[rstest]
    #[actix_web::test]
    async fn list_returns_projects_with_association_ids() {
        let mut queries = MockCatalogueQuery::new();
        queries
            .expect_list_projects()
            .returning(|| Ok(vec![details(1, &[4], &[]), details(2, &[], &[7, 8])]));
        let app = actix_test::init_service(test_app(MockCatalogueCommand::new(), queries)).await;

        let request = actix_test::TestRequest::get().uri("/projects").to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body[0]["user_ids"], json!([4]));
        assert_eq!(body[1]["hashtag_ids"], json!([7, 8]));
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_acknowledges() {
        let mut commands = MockCatalogueCommand::new();
        commands
            .expect_delete_project()
            .withf(|id, _| *id == ProjectId::new(4))
            .returning(|_, _| Ok(()));
        let app = actix_test::init_service(test_app(commands, MockCatalogueQuery::new())).await;

        let request = actix_test::TestRequest::delete()
            .uri("/projects/4")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: WriteAck = actix_test::read_body_json(response).await;
        assert_eq!(body.message, "Project deleted successfully");
    }
}
