//! HTTP inbound adapter exposing the catalogue REST endpoints.

pub mod error;
pub mod hashtags;
pub mod health;
pub mod projects;
pub mod responses;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register the catalogue endpoints and their extractor configuration.
///
/// Health probes are registered separately because they carry their own
/// state.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use fold_backend::inbound::http::configure;
///
/// let app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(hashtags::create_hashtag)
        .service(hashtags::get_hashtag)
        .service(hashtags::update_hashtag)
        .service(hashtags::delete_hashtag)
        .service(projects::create_project)
        .service(projects::list_projects)
        .service(projects::get_project)
        .service(projects::update_project)
        .service(projects::delete_project);
}
