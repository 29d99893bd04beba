//! Generated API documentation.

use ::auth::DEFAULT_SESSION_COOKIE;
use axum::{Json, Router, response::Html, routing::get};
use entities::{WorkItem, WorkStatus};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use work_protocol::{ErrorBody, FieldError, WorkMutation};

use super::{auth, work};
use crate::state::SharedState;

/// OpenAPI description of the work and session routes.
#[derive(OpenApi)]
#[openapi(
    paths(
        work::list_works,
        work::add_work,
        work::update_work,
        work::delete_work,
        auth::get_session,
        auth::sign_out
    ),
    components(schemas(
        WorkItem,
        WorkStatus,
        WorkMutation,
        FieldError,
        ErrorBody,
        auth::SessionView,
        auth::SessionUser
    )),
    modifiers(&SessionSecurity),
    tags(
        (name = "works", description = "Work items of the caller"),
        (name = "auth", description = "Session pass-through")
    )
)]
pub struct ApiDoc;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = "worktrack API".to_string();
        openapi.info.description = Some("Personal work item tracker".to_string());

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(DEFAULT_SESSION_COOKIE))),
            );
        }
    }
}

const SCALAR_PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <title>worktrack API</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
  </head>
  <body>
    <script
      id="api-reference"
      data-url="/api/openapi"
      data-configuration='{"theme":"deepSpace","layout":"modern"}'
    ></script>
    <script src="https://cdn.jsdelivr.net/npm/@scalar/api-reference"></script>
  </body>
</html>
"#;

/// Public documentation routes, mounted under the API base path.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/openapi", get(openapi_document))
        .route("/scalar-docs", get(scalar_docs))
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn scalar_docs() -> Html<&'static str> {
    Html(SCALAR_PAGE)
}
