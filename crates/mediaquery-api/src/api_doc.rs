//! OpenAPI documentation, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::handlers;
use mediaquery_core::models;
use mediaquery_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Media Query API",
        version = "0.1.0",
        description = "Read-only catalog of media objects in the media bucket. Entries are written by the ingest consumer when objects are created or removed; this API lists them by name prefix, media type or label and fetches single entries by name."
    ),
    paths(
        handlers::media_list::list_media,
        handlers::media_get::get_media,
        handlers::health::healthz,
    ),
    components(schemas(
        models::MediaEntry,
        models::MediaType,
        models::Label,
        ErrorResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "media", description = "Catalog queries"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
