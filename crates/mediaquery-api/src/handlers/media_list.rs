use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use mediaquery_core::{ListFilter, MediaEntry, MediaType};
use mediaquery_infra::ErrorResponse;
use serde::Deserialize;
use utoipa::IntoParams;

/// Listing filters. Parameters other than these are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMediaQuery {
    /// Only entries whose name begins with this prefix
    pub startswith: Option<String>,
    /// Only entries of this media type (`image` or `video`)
    #[serde(rename = "media-type")]
    pub media_type: Option<String>,
    /// Only entries carrying a label with exactly this name
    pub label: Option<String>,
}

impl ListMediaQuery {
    /// Build from raw query pairs. Unknown keys are dropped; when a key repeats, the
    /// last value wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "startswith" => query.startswith = Some(value),
                "media-type" => query.media_type = Some(value),
                "label" => query.label = Some(value),
                _ => {}
            }
        }
        query
    }

    /// `None` when the requested media type is not one the catalog stores, in which
    /// case no entry can match.
    pub fn into_filter(self) -> Option<ListFilter> {
        let media_type = match self.media_type {
            Some(value) => Some(value.parse::<MediaType>().ok()?),
            None => None,
        };

        Some(ListFilter {
            startswith: self.startswith,
            media_type,
            label: self.label,
        })
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "media",
    params(ListMediaQuery),
    responses(
        (status = 200, description = "Matching catalog entries ordered by name", body = Vec<MediaEntry>),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn list_media(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let query = ListMediaQuery::from_pairs(pairs);
    let requested_type = query.media_type.clone();

    let Some(filter) = query.into_filter() else {
        tracing::debug!(media_type = ?requested_type, "Unknown media type, nothing matches");
        return Ok(Json(Vec::<MediaEntry>::new()));
    };

    let entries = if filter.is_empty() {
        state.catalog.list_all().await?
    } else {
        state.catalog.list(&filter).await?
    };

    tracing::debug!(
        filter = ?filter,
        result_count = entries.len(),
        backend = state.catalog.backend_name(),
        "Listed media"
    );
    Ok(Json(entries))
}
