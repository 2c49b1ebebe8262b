//! Catalog browsing API handlers.
//!
//! These endpoints read the remote catalog live; only the per-category
//! counts come from the local snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::warn;

use reelshelf_core::{CatalogError, Category, SeriesInfo, SeriesSummary};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
    /// Cached series per category id.
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CategorySeriesResponse {
    pub category_id: String,
    pub category_name: String,
    pub series: Vec<SeriesSummary>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/categories
///
/// Live category list plus cached series counts.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = match state.catalog().get_series_categories().await {
        Ok(categories) if !categories.is_empty() => categories,
        Ok(_) => {
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to fetch categories. Please try again later.",
            ))
        }
        Err(e) => {
            warn!("Failed to fetch categories: {}", e);
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to fetch categories. Please try again later.",
            ));
        }
    };

    let counts = state.cache().series_count_by_category().await;
    let total = categories.len();

    Ok(Json(CategoriesResponse {
        categories,
        counts,
        total,
    }))
}

/// GET /api/v1/categories/{id}/series
///
/// Live series list of one category.
pub async fn list_category_series(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<Json<CategorySeriesResponse>, ApiError> {
    let series = state
        .catalog()
        .get_series(&category_id)
        .await
        .map_err(|e| {
            warn!("Failed to list series for category {}: {}", category_id, e);
            api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Could not fetch series for category {}", category_id),
            )
        })?;

    // The name is cosmetic, so a failed lookup is not an error
    let category_name = state
        .catalog()
        .get_series_categories()
        .await
        .ok()
        .and_then(|categories| {
            categories
                .into_iter()
                .find(|c| c.category_id == category_id)
                .map(|c| c.category_name)
        })
        .unwrap_or_else(|| "Unknown Category".to_string());

    let total = series.len();
    Ok(Json(CategorySeriesResponse {
        category_id,
        category_name,
        series,
        total,
    }))
}

/// GET /api/v1/series/{id}
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<String>,
) -> Result<Json<SeriesInfo>, ApiError> {
    match state.catalog().get_series_info(&series_id).await {
        Ok(info) => Ok(Json(info)),
        Err(CatalogError::NotFound(_)) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Series not found: {}", series_id),
        )),
        Err(e) => {
            warn!("Could not fetch series info for ID {}: {}", series_id, e);
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not fetch series information",
            ))
        }
    }
}
