use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BrandItem {
    brand_id: Uuid,
    name: String,
    slug: String,
    domain: Option<String>,
    competitor_count: i64,
    prompt_count: i64,
    created_at: DateTime<Utc>,
}

pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandItem>>>, ApiError> {
    let brands = aeomon_db::list_active_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let counts = aeomon_db::count_brand_children(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = brands
        .into_iter()
        .map(|brand| {
            let brand_counts = counts.get(&brand.id);
            BrandItem {
                brand_id: brand.public_id,
                name: brand.name,
                slug: brand.slug,
                domain: brand.domain,
                competitor_count: brand_counts.map_or(0, |c| c.competitor_count),
                prompt_count: brand_counts.map_or(0, |c| c.prompt_count),
                created_at: brand.created_at,
            }
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
