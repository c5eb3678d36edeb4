use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::db::districts::DistrictDirectory;
use crate::error::ApiError;
use crate::models::district::DistrictSummary;

#[derive(serde::Deserialize)]
pub struct QueryParams {
    limit: Option<u16>,
    search: Option<String>,
}

/*
    GET /api/districts
*/
pub async fn get_districts(
    districts: web::Data<dyn DistrictDirectory>,
    params: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    // `limit=0` means no limit, as it does for the driver.
    let limit = params.limit.filter(|limit| *limit > 0);
    let data: Vec<DistrictSummary> = districts
        .list_districts(params.search.as_deref(), limit)
        .await?
        .into_iter()
        .map(DistrictSummary::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": data,
    })))
}
