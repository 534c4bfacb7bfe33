//! HTTP handler functions for the hotspot map.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError as _, web};
use hotspot_map_server_models::{
    ApiHealth, ApiHotspots, ApiMonth, HotspotQueryParams, MonthForm,
};

use crate::page::{PageView, render_index};
use crate::render::render_month;
use crate::{AppState, ServerError};

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// `GET /`
///
/// Shows the selector and the default map.
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    html(
        StatusCode::OK,
        render_index(&PageView {
            months: state.analyzer.months(),
            selected: None,
            map_path: &state.default_map,
            error: None,
        }),
    )
}

/// `POST /`
///
/// Labels the submitted month, writes its map, and shows it. Failures are
/// shown on the page with the matching status code and the default map.
pub async fn submit(state: web::Data<AppState>, form: web::Form<MonthForm>) -> HttpResponse {
    let month = form.into_inner().month;
    log::info!("Rendering map for '{month}'");

    let task_state = state.clone();
    let task_month = month.clone();
    let result = web::block(move || {
        render_month(
            &task_state.analyzer,
            &task_state.static_dir,
            &task_state.view,
            &task_month,
        )
    })
    .await
    .map_err(ServerError::from)
    .and_then(|r| r);

    match result {
        Ok(rendered) => html(
            StatusCode::OK,
            render_index(&PageView {
                months: state.analyzer.months(),
                selected: Some(&rendered.month),
                map_path: &rendered.artifact.relative_path,
                error: None,
            }),
        ),
        Err(e) => {
            if e.status_code().is_server_error() {
                log::error!("Failed to render '{month}': {e}");
            } else {
                log::warn!("Rejected month '{month}': {e}");
            }
            html(
                e.status_code(),
                render_index(&PageView {
                    months: state.analyzer.months(),
                    selected: Some(&month),
                    map_path: &state.default_map,
                    error: Some(&e.to_string()),
                }),
            )
        }
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/months`
///
/// Lists the selectable months.
pub async fn months(state: web::Data<AppState>) -> HttpResponse {
    let months: Vec<ApiMonth> = state.analyzer.months().iter().map(ApiMonth::from).collect();
    HttpResponse::Ok().json(months)
}

/// `GET /api/hotspots?month=June`
///
/// Returns the labeled locations for a month without rendering a map.
///
/// # Errors
///
/// Returns [`ServerError`] if the month is unknown or labeling fails.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotQueryParams>,
) -> Result<HttpResponse, ServerError> {
    let month = params.into_inner().month;
    let task_state = state.clone();
    let classification = web::block(move || task_state.analyzer.classify(&month)).await??;
    Ok(HttpResponse::Ok().json(ApiHotspots::from(classification.as_ref())))
}
