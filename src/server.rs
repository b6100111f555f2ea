//! HTTP front end for the dashboard.
//!
//! One worker, one `Mutex`: a year selection is a single synchronous
//! request/response that recomputes (or reuses) the year view and returns the
//! whole page again.

use std::sync::Mutex;

use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use serde::Deserialize;
use tracing::{error, info};

use crate::dashboard::Dashboard;
use crate::page::{self, PageMode};

pub(crate) struct AppState {
    pub(crate) dashboard: Mutex<Dashboard>,
}

#[derive(Deserialize)]
struct YearQuery {
    year: Option<i32>,
}

pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_route))
        .route("/healthz", web::get().to(health_route));
}

async fn index_route(state: web::Data<AppState>, query: web::Query<YearQuery>) -> HttpResponse {
    match render_index(&state, query.year) {
        Ok(body) => HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .body(body),
        Err(err) => {
            error!("failed to render dashboard: {err:#}");
            HttpResponse::InternalServerError().body("failed to render dashboard")
        }
    }
}

fn render_index(state: &AppState, year: Option<i32>) -> anyhow::Result<String> {
    let mut dashboard = state
        .dashboard
        .lock()
        .map_err(|_| anyhow::anyhow!("dashboard state poisoned"))?;
    let view = dashboard.view(year)?;
    info!(
        requested = ?year,
        year = ?view.year,
        count = view.count,
        markers = view.map.markers.len(),
        "serving dashboard"
    );
    page::build_page(&view, PageMode::Interactive { action: "/" })
        .context("failed to build dashboard page")
}

async fn health_route() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub async fn serve(dashboard: Dashboard, bind: &str, port: u16) -> anyhow::Result<()> {
    let state = web::Data::new(AppState {
        dashboard: Mutex::new(dashboard),
    });

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .workers(1)
        .bind((bind, port))
        .with_context(|| format!("failed to bind {bind}:{port}"))?;

    info!("dashboard listening on http://{bind}:{port}/");
    server.run().await.context("dashboard server stopped")
}
