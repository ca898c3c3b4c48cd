//! Public builder directory endpoints.

use crate::directory;
use crate::middleware::Caller;
use actix_web::{get, post, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(lookup_builder)
        .service(view_builders)
        .service(view_builder);
}

#[derive(Deserialize)]
pub(super) struct DirectoryQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Deserialize)]
struct LookupForm {
    name: String,
}

#[get("/api/builders")]
async fn view_builders(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    query: web::Query<DirectoryQuery>,
) -> Result<HttpResponse, Error> {
    let page = directory::search(
        db.get_ref(),
        &query.search,
        query.page.unwrap_or(1),
        crate::app_config::directory().page_size,
        caller.is_admin(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "builders": page.items,
        "pagination": page.pagination,
    })))
}

#[get("/api/builders/{builder_id}")]
async fn view_builder(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let profile = directory::get_builder(db.get_ref(), path.into_inner(), caller.is_admin()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Exact-name lookup for the review form.
#[post("/api/builders/lookup")]
async fn lookup_builder(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    form: web::Json<LookupForm>,
) -> Result<HttpResponse, Error> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(actix_web::error::ErrorBadRequest("Name is required"));
    }
    let builder = directory::find_builder_by_name(db.get_ref(), name, caller.is_admin()).await?;
    Ok(HttpResponse::Ok().json(json!({ "builder": builder })))
}
