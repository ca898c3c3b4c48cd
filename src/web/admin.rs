//! Admin console: builder moderation and headline stats.

use super::builders::DirectoryQuery;
use crate::directory::{self, ModerationUpdate, NewBuilder};
use crate::middleware::Caller;
use actix_web::{get, patch, post, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_builders)
        .service(create_builder)
        .service(update_builder)
        .service(view_stats);
}

#[get("/api/admin/builders")]
async fn view_builders(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    query: web::Query<DirectoryQuery>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let page = directory::admin_list(
        db.get_ref(),
        &query.search,
        query.page.unwrap_or(1),
        crate::app_config::directory().admin_page_size,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "builders": page.items,
        "pagination": page.pagination,
    })))
}

#[post("/api/admin/builders")]
async fn create_builder(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewBuilder>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let builder = directory::create_builder(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "builder": builder })))
}

#[patch("/api/admin/builders/{builder_id}")]
async fn update_builder(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<ModerationUpdate>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    directory::update_moderation(db.get_ref(), path.into_inner(), form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/api/admin/stats")]
async fn view_stats(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let stats = directory::stats(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}
