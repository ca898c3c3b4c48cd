//! Review schema endpoints: the public form definition and the admin editor.

use crate::cache::SchemaCache;
use crate::middleware::Caller;
use crate::review_schema::{self, NewReviewField, ReviewFieldChanges};
use actix_web::{delete, get, post, put, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_schema)
        .service(reorder_fields)
        .service(admin_view_schema)
        .service(create_field)
        .service(update_field)
        .service(delete_field);
}

#[derive(Deserialize)]
struct FieldUpdateForm {
    id: i32,
    #[serde(flatten)]
    changes: ReviewFieldChanges,
}

#[derive(Deserialize)]
struct FieldIdForm {
    id: i32,
}

#[derive(Deserialize)]
struct ReorderForm {
    #[serde(alias = "orderedIds")]
    ordered_ids: Vec<i32>,
}

/// Definitions the review form is rendered from.
#[get("/api/review-schema")]
async fn view_schema(
    db: web::Data<DatabaseConnection>,
    cache: web::Data<SchemaCache>,
) -> Result<HttpResponse, Error> {
    let fields = match cache.get() {
        Some(fields) => fields,
        None => {
            let generation = cache.generation();
            let fields = review_schema::list_fields(db.get_ref())
                .await
                .map_err(crate::error::ServiceError::from)?;
            cache.store(generation, fields.clone());
            fields
        }
    };
    Ok(HttpResponse::Ok().json(json!({ "fields": fields })))
}

#[get("/api/admin/review-schema")]
async fn admin_view_schema(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let fields = review_schema::list_fields(db.get_ref())
        .await
        .map_err(crate::error::ServiceError::from)?;
    Ok(HttpResponse::Ok().json(json!({ "fields": fields })))
}

#[post("/api/admin/review-schema")]
async fn create_field(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<SchemaCache>,
    form: web::Json<NewReviewField>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let field = review_schema::create_field(db.get_ref(), form.into_inner()).await?;
    cache.invalidate();
    Ok(HttpResponse::Created().json(json!({ "field": field })))
}

#[put("/api/admin/review-schema")]
async fn update_field(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<SchemaCache>,
    form: web::Json<FieldUpdateForm>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    let FieldUpdateForm { id, changes } = form.into_inner();
    let field = review_schema::update_field(db.get_ref(), id, changes).await?;
    cache.invalidate();
    Ok(HttpResponse::Ok().json(json!({ "field": field })))
}

#[delete("/api/admin/review-schema")]
async fn delete_field(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<SchemaCache>,
    form: web::Json<FieldIdForm>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    review_schema::delete_field(db.get_ref(), form.id).await?;
    cache.invalidate();
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/api/admin/review-schema/reorder")]
async fn reorder_fields(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<SchemaCache>,
    form: web::Json<ReorderForm>,
) -> Result<HttpResponse, Error> {
    caller.require_admin()?;
    review_schema::reorder(db.get_ref(), &form.ordered_ids).await?;
    cache.invalidate();
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
