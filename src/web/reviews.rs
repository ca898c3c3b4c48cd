use crate::middleware::Caller;
use crate::orm::users::Role;
use crate::reviews::{self, ReviewSubmission};
use actix_web::{delete, error, get, post, put, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_review)
        .service(view_review)
        .service(update_review)
        .service(delete_review)
        .service(view_own_reviews);
}

#[derive(Deserialize)]
struct NewReviewForm {
    builder_id: i32,
    #[serde(flatten)]
    submission: ReviewSubmission,
}

#[post("/api/reviews")]
async fn create_review(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewReviewForm>,
) -> Result<HttpResponse, Error> {
    let identity = caller.require_login()?;
    if identity.role == Role::Builder {
        return Err(error::ErrorForbidden("Builders cannot review builders"));
    }

    let NewReviewForm {
        builder_id,
        submission,
    } = form.into_inner();
    let review_id =
        reviews::create_review(db.get_ref(), identity.id, builder_id, submission).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Review created successfully",
        "review_id": review_id,
    })))
}

#[get("/api/reviews/{review_id}")]
async fn view_review(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let review = reviews::get_review(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "review": review })))
}

#[put("/api/reviews/{review_id}")]
async fn update_review(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<ReviewSubmission>,
) -> Result<HttpResponse, Error> {
    let identity = caller.require_login()?;
    reviews::update_review(
        db.get_ref(),
        path.into_inner(),
        identity.id,
        identity.role,
        form.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[delete("/api/reviews/{review_id}")]
async fn delete_review(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let identity = caller.require_login()?;
    reviews::delete_review(db.get_ref(), path.into_inner(), identity.id, identity.role).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// The caller's own review history.
#[get("/api/user/reviews")]
async fn view_own_reviews(
    caller: Caller,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let identity = caller.require_login()?;
    let reviews = reviews::list_reviews_for_author(db.get_ref(), identity.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "reviews": reviews })))
}
