//! Review records and their photo attachments.
//!
//! Every mutation runs as one transaction: lock the builder row, read the
//! schema snapshot, validate, write the review with its values and photos,
//! then recompute the builder aggregate. Any failure rolls the whole unit back.

use crate::aggregation::{self, sub_average};
use crate::constants::{MAX_REVIEW_PHOTOS, OVERALL_COMMENT_FIELD};
use crate::db::finish_transaction;
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::orm::users::Role;
use crate::orm::{builders, review_images, review_values, reviews, users};
use crate::review_schema::{self, ReviewFieldDefinition};
use crate::validation::{self, FieldValue, SubmittedValues};
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a reviewer submits, for both creation and edits.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewSubmission {
    /// Field `name` → value
    #[serde(default)]
    pub values: SubmittedValues,
    #[serde(default)]
    pub overall_comment: String,
    /// Photo URLs from the storage service
    #[serde(default)]
    pub photos: Vec<String>,
}

/// A stored review as presented to readers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Review {
    pub id: i32,
    pub author_id: i32,
    pub builder_id: i32,
    pub values: SubmittedValues,
    pub overall_comment: String,
    /// Ordered by attachment time
    pub photos: Vec<String>,
    /// Mean of the numeric values this review captured
    pub sub_average: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A review on a builder's page.
#[derive(Clone, Debug, Serialize)]
pub struct BuilderReview {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: Option<String>,
}

/// Builder details shown next to a review in its author's history.
#[derive(Clone, Debug, Serialize)]
pub struct BuilderSnapshot {
    pub id: i32,
    pub name: String,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub is_verified: bool,
}

/// A review in its author's history.
#[derive(Clone, Debug, Serialize)]
pub struct AuthorReview {
    #[serde(flatten)]
    pub review: Review,
    pub builder: BuilderSnapshot,
}

/// Submission with blank photo URLs dropped and the comment resolved.
struct PreparedSubmission {
    values: SubmittedValues,
    overall_comment: String,
    photos: Vec<String>,
}

fn prepare(submission: ReviewSubmission) -> ServiceResult<PreparedSubmission> {
    let photos: Vec<String> = submission
        .photos
        .iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if photos.len() > MAX_REVIEW_PHOTOS {
        return Err(ServiceError::LimitExceeded(format!(
            "A review may have at most {} photos, got {}",
            MAX_REVIEW_PHOTOS,
            photos.len()
        )));
    }

    // The comment travels alongside the values but may also be sent as the
    // `overall_comment` value itself.
    let mut comment = submission.overall_comment.trim().to_string();
    if comment.is_empty() {
        if let Some(text) = submission
            .values
            .get(OVERALL_COMMENT_FIELD)
            .and_then(FieldValue::as_text)
        {
            comment = text.trim().to_string();
        }
    }

    let mut values = submission.values;
    values.insert(
        OVERALL_COMMENT_FIELD.to_string(),
        FieldValue::Text(comment.clone()),
    );

    Ok(PreparedSubmission {
        values,
        overall_comment: comment,
        photos,
    })
}

/// Validates against the snapshot; an empty comment is always rejected, even
/// when the schema no longer lists the comment field.
fn check_submission(
    schema: &[ReviewFieldDefinition],
    prepared: &PreparedSubmission,
) -> Result<(), ValidationError> {
    let mut error = match validation::validate(schema, &prepared.values) {
        Ok(()) => ValidationError::default(),
        Err(e) => e,
    };

    if prepared.overall_comment.is_empty()
        && !error.missing.iter().any(|f| f == OVERALL_COMMENT_FIELD)
    {
        error.missing.push(OVERALL_COMMENT_FIELD.to_string());
    }

    if error.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}

fn authorize(review: &reviews::Model, caller_id: i32, caller_role: Role) -> ServiceResult<()> {
    if review.user_id == caller_id || caller_role == Role::Admin {
        Ok(())
    } else {
        Err(ServiceError::Authorization(
            "Only the author or an administrator may change this review".to_string(),
        ))
    }
}

async fn insert_values<C: ConnectionTrait>(
    conn: &C,
    review_id: i32,
    schema: &[ReviewFieldDefinition],
    values: &SubmittedValues,
) -> Result<(), DbErr> {
    let rows: Vec<review_values::ActiveModel> = validation::capture_values(schema, values)
        .into_iter()
        .filter(|(name, _)| name != OVERALL_COMMENT_FIELD)
        .map(|(name, value)| review_values::ActiveModel {
            review_id: Set(review_id),
            field_name: Set(name),
            numeric_value: Set(value.as_number()),
            text_value: Set(value.as_text().map(str::to_string)),
            ..Default::default()
        })
        .collect();

    if !rows.is_empty() {
        review_values::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

async fn insert_photos<C: ConnectionTrait>(
    conn: &C,
    review_id: i32,
    photos: &[String],
) -> Result<(), DbErr> {
    let now = Utc::now().naive_utc();
    let rows: Vec<review_images::ActiveModel> = photos
        .iter()
        .map(|url| review_images::ActiveModel {
            review_id: Set(Some(review_id)),
            builder_id: Set(None),
            url: Set(url.clone()),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();

    if !rows.is_empty() {
        review_images::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

/// Fetches a review, authorizes the caller, then takes the builder lock and
/// re-reads the review under it.
async fn fetch_for_change<C: ConnectionTrait>(
    conn: &C,
    review_id: i32,
    caller_id: i32,
    caller_role: Role,
) -> ServiceResult<reviews::Model> {
    let review = reviews::Entity::find_by_id(review_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Review", review_id))?;
    authorize(&review, caller_id, caller_role)?;

    aggregation::lock_builder(conn, review.builder_id).await?;

    reviews::Entity::find_by_id(review_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Review", review_id))
}

/// Stores a new review and refreshes the builder aggregate. Returns the new
/// review's id.
pub async fn create_review(
    db: &DatabaseConnection,
    author_id: i32,
    builder_id: i32,
    submission: ReviewSubmission,
) -> ServiceResult<i32> {
    let prepared = prepare(submission)?;

    let txn = db.begin().await?;
    let result = async {
        users::Entity::find_by_id(author_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", author_id))?;

        aggregation::lock_builder(&txn, builder_id).await?;

        let schema = review_schema::list_fields(&txn).await?;
        check_submission(&schema, &prepared)?;

        let now = Utc::now().naive_utc();
        let review = reviews::ActiveModel {
            user_id: Set(author_id),
            builder_id: Set(builder_id),
            overall_comment: Set(prepared.overall_comment.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_values(&txn, review.id, &schema, &prepared.values).await?;
        insert_photos(&txn, review.id, &prepared.photos).await?;

        aggregation::recompute(&txn, builder_id).await?;
        Ok::<_, ServiceError>(review.id)
    }
    .await;

    let review_id = finish_transaction(txn, result).await?;
    log::info!(
        "Review {} created by user {} for builder {}",
        review_id,
        author_id,
        builder_id
    );
    Ok(review_id)
}

/// Replaces a review's values, comment and photos. Values are revalidated
/// against the current schema.
pub async fn update_review(
    db: &DatabaseConnection,
    review_id: i32,
    caller_id: i32,
    caller_role: Role,
    submission: ReviewSubmission,
) -> ServiceResult<()> {
    let prepared = prepare(submission)?;

    let txn = db.begin().await?;
    let result = async {
        let review = fetch_for_change(&txn, review_id, caller_id, caller_role).await?;

        let schema = review_schema::list_fields(&txn).await?;
        check_submission(&schema, &prepared)?;

        let builder_id = review.builder_id;
        let mut active: reviews::ActiveModel = review.into();
        active.overall_comment = Set(prepared.overall_comment.clone());
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await?;

        review_values::Entity::delete_many()
            .filter(review_values::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        insert_values(&txn, review_id, &schema, &prepared.values).await?;

        review_images::Entity::delete_many()
            .filter(review_images::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        insert_photos(&txn, review_id, &prepared.photos).await?;

        aggregation::recompute(&txn, builder_id).await?;
        Ok::<_, ServiceError>(())
    }
    .await;

    finish_transaction(txn, result).await?;
    log::info!("Review {} updated by user {}", review_id, caller_id);
    Ok(())
}

/// Deletes a review. Its photos go first, then its values and the review
/// row, then the builder aggregate is recomputed.
pub async fn delete_review(
    db: &DatabaseConnection,
    review_id: i32,
    caller_id: i32,
    caller_role: Role,
) -> ServiceResult<()> {
    let txn = db.begin().await?;
    let result = async {
        let review = fetch_for_change(&txn, review_id, caller_id, caller_role).await?;

        review_images::Entity::delete_many()
            .filter(review_images::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        review_values::Entity::delete_many()
            .filter(review_values::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        reviews::Entity::delete_by_id(review_id).exec(&txn).await?;

        aggregation::recompute(&txn, review.builder_id).await?;
        Ok::<_, ServiceError>(())
    }
    .await;

    finish_transaction(txn, result).await?;
    log::info!("Review {} deleted by user {}", review_id, caller_id);
    Ok(())
}

/// Attaches values and photos to a batch of review rows, preserving order.
async fn load_reviews<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<reviews::Model>,
) -> Result<Vec<Review>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let mut values: HashMap<i32, Vec<review_values::Model>> = HashMap::new();
    for value in review_values::Entity::find()
        .filter(review_values::Column::ReviewId.is_in(ids.clone()))
        .order_by_asc(review_values::Column::Id)
        .all(conn)
        .await?
    {
        values.entry(value.review_id).or_default().push(value);
    }

    let mut photos: HashMap<i32, Vec<String>> = HashMap::new();
    for image in review_images::Entity::find()
        .filter(review_images::Column::ReviewId.is_in(ids))
        .order_by_asc(review_images::Column::CreatedAt)
        .order_by_asc(review_images::Column::Id)
        .all(conn)
        .await?
    {
        if let Some(review_id) = image.review_id {
            photos.entry(review_id).or_default().push(image.url);
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let captured = values.remove(&row.id).unwrap_or_default();
            let numeric: Vec<f64> = captured.iter().filter_map(|v| v.numeric_value).collect();
            let values: SubmittedValues = captured
                .into_iter()
                .filter_map(|v| {
                    let value = match (v.numeric_value, v.text_value) {
                        (Some(n), _) => FieldValue::Number(n),
                        (None, Some(text)) => FieldValue::Text(text),
                        (None, None) => return None,
                    };
                    Some((v.field_name, value))
                })
                .collect();

            Review {
                id: row.id,
                author_id: row.user_id,
                builder_id: row.builder_id,
                values,
                overall_comment: row.overall_comment,
                photos: photos.remove(&row.id).unwrap_or_default(),
                sub_average: sub_average(&numeric),
                created_at: row.created_at,
                updated_at: row.updated_at,
            }
        })
        .collect())
}

pub async fn get_review<C: ConnectionTrait>(conn: &C, review_id: i32) -> ServiceResult<Review> {
    let row = reviews::Entity::find_by_id(review_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Review", review_id))?;

    load_reviews(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Review", review_id))
}

/// Reviews of a builder, newest first, with reviewer names.
pub async fn list_reviews_for_builder<C: ConnectionTrait>(
    conn: &C,
    builder_id: i32,
) -> ServiceResult<Vec<BuilderReview>> {
    builders::Entity::find_by_id(builder_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Builder", builder_id))?;

    let rows = reviews::Entity::find()
        .filter(reviews::Column::BuilderId.eq(builder_id))
        .order_by_desc(reviews::Column::CreatedAt)
        .order_by_desc(reviews::Column::Id)
        .all(conn)
        .await?;

    let author_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
    let names: HashMap<i32, Option<String>> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect()
    };

    Ok(load_reviews(conn, rows)
        .await?
        .into_iter()
        .map(|review| BuilderReview {
            reviewer_name: names.get(&review.author_id).cloned().flatten(),
            review,
        })
        .collect())
}

/// An author's reviews, newest first, each with the reviewed builder's
/// current name, logo, location and verification flag.
pub async fn list_reviews_for_author<C: ConnectionTrait>(
    conn: &C,
    author_id: i32,
) -> ServiceResult<Vec<AuthorReview>> {
    let rows = reviews::Entity::find()
        .filter(reviews::Column::UserId.eq(author_id))
        .order_by_desc(reviews::Column::CreatedAt)
        .order_by_desc(reviews::Column::Id)
        .all(conn)
        .await?;

    let builder_ids: Vec<i32> = rows.iter().map(|r| r.builder_id).collect();
    let builders: HashMap<i32, builders::Model> = if builder_ids.is_empty() {
        HashMap::new()
    } else {
        builders::Entity::find()
            .filter(builders::Column::Id.is_in(builder_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect()
    };

    Ok(load_reviews(conn, rows)
        .await?
        .into_iter()
        .filter_map(|review| {
            let builder = builders.get(&review.builder_id)?;
            Some(AuthorReview {
                builder: BuilderSnapshot {
                    id: builder.id,
                    name: builder.name.clone(),
                    logo: builder.logo.clone(),
                    location: builder.location.clone(),
                    is_verified: builder.is_verified,
                },
                review,
            })
        })
        .collect())
}
