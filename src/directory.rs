//! Builder directory: listing, search, profiles and moderation flags.
//!
//! Reads the aggregate columns as stored. Nothing in here writes
//! `average_rating` or `total_reviews`.

use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::orm::{builders, review_images, reviews, users};
use crate::reviews::{list_reviews_for_builder, BuilderReview};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    entity::*, query::*, Condition, ConnectionTrait, DatabaseConnection, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// A builder as listed in the directory.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuilderSummary {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo: Option<String>,
    pub average_rating: Option<f64>,
    pub total_reviews: i32,
    pub is_verified: bool,
    pub is_published: bool,
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
}

impl From<builders::Model> for BuilderSummary {
    fn from(b: builders::Model) -> Self {
        Self {
            id: b.id,
            name: b.name,
            description: b.description,
            location: b.location,
            website: b.website,
            phone: b.phone,
            email: b.email,
            logo: b.logo,
            average_rating: b.average_rating,
            total_reviews: b.total_reviews,
            is_verified: b.is_verified,
            is_published: b.is_published,
            is_featured: b.is_featured,
            created_at: b.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pagination {
    /// Matching items across all pages
    pub total: u64,
    pub pages: u64,
    pub current: u64,
    pub limit: u64,
}

/// One page of results. Pages are 1-indexed.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Normalizes a requested page and page size to `(page, page_size, offset)`.
///
/// The offset is `None` when it does not fit a signed 64-bit SQL offset; no
/// such page can hold rows.
pub fn page_window(page: u64, page_size: u64, max_page_size: u64) -> (u64, u64, Option<u64>) {
    let page = page.max(1);
    let page_size = page_size.clamp(1, max_page_size.max(1));
    let offset = (page - 1)
        .checked_mul(page_size)
        .filter(|offset| *offset <= i64::MAX as u64);
    (page, page_size, offset)
}

fn like_pattern(query: &str) -> String {
    format!("%{}%", query.trim().to_lowercase())
}

async fn fetch_page<C: ConnectionTrait>(
    conn: &C,
    filtered: Select<builders::Entity>,
    ordered: Select<builders::Entity>,
    page: u64,
    page_size: u64,
) -> ServiceResult<Page<BuilderSummary>> {
    let (page, page_size, offset) =
        page_window(page, page_size, crate::app_config::directory().max_page_size);

    let total = filtered.count(conn).await? as u64;
    let items = match offset {
        Some(offset) if offset < total => ordered
            .offset(offset)
            .limit(page_size)
            .all(conn)
            .await?
            .into_iter()
            .map(BuilderSummary::from)
            .collect(),
        _ => Vec::new(),
    };

    Ok(Page {
        items,
        pagination: Pagination {
            total,
            pages: total / page_size + u64::from(total % page_size != 0),
            current: page,
            limit: page_size,
        },
    })
}

/// Public directory search.
///
/// Case-insensitive substring match on name. Names starting with the query
/// come first, then alphabetical by name. Non-admins only see published
/// builders. A page past the end is empty.
pub async fn search<C: ConnectionTrait>(
    conn: &C,
    query: &str,
    page: u64,
    page_size: u64,
    caller_is_admin: bool,
) -> ServiceResult<Page<BuilderSummary>> {
    let query = query.trim().to_lowercase();

    let mut filtered = builders::Entity::find();
    if !query.is_empty() {
        filtered = filtered.filter(Expr::cust_with_values(
            "LOWER(name) LIKE ?",
            vec![like_pattern(&query)],
        ));
    }
    if !caller_is_admin {
        filtered = filtered.filter(builders::Column::IsPublished.eq(true));
    }

    let mut ordered = filtered.clone();
    if !query.is_empty() {
        ordered = ordered.order_by(
            Expr::cust_with_values(
                "CASE WHEN LOWER(name) LIKE ? THEN 0 ELSE 1 END",
                vec![format!("{}%", query)],
            ),
            Order::Asc,
        );
    }
    let ordered = ordered
        .order_by_asc(builders::Column::Name)
        .order_by_asc(builders::Column::Id);

    fetch_page(conn, filtered, ordered, page, page_size).await
}

/// Admin listing: every builder, published or not, matching the query on
/// name or location.
pub async fn admin_list<C: ConnectionTrait>(
    conn: &C,
    query: &str,
    page: u64,
    page_size: u64,
) -> ServiceResult<Page<BuilderSummary>> {
    let mut filtered = builders::Entity::find();
    if !query.trim().is_empty() {
        let pattern = like_pattern(query);
        filtered = filtered.filter(Expr::cust_with_values(
            "(LOWER(name) LIKE ? OR LOWER(COALESCE(location, '')) LIKE ?)",
            vec![pattern.clone(), pattern],
        ));
    }

    let ordered = filtered
        .clone()
        .order_by_asc(builders::Column::Name)
        .order_by_asc(builders::Column::Id);

    fetch_page(conn, filtered, ordered, page, page_size).await
}

/// A builder's page: metadata, reviews and photo gallery.
#[derive(Clone, Debug, Serialize)]
pub struct BuilderProfile {
    pub builder: BuilderSummary,
    pub reviews: Vec<BuilderReview>,
    /// Builder-owned images and review photos, de-duplicated, sorted by URL
    pub gallery: Vec<String>,
}

async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    builder_id: i32,
    caller_is_admin: bool,
) -> ServiceResult<builders::Model> {
    builders::Entity::find_by_id(builder_id)
        .one(conn)
        .await?
        .filter(|b| caller_is_admin || b.is_published)
        .ok_or_else(|| ServiceError::not_found("Builder", builder_id))
}

/// Unpublished builders are not found for non-admins.
pub async fn get_builder<C: ConnectionTrait>(
    conn: &C,
    builder_id: i32,
    caller_is_admin: bool,
) -> ServiceResult<BuilderProfile> {
    let builder = find_visible(conn, builder_id, caller_is_admin).await?;
    let reviews = list_reviews_for_builder(conn, builder_id).await?;

    let review_ids: Vec<i32> = reviews.iter().map(|r| r.review.id).collect();
    let mut owned = Condition::any().add(review_images::Column::BuilderId.eq(builder_id));
    if !review_ids.is_empty() {
        owned = owned.add(review_images::Column::ReviewId.is_in(review_ids));
    }
    let gallery: BTreeSet<String> = review_images::Entity::find()
        .filter(owned)
        .all(conn)
        .await?
        .into_iter()
        .map(|image| image.url)
        .collect();

    Ok(BuilderProfile {
        builder: builder.into(),
        reviews,
        gallery: gallery.into_iter().collect(),
    })
}

/// Exact-name lookup used by the review form.
pub async fn find_builder_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    caller_is_admin: bool,
) -> ServiceResult<BuilderSummary> {
    let mut select = builders::Entity::find().filter(builders::Column::Name.eq(name));
    if !caller_is_admin {
        select = select.filter(builders::Column::IsPublished.eq(true));
    }
    select
        .order_by_asc(builders::Column::Id)
        .one(conn)
        .await?
        .map(BuilderSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("Builder '{}' not found", name)))
}

/// Registration payload for a builder. The aggregate is not settable.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct NewBuilder {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Adds a builder: published, unverified, not featured, no reviews.
pub async fn create_builder(
    db: &DatabaseConnection,
    new: NewBuilder,
) -> ServiceResult<BuilderSummary> {
    new.validate()?;

    if let Some(user_id) = new.user_id {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;
    }

    let now = Utc::now().naive_utc();
    let builder = builders::ActiveModel {
        user_id: Set(new.user_id),
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        location: Set(new.location),
        website: Set(new.website),
        phone: Set(new.phone),
        email: Set(new.email),
        logo: Set(new.logo),
        average_rating: Set(None),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_published: Set(true),
        is_featured: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Builder {} '{}' created", builder.id, builder.name);
    Ok(builder.into())
}

/// Moderation flags to change. Absent flags are left alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModerationUpdate {
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

pub async fn update_moderation<C: ConnectionTrait>(
    conn: &C,
    builder_id: i32,
    update: ModerationUpdate,
) -> ServiceResult<()> {
    let flags = [
        (builders::Column::IsPublished, update.is_published),
        (builders::Column::IsFeatured, update.is_featured),
        (builders::Column::IsVerified, update.is_verified),
    ];
    if flags.iter().all(|(_, v)| v.is_none()) {
        return Err(ValidationError::message("No valid fields to update").into());
    }

    let mut stmt = builders::Entity::update_many()
        .col_expr(builders::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(builders::Column::Id.eq(builder_id));
    for (column, value) in flags {
        if let Some(value) = value {
            stmt = stmt.col_expr(column, Expr::value(value));
        }
    }

    let res = stmt.exec(conn).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("Builder", builder_id));
    }

    log::info!("Builder {} moderation updated: {:?}", builder_id, update);
    Ok(())
}

/// Headline numbers for the admin console.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectoryStats {
    pub total_builders: u64,
    pub total_reviews: u64,
    pub total_users: u64,
}

pub async fn stats<C: ConnectionTrait>(conn: &C) -> ServiceResult<DirectoryStats> {
    Ok(DirectoryStats {
        total_builders: builders::Entity::find().count(conn).await? as u64,
        total_reviews: reviews::Entity::find().count(conn).await? as u64,
        total_users: users::Entity::find().count(conn).await? as u64,
    })
}
