//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::Utc;
use homerate::orm::users::Role;
use homerate::orm::{builders, review_images, users};
use homerate::reviews::ReviewSubmission;
use homerate::validation::{FieldValue, SubmittedValues};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Rating categories of the default schema.
pub const DEFAULT_RATING_FIELDS: [&str; 9] = [
    "build_quality",
    "material_quality",
    "bathrooms",
    "bedrooms",
    "kitchen",
    "exterior",
    "windows_doors",
    "electrical",
    "plumbing",
];

/// Create a user with the given role
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        email: Set(format!("{}@test.com", name.to_lowercase().replace(' ', "."))),
        full_name: Set(Some(name.to_string())),
        role: Set(role),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_test_homeowner(
    db: &DatabaseConnection,
    name: &str,
) -> Result<users::Model, DbErr> {
    create_test_user(db, name, Role::Homeowner).await
}

pub async fn create_test_admin(db: &DatabaseConnection, name: &str) -> Result<users::Model, DbErr> {
    create_test_user(db, name, Role::Admin).await
}

/// Create a published builder with no reviews
pub async fn create_test_builder(
    db: &DatabaseConnection,
    name: &str,
) -> Result<builders::Model, DbErr> {
    create_test_builder_with(db, name, None, true).await
}

pub async fn create_test_builder_with(
    db: &DatabaseConnection,
    name: &str,
    location: Option<&str>,
    is_published: bool,
) -> Result<builders::Model, DbErr> {
    let now = Utc::now().naive_utc();
    builders::ActiveModel {
        user_id: Set(None),
        name: Set(name.to_string()),
        description: Set(None),
        location: Set(location.map(str::to_string)),
        website: Set(None),
        phone: Set(None),
        email: Set(None),
        logo: Set(Some(format!("https://img.test/{}.png", name.len()))),
        average_rating: Set(None),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_published: Set(is_published),
        is_featured: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Attach a gallery image directly to a builder
pub async fn create_builder_image(
    db: &DatabaseConnection,
    builder_id: i32,
    url: &str,
) -> Result<review_images::Model, DbErr> {
    review_images::ActiveModel {
        review_id: Set(None),
        builder_id: Set(Some(builder_id)),
        url: Set(url.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Every default rating category set to `value`
pub fn uniform_ratings(value: f64) -> SubmittedValues {
    DEFAULT_RATING_FIELDS
        .iter()
        .map(|name| (name.to_string(), FieldValue::Number(value)))
        .collect()
}

/// A complete submission against the default schema
pub fn rating_submission(value: f64) -> ReviewSubmission {
    ReviewSubmission {
        values: uniform_ratings(value),
        overall_comment: format!("Rated everything {}", value),
        photos: Vec::new(),
    }
}

pub fn photo_urls(count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| format!("https://photos.test/{}.jpg", i))
        .collect()
}
