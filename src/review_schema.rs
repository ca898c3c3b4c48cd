//! Admin-configurable review schema.
//!
//! The schema is the ordered list of field definitions a review form is built
//! from and validated against. Listing order is `display_order` ascending,
//! ties broken by id.

use crate::constants::MAX_FIELD_NAME_LENGTH;
use crate::db::finish_transaction;
use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::orm::review_fields::{self, FieldKind};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr, Set,
};
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

pub type ReviewFieldDefinition = review_fields::Model;

/// Payload for a new field definition.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewReviewField {
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "min")]
    pub min_value: Option<i32>,
    #[serde(default, rename = "max")]
    pub max_value: Option<i32>,
    /// Appended after the current last field when absent
    #[serde(default, rename = "order")]
    pub display_order: Option<i32>,
}

/// Partial update of a field definition. Absent attributes are left alone.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ReviewFieldChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<FieldKind>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default, rename = "min")]
    pub min_value: Option<i32>,
    #[serde(default, rename = "max")]
    pub max_value: Option<i32>,
    #[serde(default, rename = "order")]
    pub display_order: Option<i32>,
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_FIELD_NAME_LENGTH {
        return Err(ValidationError::invalid(
            "name",
            format!("Field name must be 1 to {} characters", MAX_FIELD_NAME_LENGTH),
        ));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
    if !name.chars().all(allowed) {
        return Err(ValidationError::invalid(
            "name",
            "Field name may only contain lowercase letters, digits and underscores",
        ));
    }
    Ok(())
}

/// Rating fields need both bounds with `min <= max`.
fn check_bounds(
    kind: FieldKind,
    min_value: Option<i32>,
    max_value: Option<i32>,
) -> Result<(), ValidationError> {
    if !kind.is_numeric() {
        return Ok(());
    }
    match (min_value, max_value) {
        (Some(min), Some(max)) if min <= max => Ok(()),
        (Some(_), Some(_)) => Err(ValidationError::invalid(
            "min",
            "Minimum must not be greater than maximum",
        )),
        _ => Err(ValidationError {
            missing: [("min", min_value), ("max", max_value)]
                .iter()
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| k.to_string())
                .collect(),
            message: Some("Rating fields need both min and max".to_string()),
            ..Default::default()
        }),
    }
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except_id: Option<i32>,
) -> ServiceResult<()> {
    let mut select = review_fields::Entity::find().filter(review_fields::Column::Name.eq(name));
    if let Some(id) = except_id {
        select = select.filter(review_fields::Column::Id.ne(id));
    }
    if select.one(conn).await?.is_some() {
        return Err(ValidationError::invalid(
            "name",
            format!("A field named '{}' already exists", name),
        )
        .into());
    }
    Ok(())
}

/// All definitions in listing order.
pub async fn list_fields<C: ConnectionTrait>(conn: &C) -> Result<Vec<ReviewFieldDefinition>, DbErr> {
    review_fields::Entity::find()
        .order_by_asc(review_fields::Column::DisplayOrder)
        .order_by_asc(review_fields::Column::Id)
        .all(conn)
        .await
}

async fn next_display_order<C: ConnectionTrait>(conn: &C) -> Result<i32, DbErr> {
    let last = review_fields::Entity::find()
        .order_by_desc(review_fields::Column::DisplayOrder)
        .one(conn)
        .await?;
    Ok(last.map(|f| f.display_order + 1).unwrap_or(1))
}

/// Adds a definition. Order defaults to one past the current maximum.
pub async fn create_field(
    db: &DatabaseConnection,
    def: NewReviewField,
) -> ServiceResult<ReviewFieldDefinition> {
    def.validate()?;
    check_name(&def.name)?;
    check_bounds(def.kind, def.min_value, def.max_value)?;

    let txn = db.begin().await?;
    let result = async {
        ensure_name_free(&txn, &def.name, None).await?;

        let display_order = match def.display_order {
            Some(order) => order,
            None => next_display_order(&txn).await?,
        };
        let now = Utc::now().naive_utc();

        let field = review_fields::ActiveModel {
            name: Set(def.name.clone()),
            label: Set(def.label.clone()),
            kind: Set(def.kind),
            required: Set(def.required),
            min_value: Set(def.min_value),
            max_value: Set(def.max_value),
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Ok::<_, ServiceError>(field)
    }
    .await;

    let field = finish_transaction(txn, result).await?;
    log::info!("Review field '{}' created (id {})", field.name, field.id);
    Ok(field)
}

/// Applies a partial update. The merged definition must still satisfy the
/// name and bounds invariants.
pub async fn update_field(
    db: &DatabaseConnection,
    id: i32,
    changes: ReviewFieldChanges,
) -> ServiceResult<ReviewFieldDefinition> {
    changes.validate()?;
    if let Some(name) = &changes.name {
        check_name(name)?;
    }

    let txn = db.begin().await?;
    let result = async {
        let existing = review_fields::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review field", id))?;

        let kind = changes.kind.unwrap_or(existing.kind);
        let min_value = changes.min_value.or(existing.min_value);
        let max_value = changes.max_value.or(existing.max_value);
        check_bounds(kind, min_value, max_value)?;

        if let Some(name) = &changes.name {
            if *name != existing.name {
                ensure_name_free(&txn, name, Some(id)).await?;
            }
        }

        let mut field: review_fields::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            field.name = Set(name);
        }
        if let Some(label) = changes.label {
            field.label = Set(label);
        }
        if let Some(required) = changes.required {
            field.required = Set(required);
        }
        if let Some(order) = changes.display_order {
            field.display_order = Set(order);
        }
        field.kind = Set(kind);
        field.min_value = Set(min_value);
        field.max_value = Set(max_value);
        field.updated_at = Set(Utc::now().naive_utc());

        Ok::<_, ServiceError>(field.update(&txn).await?)
    }
    .await;

    let field = finish_transaction(txn, result).await?;
    log::info!("Review field '{}' updated (id {})", field.name, field.id);
    Ok(field)
}

/// Removes a definition. Values already captured by reviews are kept.
pub async fn delete_field(db: &DatabaseConnection, id: i32) -> ServiceResult<()> {
    let res = review_fields::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("Review field", id));
    }
    log::info!("Review field {} deleted", id);
    Ok(())
}

/// Sets each listed field's order to its 1-based position. Unlisted fields
/// keep their order. Nothing changes unless every id is known and unique.
pub async fn reorder(db: &DatabaseConnection, ordered_ids: &[i32]) -> ServiceResult<()> {
    let mut seen = HashSet::new();
    if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(ValidationError::invalid(
            "ordered_ids",
            format!("Field {} is listed more than once", dup),
        )
        .into());
    }
    if ordered_ids.is_empty() {
        return Ok(());
    }

    let txn = db.begin().await?;
    let result = async {
        let known: HashSet<i32> = review_fields::Entity::find()
            .filter(review_fields::Column::Id.is_in(ordered_ids.to_vec()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        if let Some(unknown) = ordered_ids.iter().find(|id| !known.contains(id)) {
            return Err(ServiceError::not_found("Review field", unknown));
        }

        let now = Utc::now().naive_utc();
        for (position, id) in ordered_ids.iter().enumerate() {
            review_fields::Entity::update_many()
                .col_expr(
                    review_fields::Column::DisplayOrder,
                    Expr::value(position as i32 + 1),
                )
                .col_expr(review_fields::Column::UpdatedAt, Expr::value(now))
                .filter(review_fields::Column::Id.eq(*id))
                .exec(&txn)
                .await?;
        }
        Ok::<_, ServiceError>(())
    }
    .await;

    finish_transaction(txn, result).await?;
    log::info!("Review fields reordered: {:?}", ordered_ids);
    Ok(())
}

/// The categories a fresh installation rates builders on.
pub fn default_fields() -> Vec<NewReviewField> {
    let ratings = [
        ("build_quality", "Build Quality"),
        ("material_quality", "Material Quality"),
        ("bathrooms", "Bathrooms"),
        ("bedrooms", "Bedrooms"),
        ("kitchen", "Kitchen"),
        ("exterior", "Exterior"),
        ("windows_doors", "Windows & Doors"),
        ("electrical", "Electrical"),
        ("plumbing", "Plumbing"),
    ];

    let mut fields: Vec<NewReviewField> = ratings
        .iter()
        .enumerate()
        .map(|(i, (name, label))| NewReviewField {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Rating,
            required: true,
            min_value: Some(1),
            max_value: Some(5),
            display_order: Some(i as i32 + 1),
        })
        .collect();

    fields.push(NewReviewField {
        name: crate::constants::OVERALL_COMMENT_FIELD.to_string(),
        label: "Overall Comment".to_string(),
        kind: FieldKind::LongText,
        required: true,
        min_value: None,
        max_value: None,
        display_order: Some(10),
    });

    fields
}

/// Inserts [`default_fields`] when the schema is empty. Returns how many
/// definitions were written.
pub async fn seed_default_fields(db: &DatabaseConnection) -> ServiceResult<usize> {
    let txn = db.begin().await?;
    let result = async {
        if review_fields::Entity::find().one(&txn).await?.is_some() {
            return Ok(0);
        }

        let now = Utc::now().naive_utc();
        let defaults = default_fields();
        let count = defaults.len();
        let models = defaults.into_iter().map(|def| review_fields::ActiveModel {
            name: Set(def.name),
            label: Set(def.label),
            kind: Set(def.kind),
            required: Set(def.required),
            min_value: Set(def.min_value),
            max_value: Set(def.max_value),
            display_order: Set(def.display_order.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
        review_fields::Entity::insert_many(models).exec(&txn).await?;

        Ok::<_, ServiceError>(count)
    }
    .await;

    finish_transaction(txn, result).await
}
