//! SeaORM Entity for review_fields table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shape of a configurable review field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum FieldKind {
    /// Numeric rating bounded by `min_value..=max_value`
    #[sea_orm(string_value = "number")]
    #[serde(rename = "number")]
    Rating,
    #[sea_orm(string_value = "text")]
    #[serde(rename = "text")]
    ShortText,
    #[sea_orm(string_value = "textarea")]
    #[serde(rename = "textarea")]
    LongText,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Rating)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "review_fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(rename = "min")]
    pub min_value: Option<i32>,
    #[serde(rename = "max")]
    pub max_value: Option<i32>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
