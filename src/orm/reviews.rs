//! SeaORM Entity for reviews table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Author of the review
    pub user_id: i32,
    pub builder_id: i32,
    pub overall_comment: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::builders::Entity",
        from = "Column::BuilderId",
        to = "super::builders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Builder,
    #[sea_orm(has_many = "super::review_values::Entity")]
    Values,
    #[sea_orm(has_many = "super::review_images::Entity")]
    Images,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::builders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Builder.def()
    }
}

impl Related<super::review_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Values.def()
    }
}

impl Related<super::review_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
