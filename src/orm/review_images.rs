//! SeaORM Entity for review_images table
//!
//! Photo URLs handed back by the storage collaborator. A row is owned either
//! by a review or directly by a builder (gallery images).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub review_id: Option<i32>,
    pub builder_id: Option<i32>,
    pub url: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reviews::Entity",
        from = "Column::ReviewId",
        to = "super::reviews::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Review,
    #[sea_orm(
        belongs_to = "super::builders::Entity",
        from = "Column::BuilderId",
        to = "super::builders::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Builder,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::builders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Builder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
