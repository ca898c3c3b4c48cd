//! Identity records.
//!
//! Accounts are created by registration or seeding elsewhere; reviews only
//! need to know that an author exists and what to call them.

use crate::error::{ServiceError, ServiceResult, ValidationError};
use crate::orm::users::{self, Role};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
}

/// Public view of a user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl From<users::Model> for UserRecord {
    fn from(u: users::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
        }
    }
}

pub async fn create_user<C: ConnectionTrait>(conn: &C, new: NewUser) -> ServiceResult<UserRecord> {
    new.validate()?;
    let email = new.email.trim().to_lowercase();

    let taken = users::Entity::find()
        .filter(users::Column::Email.eq(email.clone()))
        .one(conn)
        .await?;
    if taken.is_some() {
        return Err(ValidationError::invalid("email", "Email is already registered").into());
    }

    let user = users::ActiveModel {
        email: Set(email),
        full_name: Set(new.full_name),
        role: Set(new.role),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    log::info!("User {} created with role {:?}", user.id, user.role);
    Ok(user.into())
}

pub async fn get_user<C: ConnectionTrait>(conn: &C, id: i32) -> ServiceResult<UserRecord> {
    users::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(UserRecord::from)
        .ok_or_else(|| ServiceError::not_found("User", id))
}
