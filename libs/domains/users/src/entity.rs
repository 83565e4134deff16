use crate::models::{Role, User};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub company_id: Option<Uuid>,
    pub activated: bool,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone_number: model.phone_number,
            password_hash: model.password_hash,
            // Unknown names are dropped rather than failing the whole row.
            roles: model
                .roles
                .iter()
                .filter_map(|r| Role::from_str(r).ok())
                .collect(),
            company_id: model.company_id,
            activated: model.activated,
            blocked: model.blocked,
            block_reason: model.block_reason,
            deleted: model.deleted,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        let roles = user.role_names();
        ActiveModel {
            id: Set(user.id),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            email: Set(user.email),
            phone_number: Set(user.phone_number),
            password_hash: Set(user.password_hash),
            roles: Set(roles),
            company_id: Set(user.company_id),
            activated: Set(user.activated),
            blocked: Set(user.blocked),
            block_reason: Set(user.block_reason),
            deleted: Set(user.deleted),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
