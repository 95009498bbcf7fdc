use common::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimal projection of the account service's user record. Owned and
/// maintained elsewhere; the catalog only reads display names and authorship.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub role: Role,

    #[sea_orm(has_many)]
    pub problems: HasMany<super::problem::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
