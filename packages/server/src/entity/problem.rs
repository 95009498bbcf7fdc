use common::DevStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rules::RuleMode;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "problem")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Starting stub shown to solvers.
    #[sea_orm(column_type = "Text")]
    pub default_code: String,
    /// Reference implementation. Sole ground truth for expected output;
    /// never serialized to members.
    #[sea_orm(column_type = "Text")]
    pub solution_code: String,

    /// One of 0.5, 1.0, 1.5, ... 5.0
    pub difficulty: f32,
    pub time_limit: i32, // in milliseconds

    pub header_mode: RuleMode,
    /// JSON array of header names the mode applies to.
    #[sea_orm(column_type = "JsonBinary")]
    pub headers: Json,
    pub function_mode: RuleMode,
    /// JSON array of function names the mode applies to.
    #[sea_orm(column_type = "JsonBinary")]
    pub functions: Json,

    /// JSON array of free-form tag strings, set semantics.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    pub dev_status: DevStatus,
    /// Present only while `dev_status` is REJECTED.
    #[sea_orm(column_type = "Text", nullable)]
    pub rejected_message: Option<String>,

    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub test_cases: HasMany<super::test_case::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
