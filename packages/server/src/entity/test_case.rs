use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "test_case")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stdin fed to the program. Empty is a valid input.
    #[sea_orm(column_type = "Text")]
    pub input: String,
    /// Derived by running the problem's solution code, never user-supplied.
    #[sea_orm(column_type = "Text")]
    pub expect_output: String,
    /// Hidden test cases are graded but their input/expected output are
    /// withheld from members.
    pub is_hidden: bool,

    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id")]
    pub problem: HasOne<super::problem::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
