use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::MAX_CODE_SIZE;
use crate::error::AppError;

/// Body for creating a test case. Expected output is never accepted from the
/// caller — the verifier derives it from the solution code.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTestCaseRequest {
    /// Omitted input means an empty stdin, which is valid.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
}

/// PATCH body for a test case. Changing the input re-derives the expected
/// output; flipping visibility alone does not touch the sandbox.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTestCaseRequest {
    pub input: Option<String>,
    pub is_hidden: Option<bool>,
}

/// Staff-facing test case detail.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TestCaseResponse {
    pub id: i32,
    pub input: String,
    pub expect_output: String,
    pub is_hidden: bool,
    pub problem_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::test_case::Model> for TestCaseResponse {
    fn from(m: crate::entity::test_case::Model) -> Self {
        Self {
            id: m.id,
            input: m.input,
            expect_output: m.expect_output,
            is_hidden: m.is_hidden,
            problem_id: m.problem_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_test_case_input(input: &str) -> Result<(), AppError> {
    if input.len() > MAX_CODE_SIZE {
        return Err(AppError::Validation(format!(
            "Test case input must be at most {MAX_CODE_SIZE} bytes"
        )));
    }
    Ok(())
}
