use chrono::{DateTime, Utc};
use common::DevStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::rules::RuleMode;

pub use super::shared::Pagination;
use super::shared::{MAX_CODE_SIZE, double_option, string_array, validate_title};

/// The fixed allowed difficulty values, half-point steps.
pub const DIFFICULTY_LATTICE: [f32; 10] =
    [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];

/// Default time limit for a new problem, in milliseconds.
pub const DEFAULT_TIME_LIMIT_MS: i32 = 100;

/// A test case supplied at problem creation. Expected output is absent on
/// purpose — it is derived by running the solution code.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct NewTestCaseSpec {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProblemRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_code: String,
    pub solution_code: String,
    pub difficulty: f32,
    #[serde(default = "default_time_limit")]
    pub time_limit: i32,
    #[serde(default = "default_rule_mode")]
    pub header_mode: RuleMode,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default = "default_rule_mode")]
    pub function_mode: RuleMode,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// At least one test case is required; each is verified against the
    /// solution code before anything is persisted.
    pub test_cases: Vec<NewTestCaseSpec>,
}

fn default_time_limit() -> i32 {
    DEFAULT_TIME_LIMIT_MS
}

fn default_rule_mode() -> RuleMode {
    RuleMode::Disallowed
}

/// PATCH body for a problem. Test cases are deliberately absent: their
/// content can only change through the verifier endpoints.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProblemRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub default_code: Option<String>,
    pub solution_code: Option<String>,
    pub difficulty: Option<f32>,
    pub time_limit: Option<i32>,
    pub header_mode: Option<RuleMode>,
    pub headers: Option<Vec<String>>,
    pub function_mode: Option<RuleMode>,
    pub functions: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RejectRequest {
    /// Reviewer feedback stored on the problem while it is rejected.
    pub message: String,
}

/// Staff-facing problem detail.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub default_code: String,
    pub solution_code: String,
    pub difficulty: f32,
    pub time_limit: i32,
    pub header_mode: RuleMode,
    pub headers: Vec<String>,
    pub function_mode: RuleMode,
    pub functions: Vec<String>,
    pub tags: Vec<String>,
    pub dev_status: DevStatus,
    pub rejected_message: Option<String>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::problem::Model> for ProblemResponse {
    fn from(m: crate::entity::problem::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            default_code: m.default_code,
            solution_code: m.solution_code,
            difficulty: m.difficulty,
            time_limit: m.time_limit,
            header_mode: m.header_mode,
            headers: string_array(&m.headers),
            function_mode: m.function_mode,
            functions: string_array(&m.functions),
            tags: string_array(&m.tags),
            dev_status: m.dev_status,
            rejected_message: m.rejected_message,
            author_id: m.author_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A non-hidden test case embedded in the member problem view as a worked
/// example.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SampleTestCase {
    pub id: i32,
    pub input: String,
    pub expect_output: String,
}

/// Member-facing problem detail. Carries no solution code, no lifecycle
/// state and no hidden test cases.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicProblemResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub default_code: String,
    pub difficulty: f32,
    pub time_limit: i32,
    pub tags: Vec<String>,
    pub author: String,
    pub sample_test_cases: Vec<SampleTestCase>,
}

impl PublicProblemResponse {
    pub fn project(
        m: crate::entity::problem::Model,
        author: String,
        samples: Vec<crate::entity::test_case::Model>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            default_code: m.default_code,
            difficulty: m.difficulty,
            time_limit: m.time_limit,
            tags: string_array(&m.tags),
            author,
            sample_test_cases: samples
                .into_iter()
                .map(|tc| SampleTestCase {
                    id: tc.id,
                    input: tc.input,
                    expect_output: tc.expect_output,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemListItem {
    pub id: i32,
    pub title: String,
    pub difficulty: f32,
    pub tags: Vec<String>,
    pub author: String,
    /// Present only in staff view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_status: Option<DevStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProblemListItem {
    pub fn project(
        m: crate::entity::problem::Model,
        author: Option<crate::entity::user::Model>,
        staff_view: bool,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            difficulty: m.difficulty,
            tags: string_array(&m.tags),
            author: author.map(|u| u.username).unwrap_or_default(),
            dev_status: staff_view.then_some(m.dev_status),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemListResponse {
    pub data: Vec<ProblemListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProblemListQuery {
    /// Case-insensitive substring match on title or author name.
    pub search: Option<String>,
    /// Comma-separated tag list; keeps problems whose tag set intersects it.
    pub tags: Option<String>,
    pub min_difficulty: Option<f32>,
    pub max_difficulty: Option<f32>,
    /// Lifecycle filter; only honored in staff view.
    pub status: Option<DevStatus>,
    /// Primary id ordering is ascending unless this is set.
    pub id_reverse: Option<bool>,
    /// Optional secondary ordering by difficulty: `asc` or `desc`.
    pub difficulty_sort: Option<String>,
    /// Staff catalog view; requires the `catalog:staff_view` capability.
    pub staff_view: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn validate_difficulty(difficulty: f32) -> Result<(), AppError> {
    if DIFFICULTY_LATTICE.contains(&difficulty) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Difficulty must be one of 0.5, 1.0, ... 5.0 (half-point steps)".into(),
        ))
    }
}

fn validate_code_size(code: &str, what: &str) -> Result<(), AppError> {
    if code.len() > MAX_CODE_SIZE {
        return Err(AppError::Validation(format!(
            "{what} must be at most {} bytes",
            MAX_CODE_SIZE
        )));
    }
    Ok(())
}

fn validate_time_limit(time_limit: i32) -> Result<(), AppError> {
    if !(1..=30_000).contains(&time_limit) {
        return Err(AppError::Validation("Time limit must be 1-30000 ms".into()));
    }
    Ok(())
}

/// Trim, drop empties, sort and dedup a tag list (set semantics).
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

pub fn validate_create_problem(req: &CreateProblemRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.solution_code.trim().is_empty() {
        return Err(AppError::Validation("Solution code is required".into()));
    }
    validate_code_size(&req.solution_code, "Solution code")?;
    validate_code_size(&req.default_code, "Default code")?;
    validate_difficulty(req.difficulty)?;
    validate_time_limit(req.time_limit)?;
    if req.test_cases.is_empty() {
        return Err(AppError::Validation(
            "At least one test case is required".into(),
        ));
    }
    Ok(())
}

pub fn validate_update_problem(req: &UpdateProblemRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref solution_code) = req.solution_code {
        if solution_code.trim().is_empty() {
            return Err(AppError::Validation(
                "Solution code must not be empty".into(),
            ));
        }
        validate_code_size(solution_code, "Solution code")?;
    }
    if let Some(ref default_code) = req.default_code {
        validate_code_size(default_code, "Default code")?;
    }
    if let Some(difficulty) = req.difficulty {
        validate_difficulty(difficulty)?;
    }
    if let Some(time_limit) = req.time_limit {
        validate_time_limit(time_limit)?;
    }
    Ok(())
}

pub fn validate_reject(req: &RejectRequest) -> Result<(), AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation(
            "A rejection message is required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_create() -> CreateProblemRequest {
        CreateProblemRequest {
            title: "Sum of two numbers".into(),
            description: None,
            default_code: String::new(),
            solution_code: "int main() { return 0; }".into(),
            difficulty: 3.0,
            time_limit: DEFAULT_TIME_LIMIT_MS,
            header_mode: RuleMode::Disallowed,
            headers: vec![],
            function_mode: RuleMode::Disallowed,
            functions: vec![],
            tags: vec![],
            test_cases: vec![NewTestCaseSpec {
                input: Some("1 2".into()),
                is_hidden: false,
            }],
        }
    }

    #[test]
    fn test_difficulty_lattice() {
        for d in DIFFICULTY_LATTICE {
            assert!(validate_difficulty(d).is_ok());
        }
        for d in [0.0, 0.25, 2.75, 5.5, -1.0] {
            assert!(validate_difficulty(d).is_err(), "{d} should be off-lattice");
        }
    }

    #[test]
    fn test_create_requires_test_cases() {
        let mut req = minimal_create();
        req.test_cases.clear();
        assert!(validate_create_problem(&req).is_err());
    }

    #[test]
    fn test_create_requires_solution_code() {
        let mut req = minimal_create();
        req.solution_code = "   ".into();
        assert!(validate_create_problem(&req).is_err());
    }

    #[test]
    fn test_minimal_create_is_valid() {
        assert!(validate_create_problem(&minimal_create()).is_ok());
    }

    #[test]
    fn test_normalize_tags_is_a_set() {
        let tags = normalize_tags(vec![
            " Loop ".into(),
            "Array".into(),
            "Loop".into(),
            "".into(),
        ]);
        assert_eq!(tags, vec!["Array".to_string(), "Loop".to_string()]);
    }

    #[test]
    fn test_update_rejects_off_lattice_difficulty() {
        let req = UpdateProblemRequest {
            difficulty: Some(3.3),
            ..Default::default()
        };
        assert!(validate_update_problem(&req).is_err());
    }
}
