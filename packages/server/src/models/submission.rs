use common::ExitStatus;
use serde::{Deserialize, Serialize};

use super::shared::MAX_CODE_SIZE;
use crate::error::AppError;
use crate::judge::Verdict;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubmissionRequest {
    /// Candidate source code.
    pub code: String,
}

pub fn validate_create_submission(req: &CreateSubmissionRequest) -> Result<(), AppError> {
    if req.code.trim().is_empty() {
        return Err(AppError::Validation("Code must not be empty".into()));
    }
    if req.code.len() > MAX_CODE_SIZE {
        return Err(AppError::Validation(format!(
            "Code must be at most {MAX_CODE_SIZE} bytes"
        )));
    }
    Ok(())
}

/// Per-test-case verdict entry. Content fields are withheld on hidden test
/// cases for member callers.
#[derive(Serialize, utoipa::ToSchema)]
pub struct JudgedCaseResponse {
    pub test_case_id: i32,
    pub is_hidden: bool,
    pub pass: bool,
    pub exit_status: ExitStatus,
    /// Milliseconds spent in the sandbox, `-1` when it was unreachable.
    pub used_time: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VerdictResponse {
    pub is_pass: bool,
    pub cases: Vec<JudgedCaseResponse>,
}

impl VerdictResponse {
    /// Project a verdict for a caller. Staff and dev callers see everything;
    /// members get only the pass flag and exit status on hidden cases.
    pub fn project(verdict: Verdict, include_hidden_data: bool) -> Self {
        let cases = verdict
            .cases
            .into_iter()
            .map(|case| {
                let withhold = case.is_hidden && !include_hidden_data;
                JudgedCaseResponse {
                    test_case_id: case.test_case_id,
                    is_hidden: case.is_hidden,
                    pass: case.pass,
                    exit_status: case.exit_status,
                    used_time: case.used_time,
                    input: (!withhold).then_some(case.input),
                    expect_output: (!withhold).then_some(case.expect_output),
                    output: (!withhold).then_some(case.output),
                }
            })
            .collect();
        Self {
            is_pass: verdict.is_pass,
            cases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgedCase;

    fn verdict_with_hidden_case() -> Verdict {
        Verdict {
            is_pass: false,
            cases: vec![
                JudgedCase {
                    test_case_id: 1,
                    is_hidden: false,
                    pass: true,
                    input: "1 2".into(),
                    expect_output: "3".into(),
                    output: "3".into(),
                    exit_code: 0,
                    exit_status: ExitStatus::Success,
                    used_time: 4,
                },
                JudgedCase {
                    test_case_id: 2,
                    is_hidden: true,
                    pass: false,
                    input: "9 9".into(),
                    expect_output: "18".into(),
                    output: "81".into(),
                    exit_code: 0,
                    exit_status: ExitStatus::Success,
                    used_time: 4,
                },
            ],
        }
    }

    #[test]
    fn test_member_projection_withholds_hidden_content() {
        let response = VerdictResponse::project(verdict_with_hidden_case(), false);

        let visible = &response.cases[0];
        assert_eq!(visible.input.as_deref(), Some("1 2"));
        assert_eq!(visible.expect_output.as_deref(), Some("3"));

        let hidden = &response.cases[1];
        assert!(!hidden.pass);
        assert_eq!(hidden.exit_status, ExitStatus::Success);
        assert!(hidden.input.is_none());
        assert!(hidden.expect_output.is_none());
        assert!(hidden.output.is_none());
    }

    #[test]
    fn test_staff_projection_keeps_everything() {
        let response = VerdictResponse::project(verdict_with_hidden_case(), true);
        let hidden = &response.cases[1];
        assert_eq!(hidden.input.as_deref(), Some("9 9"));
        assert_eq!(hidden.expect_output.as_deref(), Some("18"));
        assert_eq!(hidden.output.as_deref(), Some("81"));
    }

    #[test]
    fn test_withheld_fields_leave_no_json_keys() {
        let response = VerdictResponse::project(verdict_with_hidden_case(), false);
        let json = serde_json::to_value(&response).unwrap();
        let hidden = &json["cases"][1];
        assert!(hidden.get("input").is_none());
        assert!(hidden.get("expect_output").is_none());
        assert!(hidden.get("output").is_none());
        assert_eq!(hidden["pass"], false);
    }
}
