//! Ground-truth derivation for test cases.
//!
//! A test case's expected output is never hand-entered: it is always the
//! sandbox's output for the problem's solution code on that case's input.

use common::{ExecuteRequest, ExitStatus};
use tracing::warn;

use crate::entity::problem;
use crate::error::AppError;
use crate::models::shared::string_array;
use crate::rules::{self, RuleMode};
use crate::sandbox::CodeExecutor;

/// Everything needed to derive expected output, independent of whether the
/// problem row exists yet (creation verifies test cases before the insert).
pub struct VerifySpec {
    pub solution_code: String,
    pub time_limit: i32,
    pub header_mode: RuleMode,
    pub headers: Vec<String>,
    pub function_mode: RuleMode,
    pub functions: Vec<String>,
}

impl VerifySpec {
    pub fn from_problem(problem: &problem::Model) -> Self {
        Self {
            solution_code: problem.solution_code.clone(),
            time_limit: problem.time_limit,
            header_mode: problem.header_mode,
            headers: string_array(&problem.headers),
            function_mode: problem.function_mode,
            functions: string_array(&problem.functions),
        }
    }
}

/// Run the solution code on `input` and return the output to persist as
/// `expect_output`.
///
/// The solution is held to the problem's own header/function rules. An
/// unreachable sandbox aborts the operation: an unverifiable test case must
/// never be persisted.
pub async fn derive_expect_output(
    executor: &dyn CodeExecutor,
    spec: &VerifySpec,
    input: &str,
) -> Result<String, AppError> {
    let violations = rules::validate_code(
        &spec.solution_code,
        spec.header_mode,
        &spec.headers,
        spec.function_mode,
        &spec.functions,
    );
    if !violations.is_empty() {
        return Err(AppError::Validation(format!(
            "Solution code violates the problem's rules: {}",
            rules::describe(&violations)
        )));
    }

    let response = executor
        .execute(ExecuteRequest {
            input: input.to_owned(),
            code: spec.solution_code.clone(),
            timeout: spec.time_limit as u64,
        })
        .await;

    if response.is_infra_failure() {
        return Err(AppError::SandboxUnavailable(
            "Sandbox unreachable while deriving expected output".into(),
        ));
    }

    if response.exit_status != ExitStatus::Success {
        warn!(
            exit_status = %response.exit_status,
            "Solution run did not exit cleanly; storing its output anyway"
        );
    }

    Ok(response.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::ExecuteResponse;

    /// Echoes the input back, or plays dead when the input says so.
    struct FakeExecutor;

    #[async_trait]
    impl CodeExecutor for FakeExecutor {
        async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse {
            if request.input == "sandbox down" {
                return ExecuteResponse::cant_connect();
            }
            ExecuteResponse {
                output: format!("echo:{}", request.input),
                exit_code: 0,
                exit_status: ExitStatus::Success,
                used_time: 3,
            }
        }
    }

    fn spec_with(solution_code: &str) -> VerifySpec {
        VerifySpec {
            solution_code: solution_code.into(),
            time_limit: 100,
            header_mode: RuleMode::Disallowed,
            headers: vec!["windows.h".into()],
            function_mode: RuleMode::Disallowed,
            functions: vec!["system".into()],
        }
    }

    #[tokio::test]
    async fn test_derives_output_from_solution_run() {
        let spec = spec_with("int main() { return 0; }");
        let output = derive_expect_output(&FakeExecutor, &spec, "1 2")
            .await
            .unwrap();
        assert_eq!(output, "echo:1 2");
    }

    #[tokio::test]
    async fn test_deriving_twice_is_idempotent() {
        let spec = spec_with("int main() { return 0; }");
        let first = derive_expect_output(&FakeExecutor, &spec, "7").await.unwrap();
        let second = derive_expect_output(&FakeExecutor, &spec, "7").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rule_breaking_solution_rejected() {
        let spec = spec_with("#include <windows.h>\nint main() { return 0; }");
        let err = derive_expect_output(&FakeExecutor, &spec, "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_sandbox_aborts() {
        let spec = spec_with("int main() { return 0; }");
        let err = derive_expect_output(&FakeExecutor, &spec, "sandbox down")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SandboxUnavailable(_)));
    }
}
