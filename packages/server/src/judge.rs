//! Submission judging: fan the candidate code out over a problem's test
//! cases and aggregate a verdict.
//!
//! Nothing here is persisted; a verdict lives only in the response.

use std::collections::HashMap;

use common::{ExecuteRequest, ExecuteResponse, ExitStatus};
use futures::{StreamExt, stream};

use crate::entity::test_case;
use crate::sandbox::CodeExecutor;

/// Result of running the candidate against one test case.
#[derive(Clone, Debug)]
pub struct JudgedCase {
    pub test_case_id: i32,
    pub is_hidden: bool,
    pub pass: bool,
    pub input: String,
    pub expect_output: String,
    pub output: String,
    pub exit_code: i32,
    pub exit_status: ExitStatus,
    pub used_time: i32,
}

/// Aggregate verdict for a submission.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub is_pass: bool,
    pub cases: Vec<JudgedCase>,
}

/// Exact string equality after trimming leading/trailing whitespace. No
/// numeric or formatting normalization: `"3"` vs `"03"` fails.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

fn judged(tc: &test_case::Model, response: ExecuteResponse) -> JudgedCase {
    // A sandbox that was never reached says nothing about the code; that
    // case fails with a distinguishable exit status instead of aborting the
    // batch.
    let pass = !response.is_infra_failure() && outputs_match(&response.output, &tc.expect_output);
    JudgedCase {
        test_case_id: tc.id,
        is_hidden: tc.is_hidden,
        pass,
        input: tc.input.clone(),
        expect_output: tc.expect_output.clone(),
        output: response.output,
        exit_code: response.exit_code,
        exit_status: response.exit_status,
        used_time: response.used_time,
    }
}

/// Run `code` against every test case of a problem.
///
/// All cases execute; a failure on one never short-circuits the rest.
/// Sandbox calls are independent, so they are fanned out concurrently up to
/// `max_concurrency` and reassembled keyed by test case id, not completion
/// order.
pub async fn run(
    executor: &dyn CodeExecutor,
    time_limit: i32,
    test_cases: &[test_case::Model],
    code: &str,
    max_concurrency: usize,
) -> Verdict {
    let jobs: Vec<(i32, String)> = test_cases.iter().map(|tc| (tc.id, tc.input.clone())).collect();
    let mut responses: HashMap<i32, ExecuteResponse> = stream::iter(jobs)
        .map(|(id, input)| {
            let code = code.to_owned();
            async move {
                let response = executor
                    .execute(ExecuteRequest {
                        input,
                        code,
                        timeout: time_limit as u64,
                    })
                    .await;
                (id, response)
            }
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let cases: Vec<JudgedCase> = test_cases
        .iter()
        .map(|tc| {
            let response = responses
                .remove(&tc.id)
                .unwrap_or_else(ExecuteResponse::cant_connect);
            judged(tc, response)
        })
        .collect();

    let is_pass = !cases.is_empty() && cases.iter().all(|c| c.pass);
    Verdict { is_pass, cases }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    /// Scripted executor: input `"add <a> <b>"` prints the sum, input
    /// `"down"` simulates an unreachable sandbox, input `"slow ..."` sleeps
    /// first so completion order differs from submission order.
    struct ScriptedExecutor;

    #[async_trait]
    impl CodeExecutor for ScriptedExecutor {
        async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse {
            let input = request.input.trim_start_matches("slow ").to_string();
            if request.input.starts_with("slow ") {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            if input == "down" {
                return ExecuteResponse::cant_connect();
            }
            let output = if let Some(rest) = input.strip_prefix("add ") {
                let sum: i64 = rest
                    .split_whitespace()
                    .filter_map(|n| n.parse::<i64>().ok())
                    .sum();
                format!("{sum}\n")
            } else {
                input.clone()
            };
            ExecuteResponse {
                output,
                exit_code: 0,
                exit_status: ExitStatus::Success,
                used_time: 5,
            }
        }
    }

    fn case(id: i32, input: &str, expect: &str, hidden: bool) -> test_case::Model {
        let now = Utc::now();
        test_case::Model {
            id,
            input: input.into(),
            expect_output: expect.into(),
            is_hidden: hidden,
            problem_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_outputs_match_trims_only() {
        assert!(outputs_match("3\n", "3"));
        assert!(outputs_match("  3  ", "3"));
        // No numeric normalization.
        assert!(!outputs_match("03", "3"));
        // Interior whitespace still counts.
        assert!(!outputs_match("1  2", "1 2"));
    }

    #[tokio::test]
    async fn test_passing_submission() {
        let cases = vec![case(1, "add 1 2", "3", false), case(2, "add 2 2", "4", true)];
        let verdict = run(&ScriptedExecutor, 100, &cases, "code", 4).await;
        assert!(verdict.is_pass);
        assert!(verdict.cases.iter().all(|c| c.pass));
    }

    #[tokio::test]
    async fn test_one_wrong_answer_fails_aggregate() {
        let cases = vec![case(1, "add 1 2", "3", false), case(2, "add 2 2", "5", true)];
        let verdict = run(&ScriptedExecutor, 100, &cases, "code", 4).await;
        assert!(!verdict.is_pass);
        assert!(verdict.cases[0].pass);
        assert!(!verdict.cases[1].pass);
    }

    #[tokio::test]
    async fn test_sandbox_hiccup_is_contained() {
        let cases = vec![
            case(1, "add 1 2", "3", false),
            case(2, "down", "whatever", true),
            case(3, "add 3 4", "7", true),
        ];
        let verdict = run(&ScriptedExecutor, 100, &cases, "code", 4).await;
        // The dead case fails with the sentinel status; the others still ran.
        assert!(!verdict.is_pass);
        assert!(!verdict.cases[1].pass);
        assert_eq!(verdict.cases[1].exit_status, ExitStatus::CantConnectToCompiler);
        assert_eq!(verdict.cases[1].used_time, -1);
        assert!(verdict.cases[0].pass);
        assert!(verdict.cases[2].pass);
    }

    #[tokio::test]
    async fn test_infra_failure_never_passes_empty_expectation() {
        // Expected output is empty; an unreachable sandbox also yields empty
        // output, which must not count as a match.
        let cases = vec![case(1, "down", "", false)];
        let verdict = run(&ScriptedExecutor, 100, &cases, "code", 2).await;
        assert!(!verdict.cases[0].pass);
    }

    #[tokio::test]
    async fn test_results_keyed_by_case_not_completion_order() {
        // The first case finishes last; results must still line up by id.
        let cases = vec![
            case(10, "slow add 1 1", "2", false),
            case(20, "add 2 2", "4", false),
            case(30, "add 3 3", "6", false),
        ];
        let verdict = run(&ScriptedExecutor, 100, &cases, "code", 4).await;
        let ids: Vec<i32> = verdict.cases.iter().map(|c| c.test_case_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert!(verdict.is_pass);
    }

    #[tokio::test]
    async fn test_no_cases_is_not_a_pass() {
        let verdict = run(&ScriptedExecutor, 100, &[], "code", 4).await;
        assert!(!verdict.is_pass);
        assert!(verdict.cases.is_empty());
    }
}
