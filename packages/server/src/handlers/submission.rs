use axum::Json;
use axum::extract::{Path, State};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::test_case;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::judge;
use crate::models::shared::string_array;
use crate::models::submission::*;
use crate::policy;
use crate::rules;
use crate::state::AppState;

use super::problem::find_problem;

#[utoipa::path(
    post,
    path = "/",
    tag = "Submissions",
    operation_id = "judgeSubmission",
    summary = "Judge a candidate solution",
    description = "Runs the candidate code against every test case of the problem and returns the verdict. Submissions are not persisted, so retrying is always safe. Members may only submit against PUBLISHED problems; hidden test cases report only pass/fail and exit status to them.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = CreateSubmissionRequest,
    responses(
        (status = 200, description = "Verdict", body = VerdictResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(problem_id, user_id = auth_user.user_id))]
pub async fn judge_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
    AppJson(payload): AppJson<CreateSubmissionRequest>,
) -> Result<Json<VerdictResponse>, AppError> {
    auth_user.require("submission:submit")?;
    validate_create_submission(&payload)?;

    let problem = find_problem(&state.db, problem_id).await?;
    policy::require_visible(auth_user.role, problem.dev_status)?;

    let violations = rules::validate_code(
        &payload.code,
        problem.header_mode,
        &string_array(&problem.headers),
        problem.function_mode,
        &string_array(&problem.functions),
    );
    if !violations.is_empty() {
        return Err(AppError::Validation(format!(
            "Code violates the problem's rules: {}",
            rules::describe(&violations)
        )));
    }

    let cases = test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem.id))
        .order_by_asc(test_case::Column::Id)
        .all(&state.db)
        .await?;

    let verdict = judge::run(
        state.executor.as_ref(),
        problem.time_limit,
        &cases,
        &payload.code,
        state.config.sandbox.max_concurrency,
    )
    .await;

    info!(
        is_pass = verdict.is_pass,
        cases = verdict.cases.len(),
        "Submission judged"
    );

    Ok(Json(VerdictResponse::project(
        verdict,
        policy::can_view_hidden_data(auth_user.role),
    )))
}
