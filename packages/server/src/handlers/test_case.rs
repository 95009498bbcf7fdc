use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::test_case;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::test_case::*;
use crate::state::AppState;
use crate::verifier::{self, VerifySpec};

use super::problem::{find_problem, find_problem_for_update};

#[utoipa::path(
    post,
    path = "/",
    tag = "Test Cases",
    operation_id = "createTestCase",
    summary = "Create a verified test case",
    description = "Runs the problem's solution code on the supplied input and stores the output as the expected output. Fails with SANDBOX_UNAVAILABLE instead of persisting an unverifiable case. Requires the `testcase:manage` capability.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = CreateTestCaseRequest,
    responses(
        (status = 201, description = "Test case created", body = TestCaseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Sandbox unreachable (SANDBOX_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(problem_id))]
pub async fn create_test_case(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
    AppJson(payload): AppJson<CreateTestCaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require("testcase:manage")?;

    let problem = find_problem(&state.db, problem_id).await?;

    let input = payload.input.unwrap_or_default();
    validate_test_case_input(&input)?;

    let spec = VerifySpec::from_problem(&problem);
    let expect_output =
        verifier::derive_expect_output(state.executor.as_ref(), &spec, &input).await?;

    let now = Utc::now();
    let new_tc = test_case::ActiveModel {
        input: Set(input),
        expect_output: Set(expect_output),
        is_hidden: Set(payload.is_hidden),
        problem_id: Set(problem.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_tc.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(TestCaseResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Test Cases",
    operation_id = "listTestCases",
    summary = "List all test cases for a problem",
    description = "Returns every test case, hidden included, with full input and expected output. Requires the `testcase:manage` capability.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Test cases", body = Vec<TestCaseResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(problem_id))]
pub async fn list_test_cases(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
) -> Result<Json<Vec<TestCaseResponse>>, AppError> {
    auth_user.require("testcase:manage")?;

    find_problem(&state.db, problem_id).await?;

    let rows = test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .order_by_asc(test_case::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(TestCaseResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/{tc_id}",
    tag = "Test Cases",
    operation_id = "updateTestCase",
    summary = "Update a test case",
    description = "PATCH semantics. A changed input re-derives the expected output through the sandbox; toggling `is_hidden` alone is a pure metadata update. Requires the `testcase:manage` capability.",
    params(
        ("id" = i32, Path, description = "Problem ID"),
        ("tc_id" = i32, Path, description = "Test case ID"),
    ),
    request_body = UpdateTestCaseRequest,
    responses(
        (status = 200, description = "Test case updated", body = TestCaseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Test case not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Sandbox unreachable (SANDBOX_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(problem_id, tc_id))]
pub async fn update_test_case(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((problem_id, tc_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateTestCaseRequest>,
) -> Result<Json<TestCaseResponse>, AppError> {
    auth_user.require("testcase:manage")?;

    if payload == UpdateTestCaseRequest::default() {
        let existing = find_test_case_for_problem(&state.db, problem_id, tc_id).await?;
        return Ok(Json(existing.into()));
    }

    let problem = find_problem(&state.db, problem_id).await?;
    let existing = find_test_case_for_problem(&state.db, problem_id, tc_id).await?;

    let new_input = match payload.input {
        Some(input) if input != existing.input => {
            validate_test_case_input(&input)?;
            Some(input)
        }
        _ => None,
    };

    // Only an input change invalidates the stored expectation.
    let new_expect_output = match &new_input {
        Some(input) => {
            let spec = VerifySpec::from_problem(&problem);
            Some(verifier::derive_expect_output(state.executor.as_ref(), &spec, input).await?)
        }
        None => None,
    };

    let mut active: test_case::ActiveModel = existing.into();
    if let Some(input) = new_input {
        active.input = Set(input);
    }
    if let Some(expect_output) = new_expect_output {
        active.expect_output = Set(expect_output);
    }
    if let Some(is_hidden) = payload.is_hidden {
        active.is_hidden = Set(is_hidden);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{tc_id}",
    tag = "Test Cases",
    operation_id = "deleteTestCase",
    summary = "Delete a test case",
    description = "Deletes unconditionally. Requires the `testcase:manage` capability.",
    params(
        ("id" = i32, Path, description = "Problem ID"),
        ("tc_id" = i32, Path, description = "Test case ID"),
    ),
    responses(
        (status = 204, description = "Test case deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Test case not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(problem_id, tc_id))]
pub async fn delete_test_case(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((problem_id, tc_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require("testcase:manage")?;

    let txn = state.db.begin().await?;
    find_problem_for_update(&txn, problem_id).await?;
    let tc = find_test_case_for_problem(&txn, problem_id, tc_id).await?;

    test_case::Entity::delete_by_id(tc.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_test_case_for_problem<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
    tc_id: i32,
) -> Result<test_case::Model, AppError> {
    let tc = test_case::Entity::find_by_id(tc_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Test case not found".into()))?;

    if tc.problem_id != problem_id {
        return Err(AppError::NotFound("Test case not found".into()));
    }

    Ok(tc)
}
