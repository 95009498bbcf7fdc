use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::DevStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{problem, test_case, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::problem::*;
use crate::models::shared::{escape_like, page_window, to_json_array};
use crate::models::test_case::validate_test_case_input;
use crate::policy;
use crate::state::AppState;
use crate::verifier::{self, VerifySpec};

#[utoipa::path(
    post,
    path = "/",
    tag = "Problems",
    operation_id = "createProblem",
    summary = "Create a new problem",
    description = "Creates a problem in IN_PROGRESS state. Every supplied test case is verified by running the solution code in the sandbox before anything is persisted. Requires the `problem:create` capability.",
    request_body = CreateProblemRequest,
    responses(
        (status = 201, description = "Problem created", body = ProblemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Sandbox unreachable (SANDBOX_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProblemRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require("problem:create")?;
    validate_create_problem(&payload)?;

    let spec = VerifySpec {
        solution_code: payload.solution_code.clone(),
        time_limit: payload.time_limit,
        header_mode: payload.header_mode,
        headers: payload.headers.clone(),
        function_mode: payload.function_mode,
        functions: payload.functions.clone(),
    };

    // Derive ground truth for every test case up front; an unreachable
    // sandbox aborts before anything touches the database.
    let mut verified = Vec::with_capacity(payload.test_cases.len());
    for tc in &payload.test_cases {
        let input = tc.input.clone().unwrap_or_default();
        validate_test_case_input(&input)?;
        let expect_output =
            verifier::derive_expect_output(state.executor.as_ref(), &spec, &input).await?;
        verified.push((input, expect_output, tc.is_hidden));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let new_problem = problem::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        default_code: Set(payload.default_code),
        solution_code: Set(payload.solution_code),
        difficulty: Set(payload.difficulty),
        time_limit: Set(payload.time_limit),
        header_mode: Set(payload.header_mode),
        headers: Set(to_json_array(&payload.headers)),
        function_mode: Set(payload.function_mode),
        functions: Set(to_json_array(&payload.functions)),
        tags: Set(to_json_array(&normalize_tags(payload.tags))),
        dev_status: Set(DevStatus::InProgress),
        rejected_message: Set(None),
        author_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_problem.insert(&txn).await?;

    for (input, expect_output, is_hidden) in verified {
        let new_tc = test_case::ActiveModel {
            input: Set(input),
            expect_output: Set(expect_output),
            is_hidden: Set(is_hidden),
            problem_id: Set(model.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_tc.insert(&txn).await?;
    }

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(ProblemResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Problems",
    operation_id = "listProblems",
    summary = "Search the problem catalog",
    description = "Paged catalog search over title/author text, tags, difficulty range and lifecycle status. Member view is locked to PUBLISHED problems; `staff_view=true` requires the `catalog:staff_view` capability and exposes lifecycle state.",
    params(ProblemListQuery),
    responses(
        (status = 200, description = "Matching problems", body = ProblemListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProblemListQuery>,
) -> Result<Json<ProblemListResponse>, AppError> {
    let staff_view = query.staff_view.unwrap_or(false);
    if staff_view {
        auth_user.require("catalog:staff_view")?;
    }

    let (page, limit) = page_window(query.page, query.limit, state.config.catalog.page_size);

    let mut select = problem::Entity::find().find_also_related(user::Entity);

    // Members never see anything that is not published, whatever they ask
    // for; staff may filter by lifecycle state.
    if staff_view {
        if let Some(status) = query.status {
            select = select.filter(problem::Column::DevStatus.eq(status));
        }
    } else {
        select = select.filter(problem::Column::DevStatus.eq(DevStatus::Published));
    }

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            problem::Entity,
                            problem::Column::Title,
                        ))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            user::Entity,
                            user::Column::Username,
                        ))))
                        .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    if let Some(ref tags) = query.tags {
        let requested: Vec<&str> = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !requested.is_empty() {
            // Non-empty intersection: any requested tag contained in the
            // problem's tag array keeps the row.
            let mut any_tag = Condition::any();
            for tag in requested {
                any_tag = any_tag.add(Expr::cust_with_values(
                    r#""problem"."tags" @> ?"#,
                    [serde_json::json!([tag])],
                ));
            }
            select = select.filter(any_tag);
        }
    }

    let min_difficulty = query.min_difficulty.unwrap_or(DIFFICULTY_LATTICE[0]);
    let max_difficulty = query
        .max_difficulty
        .unwrap_or(DIFFICULTY_LATTICE[DIFFICULTY_LATTICE.len() - 1]);
    select = select.filter(problem::Column::Difficulty.between(min_difficulty, max_difficulty));

    let id_order = if query.id_reverse.unwrap_or(false) {
        Order::Desc
    } else {
        Order::Asc
    };
    let difficulty_order = match query.difficulty_sort.as_deref() {
        None => None,
        Some("asc") => Some(Order::Asc),
        Some("desc") => Some(Order::Desc),
        Some(_) => {
            return Err(AppError::Validation(
                "difficulty_sort must be one of: asc, desc".into(),
            ));
        }
    };

    let total = select.clone().count(&state.db).await?;
    let total_pages = total.div_ceil(limit);

    select = select.order_by(problem::Column::Id, id_order);
    if let Some(order) = difficulty_order {
        select = select.order_by(problem::Column::Difficulty, order);
    }

    // A page past the end selects an empty window; that is a valid result,
    // not an error.
    let rows = select
        .offset(Some((page - 1) * limit))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(|(p, author)| ProblemListItem::project(p, author, staff_view))
        .collect();

    Ok(Json(ProblemListResponse {
        data,
        pagination: Pagination {
            page,
            per_page: limit,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Problems",
    operation_id = "getProblem",
    summary = "Get a problem by ID",
    description = "Staff and dev callers receive the full record including solution code and lifecycle state. Members receive the public view of a PUBLISHED problem (non-hidden test cases embedded as examples) and PERMISSION_DENIED otherwise.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem details", body = ProblemResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let model = find_problem(&state.db, id).await?;
    policy::require_visible(auth_user.role, model.dev_status)?;

    if policy::can_view_hidden_data(auth_user.role) {
        return Ok(Json(ProblemResponse::from(model)).into_response());
    }

    let author = user::Entity::find_by_id(model.author_id)
        .one(&state.db)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    let samples = test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(model.id))
        .filter(test_case::Column::IsHidden.eq(false))
        .order_by_asc(test_case::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(PublicProblemResponse::project(model, author, samples)).into_response())
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Problems",
    operation_id = "updateProblem",
    summary = "Update an existing problem",
    description = "Partially updates a problem using PATCH semantics — only provided fields are modified; test cases cannot be touched here. Changing the solution code re-derives every test case's expected output and aborts if the sandbox is unreachable. Requires the `problem:edit` capability.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = UpdateProblemRequest,
    responses(
        (status = 200, description = "Problem updated", body = ProblemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Sandbox unreachable (SANDBOX_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProblemRequest>,
) -> Result<Json<ProblemResponse>, AppError> {
    auth_user.require("problem:edit")?;
    validate_update_problem(&payload)?;

    if payload == UpdateProblemRequest::default() {
        let existing = find_problem(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;

    let existing = find_problem_for_update(&txn, id).await?;
    let solution_changed = payload
        .solution_code
        .as_ref()
        .is_some_and(|code| *code != existing.solution_code);

    let now = Utc::now();
    let mut active: problem::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    match payload.description {
        Some(Some(description)) => active.description = Set(Some(description)),
        Some(None) => active.description = Set(None),
        None => {}
    }
    if let Some(default_code) = payload.default_code {
        active.default_code = Set(default_code);
    }
    if let Some(solution_code) = payload.solution_code {
        active.solution_code = Set(solution_code);
    }
    if let Some(difficulty) = payload.difficulty {
        active.difficulty = Set(difficulty);
    }
    if let Some(time_limit) = payload.time_limit {
        active.time_limit = Set(time_limit);
    }
    if let Some(header_mode) = payload.header_mode {
        active.header_mode = Set(header_mode);
    }
    if let Some(ref headers) = payload.headers {
        active.headers = Set(to_json_array(headers));
    }
    if let Some(function_mode) = payload.function_mode {
        active.function_mode = Set(function_mode);
    }
    if let Some(ref functions) = payload.functions {
        active.functions = Set(to_json_array(functions));
    }
    if let Some(tags) = payload.tags {
        active.tags = Set(to_json_array(&normalize_tags(tags)));
    }
    active.updated_at = Set(now);

    let model = active.update(&txn).await?;

    if solution_changed {
        // Stored expectations must keep tracking the solution; re-derive
        // inside the transaction so an unreachable sandbox rolls the whole
        // update back.
        let spec = VerifySpec::from_problem(&model);
        let cases = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(model.id))
            .order_by_asc(test_case::Column::Id)
            .all(&txn)
            .await?;
        for tc in cases {
            let expect_output =
                verifier::derive_expect_output(state.executor.as_ref(), &spec, &tc.input).await?;
            if expect_output != tc.expect_output {
                let mut tc_active: test_case::ActiveModel = tc.into();
                tc_active.expect_output = Set(expect_output);
                tc_active.updated_at = Set(now);
                tc_active.update(&txn).await?;
            }
        }
    }

    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Problems",
    operation_id = "deleteProblem",
    summary = "Delete a problem by ID",
    description = "Permanently deletes a problem and cascade-deletes its test cases. Requires the `problem:delete` capability.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 204, description = "Problem deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require("problem:delete")?;

    let txn = state.db.begin().await?;

    let model = find_problem_for_update(&txn, id).await?;

    test_case::Entity::delete_many()
        .filter(test_case::Column::ProblemId.eq(model.id))
        .exec(&txn)
        .await?;
    problem::Entity::delete_by_id(model.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply one lifecycle transition, validating it against the state machine.
async fn transition_problem(
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
    next: DevStatus,
    message: Option<String>,
) -> Result<Json<ProblemResponse>, AppError> {
    auth_user.require("problem:transition")?;

    let txn = state.db.begin().await?;
    let existing = find_problem_for_update(&txn, id).await?;

    if !existing.dev_status.can_become(next) {
        return Err(AppError::Validation(format!(
            "Cannot move problem from {} to {}",
            existing.dev_status, next
        )));
    }

    if next == DevStatus::Published {
        require_publishable_test_cases(&txn, existing.id).await?;
    }

    let mut active: problem::ActiveModel = existing.into();
    active.dev_status = Set(next);
    match next {
        // The rejection message lives only while the problem stays rejected.
        DevStatus::Rejected => active.rejected_message = Set(message),
        DevStatus::InProgress => active.rejected_message = Set(None),
        _ => {}
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

/// Publishing needs at least one visible test case (members always get an
/// example) and one hidden case (grading always checks something concealed).
async fn require_publishable_test_cases(
    txn: &DatabaseTransaction,
    problem_id: i32,
) -> Result<(), AppError> {
    let visible = test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .filter(test_case::Column::IsHidden.eq(false))
        .count(txn)
        .await?;
    if visible == 0 {
        return Err(AppError::Validation(
            "Publishing requires at least one non-hidden test case".into(),
        ));
    }
    let hidden = test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .filter(test_case::Column::IsHidden.eq(true))
        .count(txn)
        .await?;
    if hidden == 0 {
        return Err(AppError::Validation(
            "Publishing requires at least one hidden test case".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/{id}/submit-review",
    tag = "Problems",
    operation_id = "submitProblemForReview",
    summary = "Move a problem from IN_PROGRESS to NEED_REVIEW",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem moved to NEED_REVIEW", body = ProblemResponse),
        (status = 400, description = "Illegal transition (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn submit_for_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemResponse>, AppError> {
    transition_problem(&state, &auth_user, id, DevStatus::NeedReview, None).await
}

#[utoipa::path(
    post,
    path = "/{id}/publish",
    tag = "Problems",
    operation_id = "publishProblem",
    summary = "Move a problem from NEED_REVIEW to PUBLISHED",
    description = "Requires at least one hidden and one non-hidden test case.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem published", body = ProblemResponse),
        (status = 400, description = "Illegal transition or missing test cases (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn publish_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemResponse>, AppError> {
    transition_problem(&state, &auth_user, id, DevStatus::Published, None).await
}

#[utoipa::path(
    post,
    path = "/{id}/reject",
    tag = "Problems",
    operation_id = "rejectProblem",
    summary = "Move a problem from NEED_REVIEW to REJECTED",
    description = "Stores the reviewer's message on the problem until it is reopened.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Problem rejected", body = ProblemResponse),
        (status = 400, description = "Illegal transition or missing message (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn reject_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RejectRequest>,
) -> Result<Json<ProblemResponse>, AppError> {
    validate_reject(&payload)?;
    transition_problem(
        &state,
        &auth_user,
        id,
        DevStatus::Rejected,
        Some(payload.message.trim().to_string()),
    )
    .await
}

#[utoipa::path(
    post,
    path = "/{id}/archive",
    tag = "Problems",
    operation_id = "archiveProblem",
    summary = "Move a problem from PUBLISHED to ARCHIVED",
    description = "ARCHIVED is terminal; there is no way back.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem archived", body = ProblemResponse),
        (status = 400, description = "Illegal transition (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn archive_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemResponse>, AppError> {
    transition_problem(&state, &auth_user, id, DevStatus::Archived, None).await
}

#[utoipa::path(
    post,
    path = "/{id}/reopen",
    tag = "Problems",
    operation_id = "reopenProblem",
    summary = "Move a problem from REJECTED back to IN_PROGRESS",
    description = "Clears the stored rejection message.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem reopened", body = ProblemResponse),
        (status = 400, description = "Illegal transition (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn reopen_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemResponse>, AppError> {
    transition_problem(&state, &auth_user, id, DevStatus::InProgress, None).await
}

pub(super) async fn find_problem<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<problem::Model, AppError> {
    problem::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}

pub(super) async fn find_problem_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<problem::Model, AppError> {
    use sea_orm::sea_query::LockType;
    problem::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}
