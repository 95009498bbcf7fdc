use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/problems", problem_routes())
        .nest("/problems/{id}/test-cases", test_case_routes())
        .nest("/problems/{id}/submissions", submission_routes())
}

fn problem_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::problem::list_problems,
            handlers::problem::create_problem
        ))
        .routes(routes!(
            handlers::problem::get_problem,
            handlers::problem::update_problem,
            handlers::problem::delete_problem
        ))
        .routes(routes!(handlers::problem::submit_for_review))
        .routes(routes!(handlers::problem::publish_problem))
        .routes(routes!(handlers::problem::reject_problem))
        .routes(routes!(handlers::problem::archive_problem))
        .routes(routes!(handlers::problem::reopen_problem))
}

fn test_case_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::test_case::list_test_cases,
            handlers::test_case::create_test_case
        ))
        .routes(routes!(
            handlers::test_case::update_test_case,
            handlers::test_case::delete_test_case
        ))
}

fn submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::submission::judge_submission))
}
