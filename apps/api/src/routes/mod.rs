pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::require_identity;
use crate::jobs::handlers as jobs;
use crate::media::handlers::{self as media, MAX_VIDEO_BYTES};
use crate::roadmaps::handlers as roadmaps;
use crate::state::AppState;
use crate::users::handlers as users;

/// Room for multipart framing around the largest accepted video.
const UPLOAD_BODY_LIMIT: usize = MAX_VIDEO_BYTES + 64 * 1024;

fn job_routes() -> Router<AppState> {
    // Static segments win over `:id`, so the per-user lists share the prefix
    // with the inbox and applicant routes.
    Router::new()
        .route("/feed/:id", get(jobs::handle_feed))
        .route("/batch-actions/:id", post(jobs::handle_batch_actions))
        .route("/save-job/:id", post(jobs::handle_save_job))
        .route("/saved-jobs/:id", get(jobs::handle_saved_jobs))
        .route("/passed-jobs/:id", get(jobs::handle_passed_jobs))
        .route("/post", post(jobs::handle_post_job))
        .route("/update", post(jobs::handle_update_job))
        .route("/posted/:id", get(jobs::handle_posted_jobs))
        .route("/apply", post(applications::handle_apply))
        .route("/submit-work", post(applications::handle_submit_work))
        .route(
            "/applications/:id",
            get(applications::handle_candidate_applications),
        )
        .route("/:id", get(jobs::handle_inbox))
        .route("/:id/applicants", get(applications::handle_list_applicants))
        .route(
            "/:id/applicants/:applicant_id",
            patch(applications::handle_update_status),
        )
        .route(
            "/:id/applicants/:applicant_id/analyze",
            patch(applications::handle_analyze),
        )
}

fn roadmap_routes() -> Router<AppState> {
    Router::new()
        .route("/:clerk_id", get(roadmaps::handle_list_roadmaps))
        .route("/:clerk_id/:roadmap_id", get(roadmaps::handle_get_roadmap))
        .route(
            "/:clerk_id/:roadmap_id/progress",
            put(roadmaps::handle_update_progress),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/onboarding", post(users::handle_onboarding))
        .route("/user-profile", post(users::handle_save_profile))
        .route("/user-profile/:clerk_id", get(users::handle_get_profile))
        .route(
            "/course-suggestions/:clerk_id",
            get(users::handle_course_suggestions),
        )
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/jobs", job_routes())
        .nest("/roadmaps", roadmap_routes())
        .nest("/user", user_routes())
        .route(
            "/upload/video",
            post(media::handle_upload_video).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .with_state(state)
}
