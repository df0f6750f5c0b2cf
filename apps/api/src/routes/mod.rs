pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::admin::handlers as admin;
use crate::ai::handlers as ai;
use crate::billing::{handlers as billing, webhook};
use crate::jobs::handlers as jobs;
use crate::pdf::handlers as pdf;
use crate::profiles::handlers as profiles;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile API
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile)
                .put(profiles::handle_update_profile)
                .delete(profiles::handle_reset_profile),
        )
        .route(
            "/api/v1/profile/import/resume/:id",
            post(profiles::handle_import_resume),
        )
        .route(
            "/api/v1/profile/import/text",
            post(profiles::handle_import_text),
        )
        .route(
            "/api/v1/profile/import/pdf",
            post(profiles::handle_import_pdf)
                .layer(DefaultBodyLimit::max(profiles::PDF_UPLOAD_BODY_LIMIT)),
        )
        // Resume API
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_base_resume),
        )
        .route(
            "/api/v1/resumes/tailored",
            post(resumes::handle_create_tailored_resume),
        )
        .route("/api/v1/resumes/count", get(resumes::handle_count_resumes))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route("/api/v1/resumes/:id/copy", post(resumes::handle_copy_resume))
        .route(
            "/api/v1/resumes/:id/cover-letter",
            post(ai::handle_generate_cover_letter).put(resumes::handle_save_cover_letter),
        )
        .route("/api/v1/resumes/:id/pdf", get(pdf::handle_resume_pdf))
        .route("/api/v1/resumes/:id/style", get(pdf::handle_resume_style))
        // Jobs API
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/count", get(jobs::handle_count_jobs))
        .route("/api/v1/jobs/format", post(ai::handle_format_job_listing))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // AI actions
        .route("/api/v1/ai/tailor", post(ai::handle_tailor_resume))
        .route(
            "/api/v1/ai/work-experience/points",
            post(ai::handle_work_experience_points),
        )
        .route(
            "/api/v1/ai/work-experience/improve",
            post(ai::handle_improve_work_experience),
        )
        .route("/api/v1/ai/projects/points", post(ai::handle_project_points))
        .route("/api/v1/ai/projects/improve", post(ai::handle_improve_project))
        .route("/api/v1/ai/score", post(ai::handle_score_resume))
        .route("/api/v1/ai/chat", post(ai::handle_chat))
        // Subscription API
        .route("/api/v1/subscription", get(billing::handle_get_subscription))
        .route("/api/v1/subscription/plan", put(billing::handle_update_plan))
        .route(
            "/api/v1/subscription/checkout",
            post(billing::handle_create_checkout),
        )
        .route("/api/v1/subscription/portal", post(billing::handle_create_portal))
        .route(
            "/api/v1/subscription/cancel",
            post(billing::handle_cancel_subscription),
        )
        .route(
            "/api/v1/subscription/resume",
            post(billing::handle_resume_subscription),
        )
        // Admin API
        .route("/api/v1/admin/users", get(admin::handle_list_users))
        .route("/api/v1/admin/users/:id", get(admin::handle_get_user))
        .route("/api/v1/admin/stats", get(admin::handle_stats))
        // Stripe
        .route("/api/webhooks/stripe", post(webhook::handle_stripe_webhook))
        .with_state(state)
}
