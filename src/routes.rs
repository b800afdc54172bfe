// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, answer, auth, comment, doubt, junior_space, mentor_profile, upvote, user},
    realtime,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (users, doubts, answers, comments, junior space,
///   mentor profiles, upvotes, admin, websocket).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, broadcaster).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let require_auth =
        middleware::from_fn_with_state(state.config.clone(), auth_middleware);

    let user_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/mentors/approved", get(user::list_approved_mentors))
        .route("/role/{role}", get(user::list_users_by_role))
        .route("/{id}", get(user::get_profile))
        .merge(
            Router::new()
                .route(
                    "/{id}",
                    axum::routing::patch(user::update_profile).delete(user::delete_user),
                )
                .route("/{id}/change-password", post(user::change_password))
                .layer(require_auth.clone()),
        );

    let doubt_routes = Router::new()
        .route("/", get(doubt::list_doubts))
        .route("/{id}", get(doubt::get_doubt))
        .route("/user/{user_id}", get(doubt::list_doubts_by_user))
        .route("/tag/{tag}", get(doubt::list_doubts_by_tag))
        .route("/stats/overview", get(doubt::doubt_stats))
        .merge(
            Router::new()
                .route("/", post(doubt::create_doubt))
                .route(
                    "/{id}",
                    axum::routing::patch(doubt::update_doubt).delete(doubt::delete_doubt),
                )
                .layer(require_auth.clone()),
        );

    let answer_routes = Router::new()
        .route("/doubt/{doubt_id}", get(answer::list_answers_by_doubt))
        .route("/{id}", get(answer::get_answer))
        .route("/mentor/{mentor_id}", get(answer::list_answers_by_mentor))
        .route("/helpful/top", get(answer::list_most_helpful))
        .merge(
            Router::new()
                .route("/doubt/{doubt_id}", post(answer::create_answer))
                .route(
                    "/{id}",
                    axum::routing::patch(answer::update_answer).delete(answer::delete_answer),
                )
                .layer(require_auth.clone()),
        );

    let comment_routes = Router::new()
        .route("/doubt/{doubt_id}", get(comment::list_comments_by_doubt))
        .route("/{id}", get(comment::get_comment))
        .route("/{id}/replies", get(comment::list_replies))
        .route("/user/{user_id}", get(comment::list_comments_by_user))
        .merge(
            Router::new()
                .route("/doubt/{doubt_id}", post(comment::create_comment))
                .route(
                    "/{id}",
                    axum::routing::patch(comment::update_comment).delete(comment::delete_comment),
                )
                .layer(require_auth.clone()),
        );

    let junior_space_routes = Router::new()
        .route("/", get(junior_space::list_posts))
        .route("/recent", get(junior_space::list_recent_posts))
        .route("/user/{user_id}", get(junior_space::list_posts_by_user))
        .route("/stats/overview", get(junior_space::junior_space_stats))
        .route("/{id}", get(junior_space::get_post))
        .merge(
            Router::new()
                .route("/", post(junior_space::create_post))
                .route(
                    "/{id}",
                    axum::routing::patch(junior_space::update_post)
                        .delete(junior_space::delete_post),
                )
                .layer(require_auth.clone()),
        );

    let mentor_profile_routes = Router::new()
        .route("/register", post(mentor_profile::register_mentor))
        .route("/", get(mentor_profile::list_approved))
        .route("/pending", get(mentor_profile::list_pending))
        .route("/expertise/{tag}", get(mentor_profile::list_by_expertise))
        .route("/top", get(mentor_profile::list_top))
        .route("/{mentor_id}", get(mentor_profile::get_profile))
        .merge(
            Router::new()
                .route(
                    "/{mentor_id}",
                    post(mentor_profile::create_profile)
                        .patch(mentor_profile::update_profile)
                        .delete(mentor_profile::delete_profile),
                )
                .layer(require_auth.clone()),
        );

    let upvote_routes = Router::new()
        .route("/{answer_id}", get(upvote::list_by_answer))
        .route("/user/{user_id}", get(upvote::list_by_user))
        .route("/{answer_id}/check/{user_id}", get(upvote::check_upvote))
        .route("/stats/overview", get(upvote::upvote_stats))
        .merge(
            Router::new()
                .route(
                    "/{answer_id}",
                    post(upvote::upvote_answer).delete(upvote::remove_upvote),
                )
                .layer(require_auth.clone()),
        );

    let admin_routes = Router::new()
        .route("/register", post(admin::register_admin))
        .merge(
            Router::new()
                .route("/approve-mentor/{mentor_id}", post(admin::approve_mentor))
                .route("/reject-mentor/{mentor_id}", post(admin::reject_mentor))
                .route("/ban-user/{user_id}", post(admin::ban_user))
                .route("/unban-user/{user_id}", post(admin::unban_user))
                .route("/doubts/{id}", delete(admin::delete_doubt))
                .route("/answers/{id}", delete(admin::delete_answer))
                .route("/comments/{id}", delete(admin::delete_comment))
                .route("/junior-posts/{id}", delete(admin::delete_junior_post))
                .route("/actions", get(admin::list_actions))
                .route("/stats", get(admin::action_stats))
                .route("/reconcile-upvotes", post(admin::reconcile_upvotes))
                // Double middleware protection: Auth first, then Admin check
                .layer(middleware::from_fn(admin_middleware))
                .layer(require_auth.clone()),
        );

    Router::new()
        .route("/", get(|| async { "CodeShack API is running" }))
        .nest("/api/users", user_routes)
        .nest("/api/doubts", doubt_routes)
        .nest("/api/answers", answer_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/junior-space-posts", junior_space_routes)
        .nest("/api/mentor-profiles", mentor_profile_routes)
        .nest("/api/upvotes", upvote_routes)
        .route("/api/ws/{channel}", get(realtime::ws_handler))
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
