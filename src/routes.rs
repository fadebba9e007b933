// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        admin, auth, comments, favorites, notebooks, notes, profile, questions, simulados,
        study_plan, syllabus, theories,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public routes: registration and token issuing.
/// * User routes: everything else, behind the JWT layer.
/// * Admin routes: user approval and content management, JWT plus role check.
///
/// Routes of the three groups may share a path with different methods.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/token", post(auth::login))
        .route("/api/register/", post(auth::register));

    let user_routes = Router::new()
        // Profile
        .route("/api/users/me/", get(profile::get_me))
        .route("/api/users/me/stats", get(profile::get_my_stats))
        .route("/api/users/me/comments", get(profile::list_my_comments))
        .route("/api/users/me/liked-comments", get(profile::list_liked_comments))
        .route("/api/users/me/wrong-questions", get(profile::list_wrong_questions))
        // Question bank
        .route("/api/questions/", get(questions::list_questions))
        .route("/api/questions/buscar", get(questions::search_questions))
        .route("/api/questions/count-filtered/", get(questions::count_filtered))
        .route("/api/questions/fields/{field_name}", get(questions::distinct_field_values))
        .route("/api/questions/{question_id}", get(questions::get_question))
        .route(
            "/api/questions/{question_id}/statistics",
            get(questions::get_statistics).patch(questions::update_statistics),
        )
        .route(
            "/api/questions/{question_id}/statistics/split",
            get(questions::split_statistics),
        )
        // Comments
        .route(
            "/api/questions/{question_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/questions/comments/{comment_id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route(
            "/api/questions/comments/{comment_id}/vote",
            patch(comments::vote_comment),
        )
        .route("/api/comments/by-id/{comment_id}", get(comments::get_comment))
        // Notebooks
        .route(
            "/api/notebooks/",
            get(notebooks::list_notebooks).post(notebooks::create_notebook),
        )
        .route(
            "/api/notebooks/{notebook_id}",
            put(notebooks::rename_notebook).delete(notebooks::delete_notebook),
        )
        .route("/api/notebooks/{notebook_id}/resolve_data", get(notebooks::resolve_data))
        .route(
            "/api/notebooks/{notebook_id}/progress",
            get(notebooks::get_progress).patch(notebooks::save_progress),
        )
        .route("/api/notebooks/{notebook_id}/resposta", patch(notebooks::register_answer))
        // Theories
        .route("/api/theories/", get(theories::get_theories))
        .route("/api/theories", get(theories::get_theories))
        // Favorites
        .route(
            "/api/favorites/",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route(
            "/api/favorites/{question_id}/{notebook_id}",
            delete(favorites::remove_favorite),
        )
        // Notes
        .route("/api/notes/", post(notes::upsert_note))
        .route("/api/notes/me", get(notes::my_notes))
        .route("/api/notes/detail/{id}", get(notes::note_detail))
        .route(
            "/api/notes/{id}",
            get(notes::note_for_question)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        // Simulados
        .route("/api/simulados/generate/", post(simulados::generate_simulado))
        .route("/api/simulados/submit/{simulado_id}", post(simulados::submit_simulado))
        .route("/api/simulados/list/", get(simulados::list_simulados))
        .route("/api/simulados/statistics/", get(simulados::simulado_statistics))
        .route("/api/simulados/count-questions/", get(simulados::count_questions))
        // Verticalized syllabus
        .route(
            "/api/edital-verticalizado/",
            get(syllabus::list_syllabi).post(syllabus::create_syllabus),
        )
        .route(
            "/api/edital-verticalizado/{syllabus_id}",
            get(syllabus::get_syllabus)
                .patch(syllabus::update_syllabus)
                .delete(syllabus::delete_syllabus),
        )
        .route(
            "/api/edital-verticalizado/{syllabus_id}/gerar-caderno",
            post(syllabus::generate_notebook),
        )
        .route("/api/edital/{edital_id}/materias", get(syllabus::syllabus_subjects))
        // Study plan
        .route("/api/planos-de-estudo/usuario", get(study_plan::planned_syllabi))
        .route("/api/planos-de-estudo/{edital_id}", get(study_plan::suggest_study_hours))
        .route("/api/plano-de-estudo", get(study_plan::list_calendars))
        .route(
            "/api/calendario/{edital_id}",
            get(study_plan::get_calendar).post(study_plan::save_calendar),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/api/users/pending/", get(admin::list_pending_users))
        .route("/api/users/{user_id}/approve", patch(admin::approve_user))
        .route("/api/users/{user_id}/reject", patch(admin::reject_user))
        .route("/api/questions/", post(admin::create_question))
        .route(
            "/api/questions/{question_id}",
            put(admin::replace_question).delete(admin::delete_question),
        )
        .route(
            "/api/questions/{question_id}/status",
            patch(admin::update_question_status),
        )
        .route("/api/theories/", post(admin::upsert_theory))
        .route(
            "/api/theories/{materia}/{assunto}",
            delete(admin::delete_theory),
        )
        // Double middleware protection: Auth first, then Admin check.
        // Unmatched paths skip both checks and fall through to 404.
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
