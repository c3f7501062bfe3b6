//! HTTP route handlers for the Listkeeper server.
//!
//! This module provides the HTTP endpoints:
//!
//! - `GET /` - Redirect to the list index
//! - `GET /lists`, `POST /lists` - List index and list creation
//! - `GET /lists/new` - New list form
//! - `GET /lists/{id}`, `POST /lists/{id}` - Show and rename a list
//! - `GET /lists/{id}/edit` - Edit list form
//! - `POST /lists/{id}/destroy` - Delete a list
//! - `POST /lists/{id}/todos` - Add a todo
//! - `POST /lists/{id}/todos/{todo_id}` - Mark a todo complete or incomplete
//! - `POST /lists/{id}/complete_all` - Complete every todo in a list
//! - `POST /lists/{id}/todos/{todo_id}/destroy` - Delete a todo
//! - `GET /health` - Health check endpoint
//!
//! # Sessions
//!
//! Every route except `/health` runs behind [`session_middleware`], which
//! resolves the visitor's session from the `listkeeper_session` cookie or
//! starts a new one and sets the cookie on the response.
//!
//! # Views
//!
//! Pages are returned as JSON objects naming the view, carrying the flash
//! messages consumed by this render, plus the view's data. Form submissions
//! answer with `303 See Other` on success and re-render the form with
//! `422 Unprocessable Entity` on validation failure.
//!
//! # Scripted Requests
//!
//! Requests carrying `X-Requested-With: XMLHttpRequest` get plain responses
//! from the delete endpoints instead of redirects.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{ListError, ServerError};
use crate::presenter::{present_list, present_lists, ListDetail, ListSummary};
use crate::session::{Flash, SessionError, SessionState, SessionStore};
use crate::validation::{validate_list_name, validate_todo_text};

// ============================================================================
// Constants
// ============================================================================

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "listkeeper_session";

/// Header set by scripted (non-navigation) requests.
const HEADER_REQUESTED_WITH: &str = "x-requested-with";

/// Value of [`HEADER_REQUESTED_WITH`] that marks a scripted request.
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

const LISTS_PATH: &str = "/lists";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Per-visitor sessions.
    pub sessions: Arc<SessionStore>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates a new application state with a session store sized by the
    /// given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let sessions = SessionStore::new(config.session_store_config());
        Self::with_sessions(config, Arc::new(sessions))
    }

    /// Creates application state around an existing session store.
    #[must_use]
    pub fn with_sessions(config: Config, sessions: Arc<SessionStore>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
///
/// # Example
///
/// ```rust,no_run
/// use listkeeper_server::routes::{create_router, AppState};
/// use listkeeper_server::config::Config;
///
/// let config = Config::from_env().expect("failed to load config");
/// let state = AppState::new(config);
/// let router = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/lists", get(get_lists).post(post_lists))
        .route("/lists/new", get(get_new_list))
        .route("/lists/{id}", get(get_list).post(post_list))
        .route("/lists/{id}/edit", get(get_edit_list))
        .route("/lists/{id}/destroy", post(post_destroy_list))
        .route("/lists/{id}/todos", post(post_todos))
        .route("/lists/{id}/todos/{todo_id}", post(post_todo))
        .route("/lists/{id}/complete_all", post(post_complete_all))
        .route("/lists/{id}/todos/{todo_id}/destroy", post(post_destroy_todo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Error Responses
// ============================================================================

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            // The session vanished mid-request; the next request starts a new one.
            Self::Session(SessionError::NotFound) => {
                debug!("Session expired during request");
                Redirect::to(LISTS_PATH).into_response()
            }
            Self::Session(SessionError::AtCapacity { max_capacity }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(
                    ErrorResponse::new(format!(
                        "server is at capacity ({max_capacity} sessions)"
                    ))
                    .with_code("session_capacity"),
                ),
            )
                .into_response(),
            other => {
                error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("internal server error").with_code("internal")),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// The current visitor's session token, inserted by [`session_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Resolves the visitor's session before the handler runs.
///
/// A missing, unknown, or expired cookie starts a fresh session, and the new
/// token is returned to the browser in a `Set-Cookie` header.
async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let existing = session_cookie(request.headers()).filter(|token| state.sessions.contains(token));

    let (token, is_new) = match existing {
        Some(token) => (token, false),
        None => {
            let token = state.sessions.create_session()?;
            debug!("Started new visitor session");
            (token, true)
        }
    };

    request
        .extensions_mut()
        .insert(SessionToken(token.clone()));

    let mut response = next.run(request).await;

    if is_new {
        let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "Session cookie is not a valid header value"),
        }
    }

    Ok(response)
}

/// Extracts the session token from the request's `Cookie` headers.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Runs `f` against the visitor's session.
fn with_session<R>(
    state: &AppState,
    token: &SessionToken,
    f: impl FnOnce(&mut SessionState) -> R,
) -> Result<R, ServerError> {
    Ok(state.sessions.with_session(&token.0, f)?)
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns `true` if the request was issued by a script rather than by
/// browser navigation.
fn is_scripted(headers: &HeaderMap) -> bool {
    headers
        .get(HEADER_REQUESTED_WITH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == XML_HTTP_REQUEST)
}

/// Parses an id path segment. Anything unparsable maps to `0`, which no
/// entity ever has, so it surfaces as not found.
fn parse_id(segment: &str) -> u64 {
    segment.trim().parse().unwrap_or(0)
}

fn list_path(id: u64) -> String {
    format!("{LISTS_PATH}/{id}")
}

/// Flashes `err` and redirects to the closest page that still exists.
fn redirect_with_error(session: &mut SessionState, err: ListError) -> Response {
    session.flash_error(err.to_string());
    match err {
        ListError::TodoNotFound { list_id, .. } => Redirect::to(&list_path(list_id)).into_response(),
        _ => Redirect::to(LISTS_PATH).into_response(),
    }
}

/// A rendered page.
#[derive(Debug, Serialize)]
struct Page<T> {
    view: &'static str,
    flash: Flash,
    #[serde(flatten)]
    data: T,
}

/// Renders `view`, consuming the session's pending flash messages.
fn render<T: Serialize>(
    session: &mut SessionState,
    status: StatusCode,
    view: &'static str,
    data: T,
) -> Response {
    let page = Page {
        view,
        flash: session.take_flash(),
        data,
    };
    (status, Json(page)).into_response()
}

#[derive(Debug, Serialize)]
struct ListsData {
    lists: Vec<ListSummary>,
}

#[derive(Debug, Serialize)]
struct NewListData {
    #[serde(skip_serializing_if = "Option::is_none")]
    list_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListData {
    list: ListDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    todo: Option<String>,
}

#[derive(Debug, Serialize)]
struct EditListData {
    list: ListSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    list_name: Option<String>,
}

/// Form body for creating or renaming a list.
#[derive(Debug, Deserialize)]
pub struct ListNameForm {
    #[serde(default)]
    pub list_name: String,
}

/// Form body for adding a todo.
#[derive(Debug, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub todo: String,
}

/// Form body for marking a todo.
#[derive(Debug, Deserialize)]
pub struct CompletedForm {
    #[serde(default)]
    pub completed: String,
}

// ============================================================================
// Lists
// ============================================================================

/// GET / - Redirects to the list index.
async fn get_root() -> Redirect {
    Redirect::to(LISTS_PATH)
}

/// GET /lists - Shows every list, incomplete lists first.
async fn get_lists(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<Response, ServerError> {
    with_session(&state, &token, |session| {
        let lists = present_lists(session.lists.lists());
        render(session, StatusCode::OK, "lists", ListsData { lists })
    })
}

/// GET /lists/new - Shows the new list form.
async fn get_new_list(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<Response, ServerError> {
    with_session(&state, &token, |session| {
        render(session, StatusCode::OK, "new_list", NewListData { list_name: None })
    })
}

/// POST /lists - Creates a list.
///
/// # Responses
///
/// - `303 See Other` to `/lists` on success
/// - `422 Unprocessable Entity` with the `new_list` view on invalid input
async fn post_lists(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<ListNameForm>,
) -> Result<Response, ServerError> {
    let name = form.list_name.trim().to_string();

    with_session(&state, &token, |session| {
        if let Err(err) = validate_list_name(&name, session.lists.lists()) {
            debug!(error = %err, "Rejected list name");
            session.flash_error(err.to_string());
            return render(
                session,
                StatusCode::UNPROCESSABLE_ENTITY,
                "new_list",
                NewListData {
                    list_name: Some(name),
                },
            );
        }

        let id = session.lists.create_list(name).id;
        info!(list_id = id, "List created");
        session.flash_success("This list has been created.");
        Redirect::to(LISTS_PATH).into_response()
    })
}

/// GET /lists/{id} - Shows a list with its todos, undone todos first.
async fn get_list(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = parse_id(&id);

    with_session(&state, &token, |session| {
        match session.lists.find_list(id).map(present_list) {
            Ok(list) => render(session, StatusCode::OK, "list", ListData { list, todo: None }),
            Err(err) => redirect_with_error(session, err),
        }
    })
}

/// GET /lists/{id}/edit - Shows the rename form for a list.
async fn get_edit_list(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = parse_id(&id);

    with_session(&state, &token, |session| {
        match session.lists.find_list(id).map(ListSummary::from) {
            Ok(list) => render(
                session,
                StatusCode::OK,
                "edit_list",
                EditListData {
                    list,
                    list_name: None,
                },
            ),
            Err(err) => redirect_with_error(session, err),
        }
    })
}

/// POST /lists/{id} - Renames a list.
///
/// The new name is checked for uniqueness against every list, including the
/// one being renamed.
///
/// # Responses
///
/// - `303 See Other` to `/lists/{id}` on success
/// - `303 See Other` to `/lists` if the list does not exist
/// - `422 Unprocessable Entity` with the `edit_list` view on invalid input
async fn post_list(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
    Form(form): Form<ListNameForm>,
) -> Result<Response, ServerError> {
    let id = parse_id(&id);
    let name = form.list_name.trim().to_string();

    with_session(&state, &token, |session| {
        let list = match session.lists.find_list(id).map(ListSummary::from) {
            Ok(list) => list,
            Err(err) => return redirect_with_error(session, err),
        };

        if let Err(err) = validate_list_name(&name, session.lists.lists()) {
            debug!(list_id = id, error = %err, "Rejected list rename");
            session.flash_error(err.to_string());
            return render(
                session,
                StatusCode::UNPROCESSABLE_ENTITY,
                "edit_list",
                EditListData {
                    list,
                    list_name: Some(name),
                },
            );
        }

        if let Err(err) = session.lists.rename_list(id, name) {
            return redirect_with_error(session, err);
        }

        info!(list_id = id, "List renamed");
        session.flash_success("This list has been updated.");
        Redirect::to(&list_path(id)).into_response()
    })
}

/// POST /lists/{id}/destroy - Deletes a list.
///
/// Deleting a list that does not exist still succeeds.
///
/// # Responses
///
/// - `200 OK` with body `/lists` for scripted requests
/// - `303 See Other` to `/lists` otherwise
async fn post_destroy_list(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = parse_id(&id);

    with_session(&state, &token, |session| {
        if session.lists.delete_list(id).is_some() {
            info!(list_id = id, "List deleted");
        }
        session.flash_success("The list has been deleted.");

        if is_scripted(&headers) {
            (StatusCode::OK, LISTS_PATH).into_response()
        } else {
            Redirect::to(LISTS_PATH).into_response()
        }
    })
}

// ============================================================================
// Todos
// ============================================================================

/// POST /lists/{id}/todos - Adds a todo to a list.
///
/// # Responses
///
/// - `303 See Other` to `/lists/{id}` on success
/// - `303 See Other` to `/lists` if the list does not exist
/// - `422 Unprocessable Entity` with the `list` view on invalid input
async fn post_todos(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Response, ServerError> {
    let list_id = parse_id(&id);
    let text = form.todo.trim().to_string();

    with_session(&state, &token, |session| {
        let list = match session.lists.find_list(list_id).map(present_list) {
            Ok(list) => list,
            Err(err) => return redirect_with_error(session, err),
        };

        if let Err(err) = validate_todo_text(&text) {
            debug!(list_id, error = %err, "Rejected todo");
            session.flash_error(err.to_string());
            return render(
                session,
                StatusCode::UNPROCESSABLE_ENTITY,
                "list",
                ListData {
                    list,
                    todo: Some(text),
                },
            );
        }

        match session.lists.add_todo(list_id, text) {
            Ok(todo) => {
                info!(list_id, todo_id = todo.id, "Todo added");
                session.flash_success("The todo was added.");
                Redirect::to(&list_path(list_id)).into_response()
            }
            Err(err) => redirect_with_error(session, err),
        }
    })
}

/// POST /lists/{id}/todos/{todo_id} - Marks a todo complete or incomplete.
///
/// The todo is completed when the form's `completed` field is exactly
/// `"true"`, and marked incomplete otherwise.
async fn post_todo(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path((id, todo_id)): Path<(String, String)>,
    Form(form): Form<CompletedForm>,
) -> Result<Response, ServerError> {
    let list_id = parse_id(&id);
    let todo_id = parse_id(&todo_id);
    let completed = form.completed == "true";

    with_session(&state, &token, |session| {
        match session.lists.set_todo_completed(list_id, todo_id, completed) {
            Ok(()) => {
                info!(list_id, todo_id, completed, "Todo updated");
                session.flash_success("The todo item has been updated.");
                Redirect::to(&list_path(list_id)).into_response()
            }
            Err(err) => redirect_with_error(session, err),
        }
    })
}

/// POST /lists/{id}/complete_all - Completes every todo in a list.
async fn post_complete_all(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let list_id = parse_id(&id);

    with_session(&state, &token, |session| {
        match session.lists.complete_all_todos(list_id) {
            Ok(()) => {
                info!(list_id, "All todos completed");
                session.flash_success("All todo items have been updated.");
                Redirect::to(&list_path(list_id)).into_response()
            }
            Err(err) => redirect_with_error(session, err),
        }
    })
}

/// POST /lists/{id}/todos/{todo_id}/destroy - Deletes a todo.
///
/// # Responses
///
/// - `204 No Content` for scripted requests
/// - `303 See Other` to `/lists/{id}` otherwise
/// - `303 See Other` to `/lists` if the list does not exist
async fn post_destroy_todo(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    headers: HeaderMap,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let list_id = parse_id(&id);
    let todo_id = parse_id(&todo_id);

    with_session(&state, &token, |session| {
        match session.lists.delete_todo(list_id, todo_id) {
            Ok(removed) => {
                if removed.is_some() {
                    info!(list_id, todo_id, "Todo deleted");
                }
                if is_scripted(&headers) {
                    StatusCode::NO_CONTENT.into_response()
                } else {
                    session.flash_success("The todo item has been deleted.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
            }
            Err(err) => redirect_with_error(session, err),
        }
    })
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Health check response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status.
    pub status: String,

    /// Number of sessions currently held, including expired ones not yet swept.
    pub sessions: usize,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// Does not create a session.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Tests
// ============================================================================
