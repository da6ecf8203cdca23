//! HTTP server and session table.
//!
//! - `GET /` - start a session and redirect to its page
//! - `GET /session/:id` - current page of a session
//! - `POST /session/:id` - form-encoded event, answers with the next page
//! - `POST /session/:id/end` - end a session
//! - `POST /api/sessions` - start a session, JSON view
//! - `POST /api/sessions/:id/events` - JSON event, JSON view
//! - `DELETE /api/sessions/:id` - end a session
//! - `GET /api/health` - health check

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dashboard::client::PopulationApi;
use crate::dashboard::event::Event;
use crate::dashboard::html::{render_ended, render_page, STYLESHEET};
use crate::dashboard::pages::render;
use crate::dashboard::session::SessionState;
use crate::dashboard::view::{Block, View};

type SessionSlot = Arc<tokio::sync::Mutex<SessionState>>;

/// Sessions untouched for this long are dropped.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    state: SessionSlot,
    last_seen: Instant,
}

/// Application state shared across handlers.
pub struct AppState<A> {
    pub api: A,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("unknown session: {0}")]
    NotFound(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, self.to_string()).into_response()
    }
}

impl<A: PopulationApi> AppState<A> {
    pub fn new(api: A) -> Self {
        Self::with_idle_timeout(api, DEFAULT_SESSION_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(api: A, idle_timeout: Duration) -> Self {
        Self {
            api,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session. Idle sessions are reclaimed first.
    pub fn create_session(&self) -> Uuid {
        self.expire_idle();
        let id = Uuid::new_v4();
        self.table().insert(
            id,
            SessionEntry {
                state: Arc::default(),
                last_seen: Instant::now(),
            },
        );
        info!(session = %id, "session started");
        id
    }

    /// Drop sessions idle for at least the timeout. A session with an event
    /// in flight is kept. Returns how many were dropped.
    pub fn expire_idle(&self) -> usize {
        let now = Instant::now();
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, entry| {
            Arc::strong_count(&entry.state) > 1
                || now.duration_since(entry.last_seen) < self.idle_timeout
        });
        let expired = before - table.len();
        if expired > 0 {
            info!(expired, remaining = table.len(), "idle sessions expired");
        }
        expired
    }

    /// Returns false when the session did not exist.
    pub fn end_session(&self, id: &str) -> bool {
        let removed = Uuid::parse_str(id)
            .ok()
            .and_then(|id| self.table().remove(&id))
            .is_some();
        if removed {
            info!(session = id, "session ended");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.table().len()
    }

    fn slot(&self, id: &str) -> Result<SessionSlot, SessionError> {
        let uuid = Uuid::parse_str(id).map_err(|_| SessionError::NotFound(id.to_string()))?;
        let mut table = self.table();
        let entry = table
            .get_mut(&uuid)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.state.clone())
    }

    /// Apply one event to a session. Events of one session run one at a time.
    pub async fn handle(&self, id: &str, event: Event) -> Result<View, SessionError> {
        let slot = self.slot(id)?;
        let mut state = slot.lock().await;
        debug!(session = id, ?event, "handling event");
        let (next, view) = render(&self.api, state.clone(), event).await;
        *state = next;
        Ok(view)
    }
}

/// Server configuration.
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub open_browser: bool,
    pub session_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8501,
            open_browser: true,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}

/// Routes over a shared state. CORS is permissive so the JSON API can be
/// driven from other origins.
pub fn router<A: PopulationApi + 'static>(state: Arc<AppState<A>>) -> Router {
    Router::new()
        .route("/", get(index_handler::<A>))
        .route("/static/style.css", get(style_handler))
        .route("/session/:id", get(page_handler::<A>).post(event_form_handler::<A>))
        .route("/session/:id/end", post(end_page_handler::<A>))
        .route("/api/health", get(health_handler))
        .route("/api/sessions", post(create_session_handler::<A>))
        .route("/api/sessions/:id", delete(end_session_handler::<A>))
        .route("/api/sessions/:id/events", post(event_json_handler::<A>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn run_server<A: PopulationApi + 'static>(api: A, config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::with_idle_timeout(api, config.session_idle_timeout));
    let app = router(state);
    let addr = SocketAddr::new(config.bind, config.port);

    if config.open_browser {
        // Use localhost for browser URL even though we may bind to 0.0.0.0
        let url = format!("http://127.0.0.1:{}", config.port);
        info!(%url, "opening browser");
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "dashboard listening, press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// --- HTML surface ---

async fn index_handler<A: PopulationApi + 'static>(State(state): State<Arc<AppState<A>>>) -> Redirect {
    let id = state.create_session();
    Redirect::to(&format!("/session/{id}"))
}

async fn style_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

async fn page_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
) -> Response {
    match state.handle(&id, Event::Refresh).await {
        Ok(view) => Html(render_page(&view, &id)).into_response(),
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// POST /session/:id - fields arrive as repeated `name=value` pairs.
async fn event_form_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let (event, problem) = match Event::from_form(&fields) {
        Ok(event) => (event, None),
        Err(e) => {
            warn!(session = %id, error = %e, "rejected form submission");
            (Event::Refresh, Some(e))
        }
    };
    match state.handle(&id, event).await {
        Ok(mut view) => {
            if let Some(e) = problem {
                view.blocks.insert(0, Block::error(e.to_string()));
            }
            Html(render_page(&view, &id)).into_response()
        }
        Err(_) => Redirect::to("/").into_response(),
    }
}

async fn end_page_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
) -> Html<String> {
    state.end_session(&id);
    Html(render_ended())
}

// --- JSON surface ---

/// GET /api/health - health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: String,
    view: View,
}

async fn create_session_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
) -> Result<Json<SessionResponse>, SessionError> {
    let id = state.create_session().to_string();
    let view = state.handle(&id, Event::Refresh).await?;
    Ok(Json(SessionResponse { session_id: id, view }))
}

async fn event_json_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
    Json(event): Json<Event>,
) -> Result<Json<View>, SessionError> {
    state.handle(&id, event).await.map(Json)
}

async fn end_session_handler<A: PopulationApi + 'static>(
    State(state): State<Arc<AppState<A>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, SessionError> {
    if state.end_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::pages::testing::{sample_rows, StubApi};
    use crate::dashboard::session::Page;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8501);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(config.open_browser);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_idle_sessions_reclaimed_on_create() {
        let state = AppState::with_idle_timeout(StubApi::failing(), Duration::ZERO);
        for _ in 0..1000 {
            state.create_session();
        }
        assert_eq!(state.session_count(), 1);
        assert_eq!(state.expire_idle(), 1);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_active_sessions_survive_expiry() {
        let api = StubApi::with_rows(sample_rows());
        let state = AppState::with_idle_timeout(api, Duration::from_secs(3600));
        let a = state.create_session().to_string();
        state.handle(&a, Event::Start).await.unwrap();
        state.create_session();
        assert_eq!(state.expire_idle(), 0);
        assert_eq!(state.session_count(), 2);
    }

    #[tokio::test]
    async fn test_session_in_use_is_kept() {
        let state = AppState::with_idle_timeout(StubApi::failing(), Duration::ZERO);
        let id = state.create_session().to_string();
        let slot = state.slot(&id).unwrap();
        let guard = slot.lock().await;
        assert_eq!(state.expire_idle(), 0);
        drop(guard);
        drop(slot);
        assert_eq!(state.expire_idle(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let state = AppState::new(StubApi::with_rows(sample_rows()));
        let a = state.create_session().to_string();
        let b = state.create_session().to_string();
        assert_eq!(state.session_count(), 2);

        state.handle(&a, Event::Start).await.unwrap();
        state.handle(&a, Event::Navigate { page: Page::Maps }).await.unwrap();

        let view_b = state.handle(&b, Event::Refresh).await.unwrap();
        assert_eq!(view_b.forms()[0].events(), ["start"]);

        let view_a = state.handle(&a, Event::Refresh).await.unwrap();
        assert!(view_a.forms().iter().any(|f| f.events() == ["show_maps"]));
    }

    #[tokio::test]
    async fn test_unknown_and_ended_sessions() {
        let state = AppState::new(StubApi::failing());
        assert_eq!(
            state.handle("not-a-uuid", Event::Refresh).await.unwrap_err(),
            SessionError::NotFound("not-a-uuid".to_string())
        );

        let id = state.create_session().to_string();
        assert!(state.end_session(&id));
        assert!(!state.end_session(&id));
        assert!(state.handle(&id, Event::Refresh).await.is_err());
        assert_eq!(state.session_count(), 0);
    }
}
