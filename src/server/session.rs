//! Per-visitor sessions identified by the `board_session` cookie.

use super::state::GuardedSessionManager;
use crate::config::DEFAULT_MAX_SESSIONS;
use crate::edit_gate::{EditModeGate, EditSecret};
use crate::panel::{PanelConfig, PanelController};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

pub const COOKIE_SESSION_KEY: &str = "board_session";
const SESSION_ID_LENGTH: usize = 32;
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct Session {
    pub id: String,
    gate: Mutex<EditModeGate>,
    pub panel: PanelController,
    last_seen: Mutex<Instant>,
}

impl Session {
    fn new(id: String, secret: Option<Arc<EditSecret>>, panel_config: PanelConfig) -> Self {
        Self {
            id,
            gate: Mutex::new(EditModeGate::new(secret)),
            panel: PanelController::new(panel_config),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn gate(&self) -> MutexGuard<'_, EditModeGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.gate().is_edit_mode()
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    edit_secret: Option<Arc<EditSecret>>,
    panel_config: PanelConfig,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(edit_secret: Option<Arc<EditSecret>>, panel_config: PanelConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            edit_secret,
            panel_config,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Whether toggling edit mode can ever succeed.
    pub fn is_edit_enabled(&self) -> bool {
        self.edit_secret.is_some()
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(
            generate_session_id(),
            self.edit_secret.clone(),
            self.panel_config.clone(),
        ));
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.len() >= self.max_sessions {
            let stalest = sessions
                .iter()
                .max_by_key(|(_, session)| session.idle_for())
                .map(|(id, _)| id.clone());
            if let Some(evicted) = stalest.and_then(|id| sessions.remove(&id)) {
                evicted.panel.close();
                debug!("Session limit reached, evicted {}", evicted.id);
            }
        }
        sessions.insert(session.id.clone(), session.clone());
        debug!("Created session {}", session.id);
        session
    }

    /// Looks a session up and marks it as seen.
    pub fn touch(&self, id: &str) -> Option<Arc<Session>> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;
        session.touch();
        Some(session)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Drops the session and closes its panel, cancelling any hide timer.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        match removed {
            Some(session) => {
                session.panel.close();
                debug!("Removed session {}", id);
                true
            }
            None => false,
        }
    }

    /// Removes every session idle for longer than `max_idle`.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.idle_for() <= max_idle;
            if !keep {
                session.panel.close();
            }
            keep
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prunes idle sessions every [`PRUNE_INTERVAL`] until the manager is dropped.
pub fn spawn_session_pruner(sessions: &Arc<SessionManager>, max_idle: Duration) -> JoinHandle<()> {
    let sessions = Arc::downgrade(sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };
            let pruned = sessions.prune_idle(max_idle);
            if pruned > 0 {
                info!("Pruned {} idle sessions, {} left", pruned, sessions.len());
            }
        }
    })
}

pub fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_KEY, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_KEY, ""))
        .path("/")
        .http_only(true)
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build()
}

/// Resolves the caller's session, creating one when the cookie is missing or
/// unknown, and exposes it to handlers as [`CurrentSession`].
pub async fn attach_session(
    State(sessions): State<GuardedSessionManager>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(COOKIE_SESSION_KEY)
        .and_then(|cookie| sessions.touch(cookie.value()));
    let (session, created) = match existing {
        Some(session) => (session, false),
        None => (sessions.create(), true),
    };

    request
        .extensions_mut()
        .insert(CurrentSession(session.clone()));
    let response = next.run(request).await;

    // A session torn down by the handler itself must not be handed out.
    if created && sessions.contains(&session.id) {
        return (jar.add(session_cookie(&session.id)), response).into_response();
    }
    response
}

/// Exposes the caller's existing session, if any, without creating one.
pub async fn resolve_session(
    State(sessions): State<GuardedSessionManager>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session) = jar
        .get(COOKIE_SESSION_KEY)
        .and_then(|cookie| sessions.touch(cookie.value()))
    {
        request.extensions_mut().insert(CurrentSession(session));
    }
    next.run(request).await
}

#[derive(Debug)]
pub enum SessionExtractionError {
    Missing,
    EditModeRequired,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::Missing => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            SessionExtractionError::EditModeRequired => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Edit mode required" })),
            )
                .into_response(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CurrentSession(pub Arc<Session>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(SessionExtractionError::Missing)
    }
}

/// A session currently in edit mode. Board mutations require it.
///
/// A caller without a session is treated like one not in edit mode.
#[derive(Clone, Debug)]
pub struct EditModeSession(pub Arc<Session>);

impl<S: Send + Sync> FromRequestParts<S> for EditModeSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(CurrentSession(session)) = parts.extensions.get::<CurrentSession>().cloned()
        else {
            return Err(SessionExtractionError::EditModeRequired);
        };
        if !session.is_edit_mode() {
            debug!("Session {} is not in edit mode", session.id);
            return Err(SessionExtractionError::EditModeRequired);
        }
        Ok(EditModeSession(session))
    }
}
