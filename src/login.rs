use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::AuthError;

pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    display_name: String,
}

impl Session {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Read access to the process-wide session. Only [`AuthHandshake`] writes it.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn current(&self) -> Option<Session> {
        self.inner.read().ok().and_then(|s| s.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn store(&self, session: Option<Session>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = session;
        }
    }
}

/// What the external login flow reports when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub success: bool,
    pub message: Option<String>,
}

pub type CompletionSender = oneshot::Sender<CompletionSignal>;

/// Something that can host the interactive login, typically a browser
/// window. It reports back through `completion` at most once; dropping the
/// sender means the user walked away.
#[async_trait]
pub trait AuthSurface: Send + Sync {
    async fn open(&self, completion: CompletionSender) -> Result<(), AuthError>;
}

type PendingLogin = Shared<BoxFuture<'static, Result<Session, AuthError>>>;

struct HandshakeInner {
    backend: Arc<dyn Backend>,
    surface: Arc<dyn AuthSurface>,
    session: SessionHandle,
    timeout: Duration,
    pending: Mutex<Option<PendingLogin>>,
}

/// Makes sure the backend holds a streaming login before a playlist is
/// created. Concurrent callers share one outstanding handshake.
#[derive(Clone)]
pub struct AuthHandshake {
    inner: Arc<HandshakeInner>,
}

impl AuthHandshake {
    pub fn new(backend: Arc<dyn Backend>, surface: Arc<dyn AuthSurface>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(HandshakeInner {
                backend,
                surface,
                session: SessionHandle::default(),
                timeout,
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> SessionHandle {
        self.inner.session.clone()
    }

    pub async fn ensure_session(&self) -> Result<Session, AuthError> {
        let login = {
            let mut pending = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match pending.as_ref() {
                Some(login) => {
                    debug!("joining handshake already in progress");
                    login.clone()
                }
                None => {
                    let login = run(self.inner.clone()).boxed().shared();
                    *pending = Some(login.clone());
                    login
                }
            }
        };

        let outcome = login.clone().await;

        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if pending.as_ref().is_some_and(|p| p.ptr_eq(&login)) {
            *pending = None;
        }
        outcome
    }

    /// Forgets the local session. Safe to call when already logged out.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.backend.logout().await {
            warn!(error = %e, "backend logout failed");
        }
        self.inner.session.store(None);
    }
}

async fn run(inner: Arc<HandshakeInner>) -> Result<Session, AuthError> {
    if let Some(name) = inner.backend.session().await?.display_name() {
        let session = Session { display_name: name };
        inner.session.store(Some(session.clone()));
        return Ok(session);
    }
    inner.session.store(None);

    let (tx, rx) = oneshot::channel();
    inner.surface.open(tx).await?;
    debug!("waiting for authorization to complete");

    let signal = match tokio::time::timeout(inner.timeout, rx).await {
        Ok(Ok(signal)) => signal,
        Ok(Err(_)) => {
            info!("authorization window closed without a result");
            return Err(AuthError::Abandoned);
        }
        Err(_) => {
            info!(timeout = ?inner.timeout, "authorization timed out");
            return Err(AuthError::TimedOut);
        }
    };

    if !signal.success {
        let reason = signal
            .message
            .unwrap_or_else(|| "authorization was not granted".to_string());
        info!(%reason, "authorization denied");
        return Err(AuthError::Denied(reason));
    }

    match inner.backend.session().await?.display_name() {
        Some(name) => {
            info!(user = %name, "authorized");
            let session = Session { display_name: name };
            inner.session.store(Some(session.clone()));
            Ok(session)
        }
        None => {
            warn!("authorization reported success but no session exists");
            Err(AuthError::LoginRequired)
        }
    }
}
