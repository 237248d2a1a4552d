use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::login::{AuthSurface, CompletionSender, CompletionSignal};

const COMPLETE_PATH: &str = "/auth/complete";

const DONE_PAGE: &str = "<html><body>\
    <p>Login finished. You can close this window and return to setlister.</p>\
    <script>window.close();</script>\
    </body></html>";

type Opener = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Runs the login in the system browser. The backend's login page is told
/// to redirect to a short-lived listener on 127.0.0.1, which turns that
/// redirect into a [`CompletionSignal`].
pub struct BrowserSurface {
    login_url: Url,
    lifetime: Duration,
    opener: Opener,
}

impl BrowserSurface {
    pub fn new(login_url: Url, lifetime: Duration) -> Self {
        Self::with_opener(login_url, lifetime, |url| open::that(url))
    }

    pub fn with_opener<F>(login_url: Url, lifetime: Duration, opener: F) -> Self
    where
        F: Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    {
        Self {
            login_url,
            lifetime,
            opener: Arc::new(opener),
        }
    }
}

#[derive(Clone)]
struct CallbackState {
    completion: Arc<Mutex<Option<CompletionSender>>>,
    done: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

/// Reads the redirect's query. Anything other than an explicit true
/// `success` is a failure, so a malformed redirect ends the login at once.
fn read_signal(params: &HashMap<String, String>) -> CompletionSignal {
    let success = params
        .get("success")
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"));
    let message = params
        .get("message")
        .or_else(|| params.get("error"))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    let message = match (success, message) {
        (false, None) if !params.contains_key("success") => {
            Some("malformed authorization callback".to_string())
        }
        (_, message) => message,
    };
    CompletionSignal { success, message }
}

async fn complete(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let signal = read_signal(&params);
    debug!(success = signal.success, "authorization callback received");
    if let Some(tx) = state.completion.lock().ok().and_then(|mut c| c.take()) {
        tx.send(signal).ok();
    }
    if let Some(done) = state.done.lock().ok().and_then(|mut d| d.take()) {
        done.send(()).ok();
    }
    Html(DONE_PAGE)
}

#[async_trait]
impl AuthSurface for BrowserSurface {
    async fn open(&self, completion: CompletionSender) -> Result<(), AuthError> {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .map_err(|e| AuthError::Surface(format!("failed to bind callback listener: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::Surface(e.to_string()))?;

        let mut url = self.login_url.clone();
        url.query_pairs_mut()
            .append_pair("return_to", &format!("http://{addr}{COMPLETE_PATH}"));

        let (done_tx, done_rx) = oneshot::channel();
        let state = CallbackState {
            completion: Arc::new(Mutex::new(Some(completion))),
            done: Arc::new(Mutex::new(Some(done_tx))),
        };
        let app = Router::new()
            .route(COMPLETE_PATH, get(complete))
            .with_state(state);

        let lifetime = self.lifetime;
        tokio::spawn(async move {
            let shutdown = async move {
                if tokio::time::timeout(lifetime, done_rx).await.is_err() {
                    info!("authorization callback listener expired");
                }
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(error = %e, "authorization callback listener failed");
            }
        });

        info!(%addr, "opening login page in browser");
        (self.opener)(url.as_str())
            .map_err(|e| AuthError::Surface(format!("failed to open browser: {e}")))
    }
}
