mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeBackend, FakeSurface, SurfaceBehaviour};
use setlister::error::AuthError;
use setlister::login::{AuthHandshake, CompletionSignal};

fn handshake(backend: &Arc<FakeBackend>, surface: &Arc<FakeSurface>) -> AuthHandshake {
    AuthHandshake::new(backend.clone(), surface.clone(), Duration::from_secs(300))
}

fn reports(success: bool, message: Option<&str>) -> SurfaceBehaviour {
    SurfaceBehaviour::Complete {
        login_as: None,
        signal: CompletionSignal {
            success,
            message: message.map(str::to_string),
        },
        after: Duration::from_millis(10),
    }
}

#[tokio::test(start_paused = true)]
async fn existing_session_skips_the_login_window() {
    let backend = FakeBackend::new();
    backend.sign_in("Ana");
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Broken);
    let auth = handshake(&backend, &surface);

    let session = auth.ensure_session().await.unwrap();
    assert_eq!(session.display_name(), "Ana");
    assert_eq!(surface.opens(), 0);
    assert!(auth.session().is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn successful_login_is_confirmed_with_the_backend() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::logs_in_as(backend.clone(), "Ana");
    let auth = handshake(&backend, &surface);

    assert!(!auth.session().is_authenticated());
    let session = auth.ensure_session().await.unwrap();

    assert_eq!(session.display_name(), "Ana");
    assert_eq!(surface.opens(), 1);
    assert_eq!(backend.session_calls(), 2);
    assert_eq!(auth.session().current(), Some(session));
}

#[tokio::test(start_paused = true)]
async fn denial_is_reported_without_asking_again() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), reports(false, Some("access_denied")));
    let auth = handshake(&backend, &surface);

    let err = auth.ensure_session().await.unwrap_err();
    assert_eq!(err, AuthError::Denied("access_denied".into()));
    assert_eq!(backend.session_calls(), 1);
    assert!(!auth.session().is_authenticated());

    let surface = FakeSurface::new(backend.clone(), reports(false, None));
    let err = handshake(&backend, &surface).ensure_session().await.unwrap_err();
    assert_eq!(err, AuthError::Denied("authorization was not granted".into()));
}

#[tokio::test(start_paused = true)]
async fn success_without_a_backend_session_means_login_required() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), reports(true, None));
    let auth = handshake(&backend, &surface);

    assert_eq!(auth.ensure_session().await, Err(AuthError::LoginRequired));
    assert_eq!(backend.session_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn closed_window_is_abandoned() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Abandon);
    let auth = handshake(&backend, &surface);

    assert_eq!(auth.ensure_session().await, Err(AuthError::Abandoned));
}

#[tokio::test(start_paused = true)]
async fn window_left_open_times_out() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Hang);
    let auth = AuthHandshake::new(backend.clone(), surface.clone(), Duration::from_secs(30));

    let started = tokio::time::Instant::now();
    assert_eq!(auth.ensure_session().await, Err(AuthError::TimedOut));
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn surface_that_cannot_open_fails_fast() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Broken);
    let auth = handshake(&backend, &surface);

    assert!(matches!(auth.ensure_session().await, Err(AuthError::Surface(_))));
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_window() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::logs_in_as(backend.clone(), "Ana");
    let auth = handshake(&backend, &surface);

    let (first, second) = tokio::join!(auth.ensure_session(), auth.ensure_session());
    assert_eq!(first.unwrap().display_name(), "Ana");
    assert_eq!(second.unwrap().display_name(), "Ana");
    assert_eq!(surface.opens(), 1);

    auth.ensure_session().await.unwrap();
    assert_eq!(surface.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_attempt_is_not_remembered() {
    let backend = FakeBackend::new();
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Abandon);
    let auth = handshake(&backend, &surface);

    assert_eq!(auth.ensure_session().await, Err(AuthError::Abandoned));

    surface.set_behaviour(SurfaceBehaviour::Complete {
        login_as: Some("Ana".into()),
        signal: CompletionSignal {
            success: true,
            message: None,
        },
        after: Duration::from_millis(10),
    });
    assert!(auth.ensure_session().await.is_ok());
    assert_eq!(surface.opens(), 2);
}

#[tokio::test(start_paused = true)]
async fn logout_twice_is_harmless() {
    let backend = FakeBackend::new();
    backend.sign_in("Ana");
    let surface = FakeSurface::new(backend.clone(), SurfaceBehaviour::Abandon);
    let auth = handshake(&backend, &surface);
    auth.ensure_session().await.unwrap();

    auth.logout().await;
    auth.logout().await;

    assert!(!auth.session().is_authenticated());
    assert_eq!(backend.logout_calls(), 2);
    assert_eq!(auth.ensure_session().await, Err(AuthError::Abandoned));
}
