#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use setlister::backend::*;
use setlister::component::{Component, Controller};
use setlister::error::{AuthError, BackendError};
use setlister::login::{AuthSurface, CompletionSender, CompletionSignal};

#[derive(Default)]
struct State {
    artists: Vec<ArtistCandidate>,
    search_calls: Vec<(String, Instant)>,
    search_delays: VecDeque<Duration>,
    search_error: Option<BackendError>,
    setlists: Vec<SetlistSummary>,
    setlist_calls: Vec<(String, FilterCriteria, u32)>,
    details: HashMap<String, SetlistDetails>,
    signed_in: Option<String>,
    session_calls: usize,
    logout_calls: usize,
    playlist_requests: Vec<PlaylistRequest>,
    playlist_result: Option<Result<PlaylistCreated, BackendError>>,
    playlist_delay: Option<Duration>,
}

/// In-memory backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_artists(self: Arc<Self>, artists: Vec<ArtistCandidate>) -> Arc<Self> {
        self.state.lock().unwrap().artists = artists;
        self
    }

    pub fn with_setlists(self: Arc<Self>, setlists: Vec<SetlistSummary>) -> Arc<Self> {
        self.state.lock().unwrap().setlists = setlists;
        self
    }

    pub fn with_details(self: Arc<Self>, id: &str, songs: Vec<SongEntry>) -> Arc<Self> {
        self.state.lock().unwrap().details.insert(
            id.to_string(),
            SetlistDetails {
                songs,
                artist_image: None,
            },
        );
        self
    }

    pub fn delay_next_search(&self, delay: Duration) {
        self.state.lock().unwrap().search_delays.push_back(delay);
    }

    pub fn fail_searches(&self, error: BackendError) {
        self.state.lock().unwrap().search_error = Some(error);
    }

    pub fn sign_in(&self, name: &str) {
        self.state.lock().unwrap().signed_in = Some(name.to_string());
    }

    pub fn playlist_result(&self, result: Result<PlaylistCreated, BackendError>) {
        self.state.lock().unwrap().playlist_result = Some(result);
    }

    pub fn delay_playlists(&self, delay: Duration) {
        self.state.lock().unwrap().playlist_delay = Some(delay);
    }

    pub fn search_calls(&self) -> Vec<(String, Instant)> {
        self.state.lock().unwrap().search_calls.clone()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_calls().into_iter().map(|(q, _)| q).collect()
    }

    pub fn setlist_calls(&self) -> Vec<(String, FilterCriteria, u32)> {
        self.state.lock().unwrap().setlist_calls.clone()
    }

    pub fn session_calls(&self) -> usize {
        self.state.lock().unwrap().session_calls
    }

    pub fn logout_calls(&self) -> usize {
        self.state.lock().unwrap().logout_calls
    }

    pub fn playlist_requests(&self) -> Vec<PlaylistRequest> {
        self.state.lock().unwrap().playlist_requests.clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistCandidate>, BackendError> {
        let (delay, outcome) = {
            let mut state = self.state.lock().unwrap();
            state.search_calls.push((query.to_string(), Instant::now()));
            let delay = state.search_delays.pop_front();
            let outcome = match &state.search_error {
                Some(e) => Err(e.clone()),
                None => Ok(state
                    .artists
                    .iter()
                    .filter(|a| a.name.to_lowercase().contains(&query.to_lowercase()))
                    .cloned()
                    .collect()),
            };
            (delay, outcome)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn artist_setlists(
        &self,
        artist_id: &str,
        filters: &FilterCriteria,
        pages: u32,
    ) -> Result<Vec<SetlistSummary>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state
            .setlist_calls
            .push((artist_id.to_string(), filters.clone(), pages));
        Ok(state.setlists.clone())
    }

    async fn setlist_details(&self, setlist_id: &str) -> Result<SetlistDetails, BackendError> {
        self.state
            .lock()
            .unwrap()
            .details
            .get(setlist_id)
            .cloned()
            .ok_or_else(|| BackendError::Rejected(format!("Resource not found: {setlist_id}")))
    }

    async fn session(&self) -> Result<SessionInfo, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.session_calls += 1;
        Ok(match &state.signed_in {
            Some(name) => SessionInfo::signed_in("user-1", name),
            None => SessionInfo::anonymous(),
        })
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.logout_calls += 1;
        state.signed_in = None;
        Ok(())
    }

    async fn create_playlist(
        &self,
        request: &PlaylistRequest,
    ) -> Result<PlaylistCreated, BackendError> {
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            state.playlist_requests.push(request.clone());
            let result = state.playlist_result.clone().unwrap_or_else(|| {
                Ok(PlaylistCreated {
                    playlist_url: format!("https://open.spotify.com/playlist/{}", request.setlist_id),
                    songs_count: Some(request.selected.len() as u32),
                })
            });
            (state.playlist_delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[derive(Clone)]
pub enum SurfaceBehaviour {
    /// Optionally log the user in at the backend, then report `signal`.
    Complete {
        login_as: Option<String>,
        signal: CompletionSignal,
        after: Duration,
    },
    /// The user closes the window.
    Abandon,
    /// The window stays open and never reports.
    Hang,
    Broken,
}

pub struct FakeSurface {
    backend: Arc<FakeBackend>,
    behaviour: Mutex<SurfaceBehaviour>,
    opens: AtomicUsize,
    held: Mutex<Vec<CompletionSender>>,
}

impl FakeSurface {
    pub fn new(backend: Arc<FakeBackend>, behaviour: SurfaceBehaviour) -> Arc<Self> {
        Arc::new(Self {
            backend,
            behaviour: Mutex::new(behaviour),
            opens: AtomicUsize::new(0),
            held: Mutex::new(Vec::new()),
        })
    }

    pub fn logs_in_as(backend: Arc<FakeBackend>, name: &str) -> Arc<Self> {
        Self::new(
            backend,
            SurfaceBehaviour::Complete {
                login_as: Some(name.to_string()),
                signal: CompletionSignal {
                    success: true,
                    message: None,
                },
                after: Duration::from_millis(50),
            },
        )
    }

    pub fn set_behaviour(&self, behaviour: SurfaceBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthSurface for FakeSurface {
    async fn open(&self, completion: CompletionSender) -> Result<(), AuthError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let behaviour = self.behaviour.lock().unwrap().clone();
        match behaviour {
            SurfaceBehaviour::Complete {
                login_as,
                signal,
                after,
            } => {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if let Some(name) = login_as {
                        backend.sign_in(&name);
                    }
                    completion.send(signal).ok();
                });
            }
            SurfaceBehaviour::Abandon => drop(completion),
            SurfaceBehaviour::Hang => self.held.lock().unwrap().push(completion),
            SurfaceBehaviour::Broken => {
                return Err(AuthError::Surface("no browser".to_string()));
            }
        }
        Ok(())
    }
}

pub fn artist(id: &str, name: &str) -> ArtistCandidate {
    ArtistCandidate {
        id: id.to_string(),
        name: name.to_string(),
        disambiguation: None,
    }
}

pub fn setlist(id: &str, date: &str, venue: &str) -> SetlistSummary {
    SetlistSummary {
        id: id.to_string(),
        date: date.to_string(),
        venue: venue.to_string(),
        city: "London".to_string(),
        country: "United Kingdom".to_string(),
        tour: Some("In Rainbows".to_string()),
        display_title: None,
        songs_count: Some(2),
    }
}

pub fn song(position: u32, cover: bool, encore: bool, track_ref: Option<&str>) -> SongEntry {
    SongEntry {
        position,
        set_number: 1,
        name: format!("Song {position}"),
        is_cover: cover,
        original_artist: cover.then(|| "Someone Else".to_string()),
        is_encore: encore,
        encore: encore.then(|| "1".to_string()),
        album: None,
        album_art: None,
        info: None,
        track_ref: track_ref.map(str::to_string),
    }
}

/// Handles messages until `done` holds. Fails instead of hanging.
pub async fn run_until<C: Component>(controller: &mut Controller<C>, mut done: impl FnMut(&C) -> bool) {
    tokio::time::timeout(Duration::from_secs(3600), async {
        while !done(controller.model()) {
            controller.next().await;
        }
    })
    .await
    .expect("condition never reached");
}

/// Lets timers and spawned work run to completion, handling everything
/// that lands in the inbox along the way.
pub async fn settle<C: Component>(controller: &mut Controller<C>) {
    for _ in 0..8 {
        tokio::time::sleep(Duration::from_secs(10)).await;
        controller.process_pending();
    }
}
