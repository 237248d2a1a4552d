use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{Backend, PlaylistCreated, PlaylistRequest, SelectedSong, SetlistSummary};
use crate::component::{Component, ComponentSender};
use crate::error::{AuthError, BackendError, ExportError};
use crate::login::AuthHandshake;

/// The setlist a playlist would be built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistContext {
    pub setlist_id: String,
    pub date: String,
    pub venue: String,
    pub city: String,
    pub country: String,
    pub tour: Option<String>,
}

impl From<&SetlistSummary> for PlaylistContext {
    fn from(setlist: &SetlistSummary) -> Self {
        Self {
            setlist_id: setlist.id.clone(),
            date: setlist.date.clone(),
            venue: setlist.venue.clone(),
            city: setlist.city.clone(),
            country: setlist.country.clone(),
            tour: setlist.tour.clone(),
        }
    }
}

impl PlaylistContext {
    pub fn request(&self, selected: Vec<SelectedSong>, public: bool) -> PlaylistRequest {
        PlaylistRequest {
            setlist_id: self.setlist_id.clone(),
            selected,
            date: self.date.clone(),
            venue: self.venue.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            tour: self.tour.clone(),
            public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    InProgress,
    Created(String),
    Failed(String),
}

/// What the export button currently offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportAction {
    Create,
    Busy,
    View(String),
    Retry,
}

pub struct PlaylistExport {
    backend: Arc<dyn Backend>,
    auth: AuthHandshake,
    context: Option<PlaylistContext>,
    public: bool,
    state: ExportState,
    ticket: u64,
}

pub struct ExportInit {
    pub backend: Arc<dyn Backend>,
    pub auth: AuthHandshake,
    pub public: bool,
}

#[derive(Debug)]
pub enum PlaylistMsg {
    SetContext(Option<PlaylistContext>),
    SetPublic(bool),
    Create(Vec<SelectedSong>),
    Finished {
        ticket: u64,
        result: Result<PlaylistCreated, ExportError>,
    },
    View,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistOutput {
    Created(String),
    Failed(String),
    Open(String),
    PublicChanged(bool),
}

impl Component for PlaylistExport {
    type Init = ExportInit;
    type Input = PlaylistMsg;
    type Output = PlaylistOutput;

    fn init(init: ExportInit, _sender: &ComponentSender<Self>) -> Self {
        Self {
            backend: init.backend,
            auth: init.auth,
            context: None,
            public: init.public,
            state: ExportState::Idle,
            ticket: 0,
        }
    }

    fn update(&mut self, msg: PlaylistMsg, sender: &ComponentSender<Self>) {
        match msg {
            PlaylistMsg::SetContext(context) => {
                // Same setlist again: keep the created playlist or the pending create.
                if context.is_some() && context == self.context {
                    return;
                }
                self.ticket += 1;
                self.context = context;
                self.state = ExportState::Idle;
            }
            PlaylistMsg::SetPublic(public) => {
                self.public = public;
                sender.output(PlaylistOutput::PublicChanged(public));
            }
            PlaylistMsg::Create(selected) => self.create(selected, sender),
            PlaylistMsg::Finished { ticket, result } => {
                if ticket != self.ticket {
                    debug!(ticket, current = self.ticket, "dropping playlist result for old setlist");
                    return;
                }
                match result {
                    Ok(created) => {
                        info!(url = %created.playlist_url, songs = ?created.songs_count, "playlist created");
                        self.state = ExportState::Created(created.playlist_url.clone());
                        sender.output(PlaylistOutput::Created(created.playlist_url));
                    }
                    Err(e) => {
                        log_failure(&e);
                        let message = e.user_message();
                        self.state = ExportState::Failed(message.clone());
                        sender.output(PlaylistOutput::Failed(message));
                    }
                }
            }
            PlaylistMsg::View => {
                if let ExportState::Created(url) = &self.state {
                    sender.output(PlaylistOutput::Open(url.clone()));
                }
            }
        }
    }
}

impl PlaylistExport {
    fn create(&mut self, selected: Vec<SelectedSong>, sender: &ComponentSender<Self>) {
        match self.state {
            ExportState::InProgress => {
                debug!("playlist creation already in progress");
                return;
            }
            ExportState::Created(_) => {
                debug!("playlist already created for this setlist");
                return;
            }
            ExportState::Idle | ExportState::Failed(_) => {}
        }
        let Some(context) = self.context.as_ref() else {
            debug!("no setlist to create a playlist from");
            return;
        };
        if selected.is_empty() {
            let message = ExportError::NothingSelected.user_message();
            self.state = ExportState::Failed(message.clone());
            sender.output(PlaylistOutput::Failed(message));
            return;
        }

        let request = context.request(selected, self.public);
        let backend = self.backend.clone();
        let auth = self.auth.clone();
        let ticket = self.ticket;
        self.state = ExportState::InProgress;

        sender.oneshot_command(async move {
            let result = provision(backend, auth, request).await;
            PlaylistMsg::Finished { ticket, result }
        });
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn action(&self) -> ExportAction {
        match &self.state {
            ExportState::Idle => ExportAction::Create,
            ExportState::InProgress => ExportAction::Busy,
            ExportState::Created(url) => ExportAction::View(url.clone()),
            ExportState::Failed(_) => ExportAction::Retry,
        }
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn context(&self) -> Option<&PlaylistContext> {
        self.context.as_ref()
    }
}

async fn provision(
    backend: Arc<dyn Backend>,
    auth: AuthHandshake,
    request: PlaylistRequest,
) -> Result<PlaylistCreated, ExportError> {
    auth.ensure_session().await?;
    Ok(backend.create_playlist(&request).await?)
}

fn log_failure(error: &ExportError) {
    match error {
        ExportError::Backend(e @ BackendError::Transport(_))
        | ExportError::Auth(AuthError::Backend(e @ BackendError::Transport(_))) => {
            warn!(error = %e, "network failure creating playlist");
        }
        ExportError::Backend(e) => warn!(error = %e, "backend refused playlist creation"),
        ExportError::Auth(e) => info!(error = %e, "playlist creation needs a login"),
        ExportError::NothingSelected => {}
    }
}
