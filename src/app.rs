use chrono::{Datelike, Local};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::backend::{Backend, FilterCriteria};
use crate::component::{Component, ComponentSender, Sender};
use crate::detail::{DetailMsg, SetlistDetail};
use crate::login::{AuthHandshake, AuthSurface, SessionHandle};
use crate::playlist::{ExportInit, PlaylistContext, PlaylistExport, PlaylistMsg, PlaylistOutput};
use crate::search::{ArtistSearch, SearchInit, SearchMsg, SearchOutput};
use crate::setlists::{SetlistList, SetlistsInit, SetlistsMsg, SetlistsOutput};
use crate::storage::{self, Settings, UiState};

pub struct AppInit {
    pub backend: Arc<dyn Backend>,
    pub surface: Arc<dyn AuthSurface>,
    pub settings: Settings,
    pub ui_state: UiState,
    /// Where UI state is saved; `None` keeps it in memory only.
    pub ui_state_path: Option<PathBuf>,
}

pub struct App {
    search: ArtistSearch,
    search_sender: ComponentSender<ArtistSearch>,
    setlists: SetlistList,
    setlists_sender: ComponentSender<SetlistList>,
    detail: SetlistDetail,
    detail_sender: ComponentSender<SetlistDetail>,
    export: PlaylistExport,
    export_sender: ComponentSender<PlaylistExport>,
    auth: AuthHandshake,
    ui_state: UiState,
    ui_state_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum AppMsg {
    Search(SearchMsg),
    SearchAction(SearchOutput),
    Setlists(SetlistsMsg),
    SetlistsAction(SetlistsOutput),
    Detail(DetailMsg),
    Playlist(PlaylistMsg),
    PlaylistAction(PlaylistOutput),
    CreatePlaylist,
    Logout,
    LoggedOut,
    SaveUiState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOutput {
    /// Replace the text in the artist entry.
    SearchText(String),
    Notice(String),
}

impl Component for App {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = AppOutput;

    fn init(init: AppInit, sender: &ComponentSender<Self>) -> Self {
        let input = sender.input_sender();

        let filters = init.ui_state.filters.clone().unwrap_or_else(|| FilterCriteria {
            year: init
                .settings
                .default_year_to_current
                .then(|| Local::now().year()),
            ..Default::default()
        });
        let search_sender =
            ComponentSender::new(input.map(AppMsg::Search), input.map(AppMsg::SearchAction));
        let search = ArtistSearch::init(
            SearchInit {
                backend: init.backend.clone(),
                debounce: init.settings.debounce(),
                min_query_len: init.settings.min_query_len,
                query: init.ui_state.search_query.clone().unwrap_or_default(),
                filters,
            },
            &search_sender,
        );

        let setlists_sender =
            ComponentSender::new(input.map(AppMsg::Setlists), input.map(AppMsg::SetlistsAction));
        let setlists = SetlistList::init(
            SetlistsInit {
                backend: init.backend.clone(),
                pages: init.settings.setlist_pages,
            },
            &setlists_sender,
        );

        let detail_sender = ComponentSender::new(input.map(AppMsg::Detail), Sender::sink());
        let detail = SetlistDetail::init(init.backend.clone(), &detail_sender);

        let auth = AuthHandshake::new(init.backend.clone(), init.surface, init.settings.auth_timeout());
        let export_sender =
            ComponentSender::new(input.map(AppMsg::Playlist), input.map(AppMsg::PlaylistAction));
        let export = PlaylistExport::init(
            ExportInit {
                backend: init.backend,
                auth: auth.clone(),
                public: init.ui_state.public.unwrap_or(false),
            },
            &export_sender,
        );

        Self {
            search,
            search_sender,
            setlists,
            setlists_sender,
            detail,
            detail_sender,
            export,
            export_sender,
            auth,
            ui_state: init.ui_state,
            ui_state_path: init.ui_state_path,
        }
    }

    fn update(&mut self, msg: AppMsg, sender: &ComponentSender<Self>) {
        match msg {
            AppMsg::Search(msg) => self.search.update(msg, &self.search_sender),
            AppMsg::SearchAction(action) => match action {
                SearchOutput::Selected(selection) => {
                    self.detail.update(DetailMsg::Clear, &self.detail_sender);
                    self.export
                        .update(PlaylistMsg::SetContext(None), &self.export_sender);
                    self.setlists
                        .update(SetlistsMsg::SetArtist(selection), &self.setlists_sender);
                }
                SearchOutput::SetText(text) => sender.output(AppOutput::SearchText(text)),
                SearchOutput::QueryChanged(query) => {
                    self.ui_state.search_query = Some(query);
                    sender.input(AppMsg::SaveUiState);
                }
                SearchOutput::FiltersChanged(filters) => {
                    self.ui_state.filters = Some(filters);
                    sender.input(AppMsg::SaveUiState);
                }
            },
            AppMsg::Setlists(msg) => self.setlists.update(msg, &self.setlists_sender),
            AppMsg::SetlistsAction(SetlistsOutput::Chosen(setlist)) => {
                self.export.update(
                    PlaylistMsg::SetContext(Some(PlaylistContext::from(&setlist))),
                    &self.export_sender,
                );
                self.detail
                    .update(DetailMsg::Load(setlist), &self.detail_sender);
            }
            AppMsg::Detail(msg) => self.detail.update(msg, &self.detail_sender),
            AppMsg::Playlist(msg) => self.export.update(msg, &self.export_sender),
            AppMsg::PlaylistAction(action) => match action {
                PlaylistOutput::Created(url) => {
                    sender.output(AppOutput::Notice(format!("Playlist created: {url}")));
                }
                PlaylistOutput::Failed(message) => sender.output(AppOutput::Notice(message)),
                PlaylistOutput::Open(url) => {
                    if let Err(e) = open::that(&url) {
                        warn!(error = %e, "failed to open browser");
                        sender.output(AppOutput::Notice(format!("Open {url} in your browser")));
                    }
                }
                PlaylistOutput::PublicChanged(public) => {
                    self.ui_state.public = Some(public);
                    sender.input(AppMsg::SaveUiState);
                }
            },
            AppMsg::CreatePlaylist => {
                let selected = self.detail.selection().selected_songs();
                self.export
                    .update(PlaylistMsg::Create(selected), &self.export_sender);
            }
            AppMsg::Logout => {
                let auth = self.auth.clone();
                sender.oneshot_command(async move {
                    auth.logout().await;
                    AppMsg::LoggedOut
                });
            }
            AppMsg::LoggedOut => sender.output(AppOutput::Notice("Logged out".to_string())),
            AppMsg::SaveUiState => {
                if let Some(path) = &self.ui_state_path {
                    if let Err(e) = storage::save_ui_state_to(path, &self.ui_state) {
                        warn!(error = %e, "failed to save ui state");
                    }
                }
            }
        }
    }
}

impl App {
    pub fn search(&self) -> &ArtistSearch {
        &self.search
    }

    pub fn setlists(&self) -> &SetlistList {
        &self.setlists
    }

    pub fn detail(&self) -> &SetlistDetail {
        &self.detail
    }

    pub fn export(&self) -> &PlaylistExport {
        &self.export
    }

    pub fn session(&self) -> SessionHandle {
        self.auth.session()
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }
}
