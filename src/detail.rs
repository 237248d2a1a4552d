use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{Backend, SetlistDetails, SetlistSummary, SongEntry};
use crate::component::{Component, ComponentSender};
use crate::error::BackendError;
use crate::selection::SongSelection;

pub struct SetlistDetail {
    backend: Arc<dyn Backend>,
    setlist: Option<SetlistSummary>,
    selection: SongSelection,
    artist_image: Option<String>,
    loading: bool,
    error: Option<String>,
    request: u64,
}

#[derive(Debug)]
pub enum DetailMsg {
    Load(SetlistSummary),
    Loaded {
        request: u64,
        result: Result<SetlistDetails, BackendError>,
    },
    Toggle(u32),
    Clear,
}

impl Component for SetlistDetail {
    type Init = Arc<dyn Backend>;
    type Input = DetailMsg;
    type Output = ();

    fn init(backend: Arc<dyn Backend>, _sender: &ComponentSender<Self>) -> Self {
        Self {
            backend,
            setlist: None,
            selection: SongSelection::default(),
            artist_image: None,
            loading: false,
            error: None,
            request: 0,
        }
    }

    fn update(&mut self, msg: DetailMsg, sender: &ComponentSender<Self>) {
        match msg {
            DetailMsg::Load(setlist) => {
                self.request += 1;
                self.selection.clear();
                self.artist_image = None;
                self.error = None;
                self.loading = true;

                let backend = self.backend.clone();
                let request = self.request;
                let id = setlist.id.clone();
                self.setlist = Some(setlist);
                sender.oneshot_command(async move {
                    let result = backend.setlist_details(&id).await;
                    DetailMsg::Loaded { request, result }
                });
            }
            DetailMsg::Loaded { request, result } => {
                if request != self.request {
                    debug!(request, current = self.request, "dropping stale setlist songs");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(details) => {
                        self.selection.load(details.songs);
                        self.artist_image = details.artist_image;
                    }
                    Err(e) => {
                        if e.is_transport() {
                            warn!(error = %e, "network failure fetching setlist songs");
                        } else {
                            warn!(error = %e, "backend rejected setlist details");
                        }
                        self.error = Some("Couldn't load songs for this setlist.".to_string());
                    }
                }
            }
            DetailMsg::Toggle(position) => {
                if !self.selection.toggle(position) {
                    debug!(position, "toggle ignored");
                }
            }
            DetailMsg::Clear => {
                self.request += 1;
                self.setlist = None;
                self.selection.clear();
                self.artist_image = None;
                self.loading = false;
                self.error = None;
            }
        }
    }
}

impl SetlistDetail {
    pub fn setlist(&self) -> Option<&SetlistSummary> {
        self.setlist.as_ref()
    }

    pub fn title(&self) -> Option<String> {
        self.setlist.as_ref().map(SetlistSummary::title)
    }

    pub fn selection(&self) -> &SongSelection {
        &self.selection
    }

    pub fn artist_image(&self) -> Option<&str> {
        self.artist_image.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Extra notes shown next to a song name.
pub fn song_notes(song: &SongEntry) -> Vec<String> {
    let mut notes = Vec::new();
    if song.is_cover {
        match &song.original_artist {
            Some(artist) => notes.push(format!("cover of {artist}")),
            None => notes.push("cover".to_string()),
        }
    }
    if song.is_encore {
        match &song.encore {
            Some(label) => notes.push(format!("Encore {label}")),
            None => notes.push("Encore".to_string()),
        }
    }
    if !song.is_matched() {
        notes.push("missing".to_string());
    }
    notes
}
