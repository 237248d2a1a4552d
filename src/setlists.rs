use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{ArtistSelection, Backend, FilterCriteria, SetlistSummary};
use crate::component::{Component, ComponentSender};
use crate::dates;
use crate::error::BackendError;

/// Keeps the setlists matching `criteria`, in their original order.
///
/// With no criteria at all everything passes, even entries whose date
/// cannot be read. Once any criterion is set, unreadable dates are out.
pub fn filter_setlists<'a>(
    setlists: &'a [SetlistSummary],
    criteria: &FilterCriteria,
) -> Vec<&'a SetlistSummary> {
    setlists.iter().filter(|s| matches(s, criteria)).collect()
}

pub fn matches(setlist: &SetlistSummary, criteria: &FilterCriteria) -> bool {
    if criteria.is_empty() {
        return true;
    }
    let Some(date) = dates::parse_setlist_date(&setlist.date) else {
        return false;
    };

    criteria.month.map_or(true, |m| date.month() == m)
        && criteria.year.map_or(true, |y| date.year() == y)
        && contains_ignore_case(&setlist.venue, &criteria.venue)
        && contains_ignore_case(setlist.tour.as_deref().unwrap_or_default(), &criteria.tour)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One line of the setlist list, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistRow {
    pub id: String,
    pub heading: String,
    pub tour: Option<String>,
    pub date: String,
    pub is_future: bool,
    pub songs: Option<String>,
    pub title: Option<String>,
    pub chosen: bool,
}

pub struct SetlistList {
    backend: Arc<dyn Backend>,
    pages: u32,
    artist: Option<ArtistSelection>,
    setlists: Vec<SetlistSummary>,
    chosen: Option<String>,
    loading: bool,
    error: Option<String>,
    request: u64,
}

#[derive(Debug)]
pub enum SetlistsMsg {
    SetArtist(ArtistSelection),
    Loaded {
        request: u64,
        result: Result<Vec<SetlistSummary>, BackendError>,
    },
    /// Index into the filtered list.
    Choose(usize),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetlistsOutput {
    Chosen(SetlistSummary),
}

pub struct SetlistsInit {
    pub backend: Arc<dyn Backend>,
    pub pages: u32,
}

impl Component for SetlistList {
    type Init = SetlistsInit;
    type Input = SetlistsMsg;
    type Output = SetlistsOutput;

    fn init(init: SetlistsInit, _sender: &ComponentSender<Self>) -> Self {
        Self {
            backend: init.backend,
            pages: init.pages,
            artist: None,
            setlists: Vec::new(),
            chosen: None,
            loading: false,
            error: None,
            request: 0,
        }
    }

    fn update(&mut self, msg: SetlistsMsg, sender: &ComponentSender<Self>) {
        match msg {
            SetlistsMsg::SetArtist(selection) => {
                self.setlists.clear();
                self.chosen = None;
                self.error = None;
                self.artist = Some(selection);
                self.fetch(sender);
            }
            SetlistsMsg::Loaded { request, result } => {
                if request != self.request {
                    debug!(request, current = self.request, "dropping stale setlists");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(setlists) => self.setlists = setlists,
                    Err(e) => {
                        if e.is_transport() {
                            warn!(error = %e, "network failure fetching setlists");
                        } else {
                            warn!(error = %e, "backend rejected setlist listing");
                        }
                        self.error = Some("Couldn't load setlists.".to_string());
                    }
                }
            }
            SetlistsMsg::Choose(index) => {
                let Some(setlist) = self.visible().get(index).map(|s| (*s).clone()) else {
                    return;
                };
                if self.chosen.as_deref() == Some(setlist.id.as_str()) {
                    debug!(id = %setlist.id, "setlist already open");
                    return;
                }
                self.chosen = Some(setlist.id.clone());
                sender.output(SetlistsOutput::Chosen(setlist));
            }
            SetlistsMsg::Clear => {
                self.request += 1;
                self.artist = None;
                self.setlists.clear();
                self.chosen = None;
                self.loading = false;
                self.error = None;
            }
        }
    }
}

impl SetlistList {
    fn fetch(&mut self, sender: &ComponentSender<Self>) {
        let Some(selection) = self.artist.clone() else { return };
        self.request += 1;
        self.loading = true;

        let backend = self.backend.clone();
        let request = self.request;
        let pages = self.pages;
        sender.oneshot_command(async move {
            let result = backend
                .artist_setlists(&selection.artist.id, &selection.filters, pages)
                .await;
            SetlistsMsg::Loaded { request, result }
        });
    }

    pub fn artist(&self) -> Option<&ArtistSelection> {
        self.artist.as_ref()
    }

    pub fn visible(&self) -> Vec<&SetlistSummary> {
        match &self.artist {
            Some(selection) => filter_setlists(&self.setlists, &selection.filters),
            None => Vec::new(),
        }
    }

    pub fn rows(&self, today: NaiveDate) -> Vec<SetlistRow> {
        self.visible()
            .into_iter()
            .map(|s| {
                SetlistRow {
                    id: s.id.clone(),
                    heading: s.location(),
                    tour: s.tour.clone(),
                    date: dates::format_short(dates::parse_setlist_date(&s.date)),
                    is_future: dates::is_future(&s.date, today),
                    songs: s.songs_count.map(|n| format!("{n} songs")),
                    title: s.display_title.clone(),
                    chosen: self.chosen.as_deref() == Some(s.id.as_str()),
                }
            })
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
