use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{ArtistCandidate, ArtistSelection, Backend, FilterCriteria};
use crate::component::{Component, ComponentSender};
use crate::error::BackendError;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    Searching,
    ResultsShown,
    Selected,
}

pub struct SearchInit {
    pub backend: Arc<dyn Backend>,
    pub debounce: Duration,
    pub min_query_len: usize,
    pub query: String,
    pub filters: FilterCriteria,
}

/// Artist typeahead. Keystrokes are debounced into a single lookup; every
/// text change bumps `generation`, and results tagged with an older
/// generation are dropped on arrival.
pub struct ArtistSearch {
    backend: Arc<dyn Backend>,
    debounce: Duration,
    min_query_len: usize,
    query: String,
    filters: FilterCriteria,
    results: Vec<ArtistCandidate>,
    dropdown: bool,
    phase: SearchPhase,
    selected: Option<ArtistCandidate>,
    // Set on pick, consumed by the text change the pick itself causes.
    just_selected: bool,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

#[derive(Debug)]
pub enum SearchMsg {
    QueryChanged(String),
    DebounceElapsed(u64),
    Loaded {
        generation: u64,
        result: Result<Vec<ArtistCandidate>, BackendError>,
    },
    Pick(usize),
    Submit,
    Focus,
    DismissDropdown,
    SetMonth(Option<u32>),
    SetYear(Option<i32>),
    SetVenue(String),
    SetTour(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutput {
    Selected(ArtistSelection),
    /// The entry text must be replaced; the view echoes it back as a
    /// `QueryChanged`.
    SetText(String),
    QueryChanged(String),
    FiltersChanged(FilterCriteria),
}

impl Component for ArtistSearch {
    type Init = SearchInit;
    type Input = SearchMsg;
    type Output = SearchOutput;

    fn init(init: SearchInit, _sender: &ComponentSender<Self>) -> Self {
        Self {
            backend: init.backend,
            debounce: init.debounce,
            min_query_len: init.min_query_len,
            query: init.query,
            filters: init.filters,
            results: Vec::new(),
            dropdown: false,
            phase: SearchPhase::Idle,
            selected: None,
            just_selected: false,
            timer: None,
            generation: 0,
        }
    }

    fn update(&mut self, msg: SearchMsg, sender: &ComponentSender<Self>) {
        match msg {
            SearchMsg::QueryChanged(text) => self.on_query_changed(text, sender),
            SearchMsg::DebounceElapsed(generation) => {
                if generation != self.generation {
                    return;
                }
                self.timer = None;
                self.fetch(sender);
            }
            SearchMsg::Loaded { generation, result } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "dropping stale artist results");
                    return;
                }
                self.results = match result {
                    Ok(artists) => artists,
                    Err(e) => {
                        warn!(error = %e, query = %self.query, "artist search failed");
                        Vec::new()
                    }
                };
                self.dropdown = !self.results.is_empty();
                self.phase = SearchPhase::ResultsShown;
            }
            SearchMsg::Pick(index) => {
                let Some(artist) = self.results.get(index).cloned() else {
                    return;
                };
                self.cancel_timer();
                self.generation += 1;
                self.just_selected = true;
                self.query = artist.name.clone();
                self.results.clear();
                self.dropdown = false;
                self.phase = SearchPhase::Selected;
                self.selected = Some(artist.clone());

                sender.output(SearchOutput::SetText(artist.name.clone()));
                sender.output(SearchOutput::Selected(ArtistSelection {
                    artist,
                    filters: self.filters.clone(),
                }));
            }
            SearchMsg::Submit if self.dropdown_visible() => {
                self.dropdown = false;
            }
            SearchMsg::Submit => match &self.selected {
                Some(artist) => sender.output(SearchOutput::Selected(ArtistSelection {
                    artist: artist.clone(),
                    filters: self.filters.clone(),
                })),
                None => debug!("submit without a picked artist"),
            },
            SearchMsg::Focus => {
                if !self.results.is_empty() {
                    self.dropdown = true;
                }
            }
            SearchMsg::DismissDropdown => {
                self.dropdown = false;
            }
            SearchMsg::SetMonth(month) => {
                self.filters.month = month.filter(|m| (1..=12).contains(m));
                self.filters_changed(sender);
            }
            SearchMsg::SetYear(year) => {
                self.filters.year = year;
                self.filters_changed(sender);
            }
            SearchMsg::SetVenue(venue) => {
                self.filters.venue = venue;
                self.filters_changed(sender);
            }
            SearchMsg::SetTour(tour) => {
                self.filters.tour = tour;
                self.filters_changed(sender);
            }
        }
    }
}

impl ArtistSearch {
    fn on_query_changed(&mut self, text: String, sender: &ComponentSender<Self>) {
        if std::mem::take(&mut self.just_selected) {
            self.query = text;
            sender.output(SearchOutput::QueryChanged(self.query.clone()));
            return;
        }

        self.query = text;
        self.selected = None;
        self.generation += 1;
        self.cancel_timer();
        sender.output(SearchOutput::QueryChanged(self.query.clone()));

        if self.query.trim().chars().count() < self.min_query_len {
            self.results.clear();
            self.dropdown = false;
            self.phase = SearchPhase::Idle;
            return;
        }

        self.phase = SearchPhase::Debouncing;
        let generation = self.generation;
        let delay = self.debounce;
        self.timer = Some(sender.oneshot_command(async move {
            tokio::time::sleep(delay).await;
            SearchMsg::DebounceElapsed(generation)
        }));
    }

    fn fetch(&mut self, sender: &ComponentSender<Self>) {
        self.phase = SearchPhase::Searching;
        let backend = self.backend.clone();
        let query = self.query.trim().to_string();
        let generation = self.generation;
        debug!(%query, generation, "searching artists");
        sender.oneshot_command(async move {
            let result = backend.search_artists(&query).await;
            SearchMsg::Loaded { generation, result }
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn filters_changed(&self, sender: &ComponentSender<Self>) {
        sender.output(SearchOutput::FiltersChanged(self.filters.clone()));
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn results(&self) -> &[ArtistCandidate] {
        &self.results
    }

    pub fn dropdown_visible(&self) -> bool {
        self.dropdown && !self.results.is_empty()
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SearchPhase::Searching
    }

    pub fn selected(&self) -> Option<&ArtistCandidate> {
        self.selected.as_ref()
    }
}

impl Drop for ArtistSearch {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
