use std::collections::BTreeMap;

use crate::backend::{SelectedSong, SongEntry};

/// Which songs of the loaded setlist go into the playlist.
///
/// Loading a new song list replaces everything. Songs without a catalog
/// match stay unselected no matter what is toggled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongSelection {
    songs: Vec<SongEntry>,
    selected: BTreeMap<u32, bool>,
}

impl SongSelection {
    pub fn new(songs: Vec<SongEntry>) -> Self {
        let selected = songs
            .iter()
            .map(|song| (song.position, song.is_eligible()))
            .collect();
        Self { songs, selected }
    }

    pub fn load(&mut self, songs: Vec<SongEntry>) {
        *self = Self::new(songs);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn songs(&self) -> &[SongEntry] {
        &self.songs
    }

    pub fn song(&self, position: u32) -> Option<&SongEntry> {
        self.songs.iter().find(|s| s.position == position)
    }

    pub fn is_selected(&self, position: u32) -> bool {
        self.selected.get(&position).copied().unwrap_or(false)
    }

    /// Flips one song. Returns whether anything changed; unmatched or
    /// unknown positions are left alone.
    pub fn toggle(&mut self, position: u32) -> bool {
        if !self.song(position).is_some_and(SongEntry::is_matched) {
            return false;
        }
        match self.selected.get_mut(&position) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> &BTreeMap<u32, bool> {
        &self.selected
    }

    pub fn total(&self) -> usize {
        self.songs.len()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.values().filter(|&&on| on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Selected songs in setlist order.
    pub fn selected_songs(&self) -> Vec<SelectedSong> {
        self.songs
            .iter()
            .filter(|song| self.is_selected(song.position))
            .map(|song| SelectedSong {
                position: song.position,
                set_number: song.set_number,
            })
            .collect()
    }
}
