use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtistCandidate {
    #[serde(rename = "mbid")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub disambiguation: Option<String>,
}

/// Narrowing applied to an artist's setlists. Captured when an artist is
/// picked and carried with that pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub tour: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.month.is_none()
            && self.year.is_none()
            && self.venue.trim().is_empty()
            && self.tour.trim().is_empty()
    }

    /// Query parameters for the setlist listing; unset fields are sent empty.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("month", self.month.map(|m| m.to_string()).unwrap_or_default()),
            ("year", self.year.map(|y| y.to_string()).unwrap_or_default()),
            ("venue", self.venue.trim().to_string()),
            ("tour", self.tour.trim().to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistSelection {
    pub artist: ArtistCandidate,
    pub filters: FilterCriteria,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetlistSummary {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tour: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub display_title: Option<String>,
    #[serde(default)]
    pub songs_count: Option<u32>,
}

impl SetlistSummary {
    /// "Venue, City", leaving out whichever part is blank.
    pub fn location(&self) -> String {
        match (self.venue.is_empty(), self.city.is_empty()) {
            (false, false) => format!("{}, {}", self.venue, self.city),
            (false, true) => self.venue.clone(),
            (true, _) => self.city.clone(),
        }
    }

    pub fn title(&self) -> String {
        self.display_title.clone().unwrap_or_else(|| self.location())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongEntry {
    pub position: u32,
    #[serde(default = "first_set")]
    pub set_number: u32,
    pub name: String,
    #[serde(default)]
    pub is_cover: bool,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub original_artist: Option<String>,
    #[serde(default)]
    pub is_encore: bool,
    #[serde(default, deserialize_with = "label_or_level")]
    pub encore: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub album_art: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub info: Option<String>,
    #[serde(
        default,
        alias = "spotify_uri",
        alias = "track_uri",
        deserialize_with = "empty_string_as_none"
    )]
    pub track_ref: Option<String>,
}

impl SongEntry {
    /// Whether the song was matched to a track in the streaming catalog.
    /// Unmatched songs can never be part of a playlist.
    pub fn is_matched(&self) -> bool {
        self.track_ref.is_some()
    }

    pub fn is_eligible(&self) -> bool {
        !self.is_cover && !self.is_encore && self.is_matched()
    }
}

fn first_set() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SetlistDetails {
    #[serde(default)]
    pub songs: Vec<SongEntry>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub artist_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl SessionInfo {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(id: &str, name: &str) -> Self {
        Self {
            authenticated: true,
            user: Some(UserInfo {
                id: id.to_string(),
                name: Some(name.to_string()),
            }),
        }
    }

    /// Name to show for an authenticated session, `None` otherwise.
    pub fn display_name(&self) -> Option<String> {
        if !self.authenticated {
            return None;
        }
        Some(
            self.user
                .as_ref()
                .map(|u| u.name.clone().unwrap_or_else(|| u.id.clone()))
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedSong {
    pub position: u32,
    pub set_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRequest {
    pub setlist_id: String,
    pub selected: Vec<SelectedSong>,
    pub date: String,
    pub venue: String,
    pub city: String,
    pub country: String,
    pub tour: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistCreated {
    pub playlist_url: String,
    #[serde(default)]
    pub songs_count: Option<u32>,
}

/// Every backend answer carries an explicit success flag. A missing flag
/// counts as failure.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    pub(crate) fn error_text(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_default()
    }

    pub(crate) fn into_data(self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.error_text()));
        }
        self.data
            .ok_or_else(|| BackendError::Decode("response has no data".to_string()))
    }

    pub(crate) fn into_ack(self) -> Result<(), BackendError> {
        if self.success {
            Ok(())
        } else {
            Err(BackendError::Rejected(self.error_text()))
        }
    }
}

fn empty_string_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    Ok(opt.filter(|s| !s.trim().is_empty()))
}

fn label_or_level<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LabelOrLevel {
        Level(u64),
        Label(String),
    }

    Ok(match Option::<LabelOrLevel>::deserialize(de)? {
        None | Some(LabelOrLevel::Level(0)) => None,
        Some(LabelOrLevel::Level(n)) => Some(n.to_string()),
        Some(LabelOrLevel::Label(s)) if s.trim().is_empty() => None,
        Some(LabelOrLevel::Label(s)) => Some(s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_without_reference_is_unmatched() {
        let song: SongEntry = serde_json::from_str(
            r#"{"name":"Intro","position":1,"set_number":1,"is_cover":false,
                "is_encore":false,"encore":0,"original_artist":"","spotify_uri":null}"#,
        )
        .unwrap();
        assert!(!song.is_matched());
        assert!(!song.is_eligible());
        assert_eq!(song.encore, None);
        assert_eq!(song.original_artist, None);
    }

    #[test]
    fn encore_level_becomes_label() {
        let song: SongEntry = serde_json::from_str(
            r#"{"name":"Finale","position":9,"set_number":2,"is_encore":true,
                "encore":2,"track_ref":"spotify:track:1"}"#,
        )
        .unwrap();
        assert_eq!(song.encore.as_deref(), Some("2"));
        assert!(song.is_matched());
        assert!(!song.is_eligible());
    }

    #[test]
    fn envelope_without_success_flag_is_rejected() {
        let env: Envelope<Vec<ArtistCandidate>> =
            serde_json::from_str(r#"{"data":[],"error":"Query parameter required"}"#).unwrap();
        assert_eq!(
            env.into_data(),
            Err(BackendError::Rejected("Query parameter required".into()))
        );
    }

    #[test]
    fn envelope_success_yields_data() {
        let env: Envelope<Vec<ArtistCandidate>> = serde_json::from_str(
            r#"{"success":true,"data":[{"mbid":"a1","name":"Radiohead","disambiguation":""}]}"#,
        )
        .unwrap();
        let artists = env.into_data().unwrap();
        assert_eq!(artists[0].id, "a1");
        assert_eq!(artists[0].disambiguation, None);
    }

    #[test]
    fn session_display_name_falls_back_to_id() {
        let info: SessionInfo =
            serde_json::from_str(r#"{"authenticated":true,"user":{"id":"u42"}}"#).unwrap();
        assert_eq!(info.display_name().as_deref(), Some("u42"));
        assert_eq!(SessionInfo::anonymous().display_name(), None);
    }

    #[test]
    fn criteria_with_blank_text_is_empty() {
        let criteria = FilterCriteria {
            venue: "  ".into(),
            ..Default::default()
        };
        assert!(criteria.is_empty());
        assert!(!FilterCriteria { year: Some(2023), ..Default::default() }.is_empty());
    }
}
