mod client;
mod types;

pub use client::SetlistClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::BackendError;

/// The catalog/playlist service the client talks to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistCandidate>, BackendError>;

    async fn artist_setlists(
        &self,
        artist_id: &str,
        filters: &FilterCriteria,
        pages: u32,
    ) -> Result<Vec<SetlistSummary>, BackendError>;

    async fn setlist_details(&self, setlist_id: &str) -> Result<SetlistDetails, BackendError>;

    async fn session(&self) -> Result<SessionInfo, BackendError>;

    async fn logout(&self) -> Result<(), BackendError>;

    async fn create_playlist(
        &self,
        request: &PlaylistRequest,
    ) -> Result<PlaylistCreated, BackendError>;
}
