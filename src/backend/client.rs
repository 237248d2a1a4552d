use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::*;
use super::Backend;
use crate::error::BackendError;

const USER_AGENT: &str = concat!("setlister/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct ClientInner {
    client: Client,
    base_url: Url,
}

/// HTTP client for the setlist backend. The backend keeps the streaming
/// login in its own session, tied to the cookie this client stores.
#[derive(Clone, Debug)]
pub struct SetlistClient {
    inner: Arc<ClientInner>,
}

impl SetlistClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut base_url =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(ClientInner { client, base_url }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    /// Page that starts the streaming-service login in a browser.
    pub fn login_url(&self) -> Result<Url, BackendError> {
        self.endpoint("auth/login")
    }

    async fn get_data<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(%url, "GET");
        let response = self.inner.client.get(url).send().await?;
        read_envelope::<T>(response).await?.into_data()
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, BackendError> {
    let status = response.status();
    let body = response.bytes().await?;

    match serde_json::from_slice::<Envelope<T>>(&body) {
        Ok(envelope) if status == StatusCode::UNAUTHORIZED => {
            Err(BackendError::Unauthorized(envelope.error_text()))
        }
        Ok(envelope) => Ok(envelope),
        Err(_) if status == StatusCode::UNAUTHORIZED => {
            Err(BackendError::Unauthorized(status.to_string()))
        }
        Err(e) if status.is_success() => Err(BackendError::Decode(e.to_string())),
        Err(_) => Err(BackendError::Rejected(format!("server returned {status}"))),
    }
}

fn path_segment(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[async_trait]
impl Backend for SetlistClient {
    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistCandidate>, BackendError> {
        let mut url = self.endpoint("api/artists/search")?;
        url.query_pairs_mut().append_pair("q", query);
        self.get_data(url).await
    }

    async fn artist_setlists(
        &self,
        artist_id: &str,
        filters: &FilterCriteria,
        pages: u32,
    ) -> Result<Vec<SetlistSummary>, BackendError> {
        let mut url = self.endpoint(&format!("api/artists/{}/setlists", path_segment(artist_id)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pages", &pages.to_string());
            for (key, value) in filters.query_pairs() {
                query.append_pair(key, &value);
            }
        }
        self.get_data(url).await
    }

    async fn setlist_details(&self, setlist_id: &str) -> Result<SetlistDetails, BackendError> {
        let url = self.endpoint(&format!("api/setlists/{}", path_segment(setlist_id)))?;
        self.get_data(url).await
    }

    async fn session(&self) -> Result<SessionInfo, BackendError> {
        let url = self.endpoint("auth/me")?;
        let response = self.inner.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Rejected(format!(
                "server returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let url = self.endpoint("auth/logout")?;
        let response = self.inner.client.post(url).send().await?;
        read_envelope::<serde_json::Value>(response).await?.into_ack()
    }

    async fn create_playlist(
        &self,
        request: &PlaylistRequest,
    ) -> Result<PlaylistCreated, BackendError> {
        let url = self.endpoint("api/playlists/create")?;
        debug!(setlist = %request.setlist_id, songs = request.selected.len(), "POST playlist");
        let response = self.inner.client.post(url).json(request).send().await?;
        read_envelope::<PlaylistCreated>(response).await?.into_data()
    }
}
