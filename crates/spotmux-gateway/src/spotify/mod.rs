//! Music API client
//!
//! Bearer-authenticated wrapper over the Web API endpoints the tools need.
//! One instance per tool invocation, built with the token the session
//! manager just handed out.

mod error;
pub mod summary;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use spotmux_core::ProviderError;
use tracing::{debug, info};

use crate::transport::transport_error;
use error::provider_error;

/// Playlist pages are capped at this size
const PAGE_LIMIT: u32 = 50;

/// A playback device as listed by `/me/player/devices`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Result of a start/resume request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Resume requested while a track was already playing
    AlreadyPlaying,
    Started,
}

/// Kinds of item addressable by a `spotify:{kind}:{id}` URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Track,
    Album,
    Artist,
    Playlist,
}

/// Split `spotify:{kind}:{id}`
pub fn parse_item_uri(uri: &str) -> Option<(ItemKind, &str)> {
    let mut parts = uri.split(':');
    let (Some("spotify"), Some(kind), Some(id), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    if id.is_empty() {
        return None;
    }
    let kind = match kind {
        "track" => ItemKind::Track,
        "album" => ItemKind::Album,
        "artist" => ItemKind::Artist,
        "playlist" => ItemKind::Playlist,
        _ => return None,
    };
    Some((kind, id))
}

/// Accept bare track IDs as well as full track URIs
pub fn track_uri(id_or_uri: &str) -> String {
    if id_or_uri.starts_with("spotify:") {
        id_or_uri.to_string()
    } else {
        format!("spotify:track:{}", id_or_uri)
    }
}

#[derive(Clone)]
pub struct SpotifyApi {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl SpotifyApi {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
    }

    /// Send and decode; `None` for 204 or an empty body
    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(transport_error(&e)))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(transport_error(&e)))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "[SpotifyApi] Request failed");
            return Err(provider_error(status.as_u16(), retry_after, &body));
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body).map(Some).map_err(|e| {
            ProviderError::Transport(spotmux_core::TransportError::malformed(
                Some(status.as_u16()),
                format!("invalid API response: {}", e),
            ))
        })
    }

    /// Like `send`, treating an empty response as `null`
    async fn send_json(&self, request: RequestBuilder) -> Result<Value, ProviderError> {
        Ok(self.send(request).await?.unwrap_or(Value::Null))
    }

    // ------------------------------------------------------------------
    // Player
    // ------------------------------------------------------------------

    /// Currently playing track, or `None` when nothing (or a non-track) plays
    pub async fn current_track(&self) -> Result<Option<Value>, ProviderError> {
        let Some(current) = self
            .send(self.request(Method::GET, "/me/player/currently-playing"))
            .await?
        else {
            debug!("[SpotifyApi] No playback session");
            return Ok(None);
        };

        if current.get("currently_playing_type").and_then(Value::as_str) != Some("track") {
            debug!("[SpotifyApi] Current playback is not a track");
            return Ok(None);
        }
        let Some(item) = current.get("item").filter(|i| i.is_object()) else {
            return Ok(None);
        };

        let mut summary = summary::track(item, false);
        if let (Value::Object(map), Some(playing)) = (&mut summary, current.get("is_playing")) {
            map.insert("is_playing".to_string(), playing.clone());
        }
        Ok(Some(summary))
    }

    pub async fn devices(&self) -> Result<Vec<Device>, ProviderError> {
        #[derive(Deserialize)]
        struct Devices {
            #[serde(default)]
            devices: Vec<Device>,
        }

        let body = self
            .send_json(self.request(Method::GET, "/me/player/devices"))
            .await?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        let parsed: Devices = serde_json::from_value(body).map_err(|e| {
            ProviderError::Transport(spotmux_core::TransportError::malformed(
                None,
                format!("invalid device list: {}", e),
            ))
        })?;
        Ok(parsed.devices)
    }

    /// Active device, else the first one listed
    pub async fn candidate_device(&self) -> Result<Device, ProviderError> {
        let mut devices = self.devices().await?;
        if let Some(idx) = devices.iter().position(|d| d.is_active) {
            return Ok(devices.swap_remove(idx));
        }
        if devices.is_empty() {
            return Err(ProviderError::NoActiveDevice);
        }
        let device = devices.swap_remove(0);
        info!(device = %device.name, "[SpotifyApi] No active device, using first available");
        Ok(device)
    }

    fn with_device(request: RequestBuilder, device: &Device) -> RequestBuilder {
        match &device.id {
            Some(id) => request.query(&[("device_id", id.as_str())]),
            None => request,
        }
    }

    /// Start `uri` or resume current playback.
    ///
    /// Track URIs play as `uris`; anything else plays as a context.
    pub async fn start_playback(&self, uri: Option<&str>) -> Result<PlaybackOutcome, ProviderError> {
        let uri = uri.map(str::trim).filter(|u| !u.is_empty());
        if uri.is_none() {
            match self.current_track().await? {
                Some(track) if track.get("is_playing").and_then(Value::as_bool) == Some(true) => {
                    debug!("[SpotifyApi] Playback already active");
                    return Ok(PlaybackOutcome::AlreadyPlaying);
                }
                Some(_) => {}
                None => return Err(ProviderError::NothingToResume),
            }
        }

        let device = self.candidate_device().await?;
        let body = match uri {
            Some(u) if u.starts_with("spotify:track:") => json!({ "uris": [u] }),
            Some(u) => json!({ "context_uri": u }),
            None => json!({}),
        };

        info!(uri = ?uri, device = %device.name, "[SpotifyApi] Starting playback");
        let request = Self::with_device(self.request(Method::PUT, "/me/player/play"), &device);
        self.send(request.json(&body)).await?;
        Ok(PlaybackOutcome::Started)
    }

    /// Pause if something is playing; returns whether a pause was sent
    pub async fn pause(&self) -> Result<bool, ProviderError> {
        let playback = self.send(self.request(Method::GET, "/me/player")).await?;
        let playing = playback
            .as_ref()
            .and_then(|p| p.get("is_playing"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !playing {
            return Ok(false);
        }

        let device = self.candidate_device().await?;
        let request = Self::with_device(self.request(Method::PUT, "/me/player/pause"), &device);
        self.send(request).await?;
        Ok(true)
    }

    pub async fn skip(&self, count: u32) -> Result<(), ProviderError> {
        let device = self.candidate_device().await?;
        for _ in 0..count {
            let request = Self::with_device(self.request(Method::POST, "/me/player/next"), &device);
            self.send(request).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search, queue and lookup
    // ------------------------------------------------------------------

    pub async fn search(&self, query: &str, qtype: &str, limit: u32) -> Result<Value, ProviderError> {
        let limit = limit.to_string();
        let request = self
            .request(Method::GET, "/search")
            .query(&[("q", query), ("type", qtype), ("limit", limit.as_str())]);
        let results = self.send_json(request).await?;
        Ok(summary::search_results(&results, qtype))
    }

    pub async fn queue(&self) -> Result<Value, ProviderError> {
        let (raw, current) = futures::try_join!(
            self.send_json(self.request(Method::GET, "/me/player/queue")),
            self.current_track()
        )?;
        let queue: Vec<Value> = raw
            .get("queue")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|t| summary::track(t, false)).collect())
            .unwrap_or_default();

        Ok(json!({
            "currently_playing": current,
            "queue": queue,
        }))
    }

    pub async fn add_to_queue(&self, track: &str) -> Result<(), ProviderError> {
        let device = self.candidate_device().await?;
        let uri = track_uri(track);
        let request = Self::with_device(
            self.request(Method::POST, "/me/player/queue")
                .query(&[("uri", uri.as_str())]),
            &device,
        );
        self.send(request).await?;
        Ok(())
    }

    /// Look up an item by `spotify:{kind}:{id}` URI
    pub async fn item_info(&self, kind: ItemKind, id: &str) -> Result<Value, ProviderError> {
        let id = urlencoding::encode(id);
        match kind {
            ItemKind::Track => {
                let item = self
                    .send_json(self.request(Method::GET, &format!("/tracks/{}", id)))
                    .await?;
                Ok(summary::track(&item, true))
            }
            ItemKind::Album => {
                let item = self
                    .send_json(self.request(Method::GET, &format!("/albums/{}", id)))
                    .await?;
                Ok(summary::album(&item, true))
            }
            ItemKind::Artist => {
                let (artist, albums, top_tracks) = futures::try_join!(
                    self.send_json(self.request(Method::GET, &format!("/artists/{}", id))),
                    self.send_json(self.request(Method::GET, &format!("/artists/{}/albums", id))),
                    self.send_json(
                        self.request(Method::GET, &format!("/artists/{}/top-tracks", id))
                            .query(&[("market", "from_token")])
                    ),
                )?;
                Ok(summary::artist_with_catalog(&artist, &albums, &top_tracks))
            }
            ItemKind::Playlist => {
                let item = self
                    .send_json(self.request(Method::GET, &format!("/playlists/{}", id)))
                    .await?;
                Ok(summary::playlist(&item, true))
            }
        }
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    pub async fn playlists(&self) -> Result<Value, ProviderError> {
        let request = self
            .request(Method::GET, "/me/playlists")
            .query(&[("limit", PAGE_LIMIT)]);
        let page = self.send_json(request).await?;
        let list: Vec<Value> = page
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|p| !p.is_null())
                    .map(|p| summary::playlist(p, false))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Value::Array(list))
    }

    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Value, ProviderError> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let page = self
            .send_json(self.request(Method::GET, &path).query(&[("limit", PAGE_LIMIT)]))
            .await?;
        Ok(summary::playlist_tracks(page.get("items")))
    }

    pub async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ProviderError> {
        let uris: Vec<String> = track_ids.iter().map(|t| track_uri(t)).collect();
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        self.send(self.request(Method::POST, &path).json(&json!({ "uris": uris })))
            .await?;
        info!(playlist_id, count = uris.len(), "[SpotifyApi] Added tracks to playlist");
        Ok(())
    }

    /// Remove every occurrence of the given tracks
    pub async fn remove_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ProviderError> {
        let tracks: Vec<Value> = track_ids
            .iter()
            .map(|t| json!({ "uri": track_uri(t) }))
            .collect();
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        self.send(self.request(Method::DELETE, &path).json(&json!({ "tracks": tracks })))
            .await?;
        info!(playlist_id, count = track_ids.len(), "[SpotifyApi] Removed tracks from playlist");
        Ok(())
    }

    pub async fn change_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
        public: Option<bool>,
    ) -> Result<(), ProviderError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        if let Some(public) = public {
            body.insert("public".to_string(), json!(public));
        }
        let path = format!("/playlists/{}", urlencoding::encode(playlist_id));
        self.send(self.request(Method::PUT, &path).json(&body)).await?;
        Ok(())
    }

    pub async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
        public: bool,
    ) -> Result<Value, ProviderError> {
        let me = self.send_json(self.request(Method::GET, "/me")).await?;
        let user_id = me
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Api {
                status: 200,
                message: "current user has no id".to_string(),
            })?;

        let path = format!("/users/{}/playlists", urlencoding::encode(user_id));
        let body = json!({
            "name": name,
            "description": description.unwrap_or(""),
            "public": public,
        });
        let created = self.send_json(self.request(Method::POST, &path).json(&body)).await?;
        let created_id = created.get("id").and_then(Value::as_str).unwrap_or("");
        info!(name, id = created_id, "[SpotifyApi] Created playlist");
        Ok(summary::playlist(&created, true))
    }
}

impl std::fmt::Debug for SpotifyApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}
