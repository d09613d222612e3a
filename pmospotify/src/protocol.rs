//! JSON payloads of the local web helper.
//!
//! Decoding is lenient: every field is optional and a track that misses any
//! of its three resource names is reported as no track at all (adverts and
//! a freshly started client both look like that).

use pmolcd::{PlayerSnapshot, SourceError, TrackInfo};
use serde::Deserialize;

use crate::errors::SetupError;

/// Error object the helper embeds in any response it refuses.
#[derive(Debug, Deserialize)]
struct ErrorRaw {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct OAuthRaw {
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsrfRaw {
    token: Option<String>,
    error: Option<ErrorRaw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusRaw {
    playing: bool,
    online: bool,
    playing_position: f64,
    open_graph_state: Option<OpenGraphStateRaw>,
    track: Option<TrackRaw>,
    error: Option<ErrorRaw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenGraphStateRaw {
    private_session: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackRaw {
    track_resource: Option<ResourceRaw>,
    album_resource: Option<ResourceRaw>,
    artist_resource: Option<ResourceRaw>,
    length: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceRaw {
    name: Option<String>,
}

impl ResourceRaw {
    fn name(resource: Option<ResourceRaw>) -> Option<String> {
        resource.and_then(|r| r.name)
    }
}

impl TrackRaw {
    fn into_track_info(self) -> Option<TrackInfo> {
        Some(TrackInfo {
            title: ResourceRaw::name(self.track_resource)?,
            album: ResourceRaw::name(self.album_resource)?,
            artist: ResourceRaw::name(self.artist_resource)?,
        })
    }
}

fn seconds(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value as u32
    } else {
        0
    }
}

/// Extracts the token from the open.spotify.com token endpoint.
pub fn parse_oauth(body: &str) -> Result<String, SetupError> {
    let raw: OAuthRaw = serde_json::from_str(body)
        .map_err(|e| SetupError::OAuth(format!("Failed to parse OAuth JSON: {}", e)))?;

    raw.t
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SetupError::OAuth("No token in OAuth response".to_string()))
}

/// Extracts the CSRF token, turning an embedded error into
/// [`SetupError::Rejected`].
pub fn parse_csrf(body: &str) -> Result<String, SetupError> {
    let raw: CsrfRaw = serde_json::from_str(body)
        .map_err(|e| SetupError::Csrf(format!("Failed to parse CSRF JSON: {}", e)))?;

    if let Some(err) = raw.error {
        return Err(SetupError::Rejected {
            code: err.kind,
            message: err.message,
        });
    }

    raw.token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SetupError::Csrf("No token in CSRF response".to_string()))
}

/// Decodes a `remote/status.json` body.
///
/// An embedded error object becomes [`SourceError::Unavailable`] with the
/// helper's error type as code. Positions are truncated to whole seconds
/// and stay zero without a track.
///
/// ```
/// let body = r#"{"playing": false, "online": true, "track": null}"#;
/// let snapshot = pmospotify::parse_status(body).unwrap();
/// assert!(!snapshot.has_track());
/// assert!(snapshot.is_online);
/// ```
pub fn parse_status(body: &str) -> Result<PlayerSnapshot, SourceError> {
    let raw: StatusRaw = serde_json::from_str(body).map_err(|e| {
        SourceError::unavailable("decode", format!("Failed to parse status JSON: {}", e))
    })?;

    if let Some(err) = raw.error {
        return Err(SourceError::unavailable(&err.kind, err.message));
    }

    let (track, total_seconds) = match raw.track {
        Some(track) => {
            let length = track.length;
            match track.into_track_info() {
                Some(info) => (Some(info), seconds(length)),
                None => (None, 0),
            }
        }
        None => (None, 0),
    };

    let elapsed_seconds = if track.is_some() {
        seconds(raw.playing_position)
    } else {
        0
    };

    Ok(PlayerSnapshot {
        track,
        elapsed_seconds,
        total_seconds,
        is_playing: raw.playing,
        is_online: raw.online,
        is_private_session: raw
            .open_graph_state
            .map(|s| s.private_session)
            .unwrap_or(false),
    })
}
