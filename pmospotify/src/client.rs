use std::time::Duration;

use pmolcd::{PlayerSnapshot, SourceError, StatusSource};
use tracing::{debug, info, trace};
use ureq::Agent;

use crate::errors::SetupError;
use crate::protocol::{parse_csrf, parse_oauth, parse_status};

/// The helper rejects requests that do not look like they come from the
/// Spotify web player.
const ORIGIN: &str = "https://open.spotify.com";
const CSRF_PATH: &str = "/simplecsrf/token.json";
const STATUS_PATH: &str = "/remote/status.json";

#[derive(Clone, Debug)]
pub struct SpotifySettings {
    /// Root of the local web helper, without trailing slash.
    pub base_url: String,
    /// Endpoint handing out anonymous OAuth tokens.
    pub oauth_url: String,
    /// Pre-acquired OAuth token; skips the `oauth_url` request when set.
    pub oauth_token: Option<String>,
    /// Upper bound for any single request.
    pub timeout: Duration,
}

impl Default for SpotifySettings {
    fn default() -> Self {
        SpotifySettings {
            base_url: "http://127.0.0.1:4380".to_string(),
            oauth_url: "https://open.spotify.com/token".to_string(),
            oauth_token: None,
            timeout: Duration::from_millis(1000),
        }
    }
}

pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Session with the local web helper.
///
/// Holds the OAuth and CSRF tokens acquired by [`connect`](Self::connect);
/// every [`fetch`](StatusSource::fetch) is a single bounded GET.
pub struct SpotifyLocalClient {
    agent: Agent,
    base_url: String,
    oauth: String,
    csrf: String,
}

impl SpotifyLocalClient {
    pub fn connect(settings: SpotifySettings) -> Result<Self, SetupError> {
        let agent = build_agent(settings.timeout);
        let base_url = settings.base_url.trim_end_matches('/').to_string();

        let oauth = match settings.oauth_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                debug!("Using configured OAuth token");
                token
            }
            None => request_oauth(&agent, &settings.oauth_url)?,
        };

        let csrf = request_csrf(&agent, &base_url)?;
        info!(base_url = %base_url, "Connected to Spotify local web helper");

        Ok(SpotifyLocalClient {
            agent,
            base_url,
            oauth,
            csrf,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status_url(&self) -> String {
        format!(
            "{}{}?oauth={}&csrf={}&returnafter=0&returnon=",
            self.base_url,
            STATUS_PATH,
            percent_encode(&self.oauth),
            percent_encode(&self.csrf)
        )
    }
}

impl StatusSource for SpotifyLocalClient {
    fn fetch(&self) -> Result<PlayerSnapshot, SourceError> {
        let mut response = self
            .agent
            .get(&self.status_url())
            .header("Origin", ORIGIN)
            .call()
            .map_err(|e| {
                SourceError::unavailable("transport", format!("Status request failed: {}", e))
            })?;

        let body = response.body_mut().read_to_string().map_err(|e| {
            SourceError::unavailable("transport", format!("Failed to read status body: {}", e))
        })?;

        trace!(bytes = body.len(), "Status received");
        parse_status(&body)
    }
}

fn request_oauth(agent: &Agent, oauth_url: &str) -> Result<String, SetupError> {
    debug!(url = %oauth_url, "Requesting OAuth token");
    let mut response = agent
        .get(oauth_url)
        .call()
        .map_err(|e| SetupError::OAuth(format!("HTTP request failed for {}: {}", oauth_url, e)))?;

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| SetupError::OAuth(format!("Failed to read OAuth body: {}", e)))?;

    parse_oauth(&body)
}

fn request_csrf(agent: &Agent, base_url: &str) -> Result<String, SetupError> {
    let url = format!("{}{}", base_url, CSRF_PATH);
    debug!(url = %url, "Requesting CSRF token");
    let mut response = agent
        .get(&url)
        .header("Origin", ORIGIN)
        .call()
        .map_err(|e| SetupError::Csrf(format!("HTTP request failed for {}: {}", url, e)))?;

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| SetupError::Csrf(format!("Failed to read CSRF body: {}", e)))?;

    parse_csrf(&body)
}
