//! # pmospotify
//!
//! [`StatusSource`](pmolcd::StatusSource) backed by the local web helper
//! embedded in the Spotify desktop client.
//!
//! The helper listens on localhost and answers two JSON endpoints: one that
//! hands out a CSRF token and one that reports the player status. Both must
//! be called with an `Origin` header from the Spotify web player and the
//! status call also needs an OAuth token from open.spotify.com.
//!
//! ```no_run
//! use pmolcd::StatusSource;
//! use pmospotify::{SpotifyLocalClient, SpotifySettings};
//!
//! let client = SpotifyLocalClient::connect(SpotifySettings::default())?;
//! let snapshot = client.fetch()?;
//! println!("{:?}", snapshot.track_title());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod errors;
pub mod protocol;

pub use client::{SpotifyLocalClient, SpotifySettings, build_agent};
pub use errors::SetupError;
pub use protocol::{parse_csrf, parse_oauth, parse_status};
