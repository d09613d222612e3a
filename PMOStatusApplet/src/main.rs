//! `pmostatus-applet`: shows what Spotify is playing on an LCD panel.
//!
//! The panel is emulated in the terminal; see [`terminal_lcd`] for the keys.

mod logging;
mod terminal_lcd;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};
use pmoconfig::{Config, get_config};
use pmolcd::{
    Applet, AppletControl, AppletError, CapabilityFlags, LoggingMediaKeys, SoftButtonDispatcher,
};
use pmospotify::{SpotifyLocalClient, SpotifySettings};
use tracing::{error, info};

use crate::terminal_lcd::TerminalLcd;

const NO_TITLES_ARG: &str = "notitles";

#[derive(Debug, Parser)]
#[command(name = "pmostatus-applet", version, about = "Spotify now-playing applet for LCD panels")]
struct Args {
    /// `notitles` hides track, artist and album names
    mode: Option<String>,

    /// Configuration directory holding config.yaml
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,
}

impl Args {
    fn show_titles(&self, default: bool) -> bool {
        match self.mode.as_deref() {
            Some(NO_TITLES_ARG) => false,
            Some(_) => true,
            None => default,
        }
    }
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        logging::log_panic(panic_info);
        eprintln!("\npmostatus-applet panicked: {}", panic_info);
    }));

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pmostatus-applet: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Arc<Config>> {
    match &args.config {
        Some(dir) => {
            let config = Config::load_config(&dir.to_string_lossy())
                .with_context(|| format!("Cannot load configuration from {}", dir.display()))?;
            Ok(Arc::new(config))
        }
        None => Ok(get_config()),
    }
}

fn spotify_settings(config: &Config) -> SpotifySettings {
    SpotifySettings {
        base_url: config.get_status_base_url(),
        oauth_url: config.get_status_oauth_url(),
        oauth_token: config.get_status_oauth_token(),
        timeout: Duration::from_millis(config.get_status_timeout_ms().max(1)),
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    logging::init_tracing(&config);
    logging::log_startup(&config);

    let source = match SpotifyLocalClient::connect(spotify_settings(&config)) {
        Ok(client) => client,
        Err(err) => {
            let err = AppletError::FatalStartupFailure(err.to_string());
            error!(error = %err, "Cannot reach the Spotify client");
            return Err(err.into());
        }
    };

    let flags = Arc::new(CapabilityFlags::new(args.show_titles(config.get_show_titles())));
    let control = AppletControl::new(Arc::clone(&flags));
    let soft_buttons =
        SoftButtonDispatcher::new(Arc::clone(&flags), Arc::new(LoggingMediaKeys)).into_handler();

    let (manager, events) = TerminalLcd::start(&config.get_applet_name(), control.clone())?;

    let mut applet = Applet::new(source, manager, control.clone(), soft_buttons)
        .with_tick_period(Duration::from_millis(config.get_tick_ms().max(1)));
    let result = applet.run();

    // stops the event thread when the loop ended on its own
    control.terminate();
    drop(applet);
    if events.join().is_err() {
        error!("LCD event thread panicked");
    }

    result?;
    info!("pmostatus-applet stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_notitles_hides_titles() {
        assert!(!parse(&["pmostatus-applet", "notitles"]).show_titles(true));
    }

    #[test]
    fn test_other_argument_keeps_titles() {
        assert!(parse(&["pmostatus-applet", "titles"]).show_titles(false));
        assert!(parse(&["pmostatus-applet", "NOTITLES"]).show_titles(false));
    }

    #[test]
    fn test_no_argument_uses_config_default() {
        let args = parse(&["pmostatus-applet"]);
        assert!(args.show_titles(true));
        assert!(!args.show_titles(false));
    }

    #[test]
    fn test_config_dir_option() {
        let args = parse(&["pmostatus-applet", "--config", "/tmp/pmostatus", "notitles"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/pmostatus")));
        assert_eq!(args.mode.as_deref(), Some("notitles"));
    }

    #[test]
    fn test_settings_from_embedded_config() {
        let settings = spotify_settings(&Config::embedded());
        assert_eq!(settings.base_url, "http://127.0.0.1:4380");
        assert_eq!(settings.oauth_token, None);
        assert_eq!(settings.timeout, Duration::from_millis(1000));
    }
}
