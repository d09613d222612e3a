//! The applet main loop.
//!
//! One thread owns the device handle and the render state. It waits for the
//! first display to show up, then ticks at a fixed period: service arrival
//! flags, fetch the player status, compose a page and draw it. Other
//! threads only flip atomics through [`AppletControl`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::arrival::{ArrivalBridge, LcdDeviceType};
use crate::device::{DeviceConnectionState, DeviceHandle, LcdManager, SoftButtonHandler};
use crate::errors::{AppletError, SourceError};
use crate::model::{CapabilityFlags, PlayerSnapshot};
use crate::render::{RenderSurface, ScrollState};
use crate::status::StatusSource;

/// Nominal tick period, about 30 frames per second.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(33);

const DEVICE_TYPES: [LcdDeviceType; 2] = [LcdDeviceType::Monochrome, LcdDeviceType::Qvga];

/// Handle shared with the device-event and UI threads.
#[derive(Clone, Debug)]
pub struct AppletControl {
    running: Arc<AtomicBool>,
    bridge: Arc<ArrivalBridge>,
    flags: Arc<CapabilityFlags>,
}

impl AppletControl {
    pub fn new(flags: Arc<CapabilityFlags>) -> Self {
        AppletControl {
            running: Arc::new(AtomicBool::new(true)),
            bridge: Arc::new(ArrivalBridge::new()),
            flags,
        }
    }

    pub fn bridge(&self) -> &Arc<ArrivalBridge> {
        &self.bridge
    }

    pub fn flags(&self) -> &Arc<CapabilityFlags> {
        &self.flags
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the loop to stop. Takes effect within one tick.
    pub fn terminate(&self) {
        info!("Termination requested");
        self.running.store(false, Ordering::SeqCst);
        self.bridge.interrupt();
    }
}

impl Default for AppletControl {
    fn default() -> Self {
        Self::new(Arc::new(CapabilityFlags::default()))
    }
}

pub struct Applet<S, M: LcdManager> {
    source: S,
    manager: M,
    surface: RenderSurface,
    handle: DeviceHandle<M::Device>,
    scroll: ScrollState,
    soft_buttons: SoftButtonHandler,
    control: AppletControl,
    tick_period: Duration,
    tick: u64,
    last_source_error: Option<SourceError>,
}

impl<S, M> Applet<S, M>
where
    S: StatusSource,
    M: LcdManager,
{
    pub fn new(
        source: S,
        manager: M,
        control: AppletControl,
        soft_buttons: SoftButtonHandler,
    ) -> Self {
        Applet {
            source,
            manager,
            surface: RenderSurface::default(),
            handle: DeviceHandle::new(LcdDeviceType::Monochrome),
            scroll: ScrollState::default(),
            soft_buttons,
            control,
            tick_period: DEFAULT_TICK_PERIOD,
            tick: 0,
            last_source_error: None,
        }
    }

    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_surface(mut self, surface: RenderSurface) -> Self {
        self.surface = surface;
        self
    }

    pub fn control(&self) -> AppletControl {
        self.control.clone()
    }

    pub fn device_state(&self) -> DeviceConnectionState {
        self.handle.state()
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Runs until [`AppletControl::terminate`] is called.
    ///
    /// Blocks first until a display arrives. A tick failure that cannot be
    /// contained is logged and returned.
    pub fn run(&mut self) -> Result<(), AppletError> {
        info!("Waiting for a compatible LCD device");
        if !self.control.bridge.wait_for_first_arrival() || !self.control.is_running() {
            info!("Stopped before any device arrived");
            return Ok(());
        }

        info!(tick_ms = self.tick_period.as_millis() as u64, "Entering applet loop");
        let mut next_tick = Instant::now();

        while self.control.is_running() {
            if let Err(err) = self.tick() {
                error!(error = %err, "Applet loop aborted");
                return Err(err);
            }

            next_tick += self.tick_period;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                // overran the period: start again from now instead of bursting
                next_tick = now;
            }
        }

        info!(ticks = self.tick, "Applet loop stopped");
        Ok(())
    }

    /// One iteration of the loop, without the sleep.
    pub fn tick(&mut self) -> Result<(), AppletError> {
        self.tick += 1;
        self.service_arrivals();
        self.handle.refresh();

        let capabilities = self.control.flags.load();
        if !capabilities.applet_enabled || !self.handle.has_device() || self.handle.is_disposed()
        {
            return Ok(());
        }

        let snapshot = self.fetch_snapshot();
        let (page, scroll) = self.surface.compose(&snapshot, capabilities, &self.scroll);
        self.scroll = scroll;

        match self.handle.draw(&page) {
            Ok(()) => Ok(()),
            Err(err) if err.is_recoverable() => {
                debug!(tick = self.tick, error = %err, "Frame skipped");
                Ok(())
            }
            Err(err) => Err(AppletError::UnhandledTickFailure {
                tick: self.tick,
                source: err,
            }),
        }
    }

    fn service_arrivals(&mut self) {
        let bridge = Arc::clone(&self.control.bridge);

        for device_type in DEVICE_TYPES {
            if !bridge.is_pending(device_type) {
                continue;
            }

            if device_type.is_supported() && device_type == self.handle.device_type() {
                match self.handle.on_arrival(&self.manager, &self.soft_buttons) {
                    Ok(state) => debug!(device_type = ?device_type, state = ?state, "Arrival serviced"),
                    Err(err) => {
                        debug!(device_type = ?device_type, error = %err, "Arrival not serviced, waiting for the next one")
                    }
                }
            } else {
                // Colour displays are not drawn on yet; the arrival is dropped.
                debug!(device_type = ?device_type, "Ignoring arrival of unsupported device type");
            }

            bridge.clear(device_type);
        }
    }

    fn fetch_snapshot(&mut self) -> PlayerSnapshot {
        match self.source.fetch() {
            Ok(snapshot) => {
                if let Some(err) = self.last_source_error.take() {
                    info!(previous_error = %err, "Status source available again");
                }
                snapshot
            }
            Err(err) => {
                if self.last_source_error.as_ref() != Some(&err) {
                    warn!(error = %err, "Status source unavailable, drawing idle page");
                } else {
                    debug!(error = %err, "Status source still unavailable");
                }
                self.last_source_error = Some(err);
                PlayerSnapshot::idle()
            }
        }
    }
}
