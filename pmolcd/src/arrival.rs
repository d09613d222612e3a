//! Cross-thread device arrival signalling.
//!
//! The LCD manager reports device arrivals on its own thread. The
//! [`ArrivalBridge`] turns them into level-triggered flags the main loop
//! polls once per tick: several arrivals before the loop services the flag
//! collapse into one pending notice. Only the main loop clears the flags.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, info};

/// Display classes announced by the LCD manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LcdDeviceType {
    /// 160x43 monochrome panels (G13, G15, G510, Z10).
    Monochrome,
    /// 320x240 colour panels (G19). Accepted but not serviced yet.
    Qvga,
}

impl LcdDeviceType {
    pub fn is_supported(self) -> bool {
        matches!(self, LcdDeviceType::Monochrome)
    }
}

#[derive(Clone, Copy, Debug)]
enum Wake {
    Arrival,
    Interrupt,
}

#[derive(Debug)]
pub struct ArrivalBridge {
    mono_arrived: AtomicBool,
    qvga_arrived: AtomicBool,
    wake_tx: Sender<Wake>,
    wake_rx: Receiver<Wake>,
}

impl Default for ArrivalBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalBridge {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        ArrivalBridge {
            mono_arrived: AtomicBool::new(false),
            qvga_arrived: AtomicBool::new(false),
            wake_tx,
            wake_rx,
        }
    }

    fn flag(&self, device_type: LcdDeviceType) -> &AtomicBool {
        match device_type {
            LcdDeviceType::Monochrome => &self.mono_arrived,
            LcdDeviceType::Qvga => &self.qvga_arrived,
        }
    }

    /// Called by the device-management thread when a display shows up.
    pub fn notify_arrival(&self, device_type: LcdDeviceType) {
        debug!(device_type = ?device_type, "Device arrival signalled");
        self.flag(device_type).store(true, Ordering::SeqCst);
        // Only a display the applet can draw on ends the startup wait. A
        // full channel already holds a pending wake-up.
        if device_type.is_supported() {
            let _ = self.wake_tx.try_send(Wake::Arrival);
        }
    }

    /// Called by the device-management thread when a display goes away.
    ///
    /// Nothing to record: the open device reports itself as disposed.
    pub fn notify_removal(&self, device_type: LcdDeviceType) {
        info!(device_type = ?device_type, "Device removal signalled");
    }

    /// Blocks until the arrival of a supported device has been signalled.
    ///
    /// Returns `false` when woken by [`interrupt`](Self::interrupt) instead.
    pub fn wait_for_first_arrival(&self) -> bool {
        match self.wake_rx.recv() {
            Ok(Wake::Arrival) => true,
            Ok(Wake::Interrupt) | Err(_) => false,
        }
    }

    /// Releases a thread blocked in [`wait_for_first_arrival`](Self::wait_for_first_arrival).
    pub fn interrupt(&self) {
        let _ = self.wake_tx.try_send(Wake::Interrupt);
    }

    pub fn is_pending(&self, device_type: LcdDeviceType) -> bool {
        self.flag(device_type).load(Ordering::SeqCst)
    }

    /// Marks the arrival of `device_type` as serviced.
    pub fn clear(&self, device_type: LcdDeviceType) {
        self.flag(device_type).store(false, Ordering::SeqCst);
    }
}
