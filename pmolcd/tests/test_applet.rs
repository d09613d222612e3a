use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pmolcd::{
    Applet, AppletControl, AppletError, CapabilityFlags, DeviceConnectionState, DeviceError,
    LcdDevice, LcdDeviceType, LcdManager, PlayerSnapshot, RenderPage, SoftButtonHandler,
    SoftButtons, SourceError, StatusSource, TrackInfo,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Open(u32),
    Reopen(u32),
    Draw(u32, Vec<String>),
    Fetch,
}

/// Journal partagé entre le test, le manager, les devices et la source
#[derive(Default)]
struct Journal {
    events: Mutex<Vec<Event>>,
    disposed: AtomicBool,
    fail_open: AtomicBool,
    fail_draw_io: AtomicBool,
    handlers: Mutex<Vec<SoftButtonHandler>>,
}

impl Journal {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn draws(&self) -> Vec<(u32, Vec<String>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Draw(id, rows) => Some((id, rows)),
                _ => None,
            })
            .collect()
    }
}

struct MockDevice {
    id: u32,
    journal: Arc<Journal>,
}

impl LcdDevice for MockDevice {
    fn reopen(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Event::Reopen(self.id));
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.journal.disposed.load(Ordering::SeqCst)
    }

    fn set_as_foreground(&mut self, _foreground: bool) -> Result<(), DeviceError> {
        Ok(())
    }

    fn update_and_draw(&mut self, page: &RenderPage) -> Result<(), DeviceError> {
        if self.journal.fail_draw_io.load(Ordering::SeqCst) {
            return Err(DeviceError::Io("usb write failed".to_string()));
        }
        self.journal.push(Event::Draw(self.id, page.to_rows(26, 4)));
        Ok(())
    }
}

struct MockManager {
    journal: Arc<Journal>,
    next_id: Mutex<u32>,
}

impl LcdManager for MockManager {
    type Device = MockDevice;

    fn open_device_by_type(
        &self,
        device_type: LcdDeviceType,
        on_soft_buttons: SoftButtonHandler,
    ) -> Result<MockDevice, DeviceError> {
        assert_eq!(device_type, LcdDeviceType::Monochrome);
        if self.journal.fail_open.load(Ordering::SeqCst) {
            return Err(DeviceError::open_failed(device_type, "claimed by another applet"));
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.journal.disposed.store(false, Ordering::SeqCst);
        self.journal.handlers.lock().unwrap().push(on_soft_buttons);
        self.journal.push(Event::Open(*next_id));
        Ok(MockDevice {
            id: *next_id,
            journal: Arc::clone(&self.journal),
        })
    }
}

struct MockSource {
    journal: Arc<Journal>,
    response: Mutex<Result<PlayerSnapshot, SourceError>>,
}

impl StatusSource for MockSource {
    fn fetch(&self) -> Result<PlayerSnapshot, SourceError> {
        self.journal.push(Event::Fetch);
        self.response.lock().unwrap().clone()
    }
}

fn now_playing() -> PlayerSnapshot {
    PlayerSnapshot {
        track: Some(TrackInfo {
            title: "Teardrop".to_string(),
            album: "Mezzanine".to_string(),
            artist: "Massive Attack".to_string(),
        }),
        elapsed_seconds: 125,
        total_seconds: 243,
        is_playing: true,
        is_online: true,
        is_private_session: false,
    }
}

type TestApplet = Applet<Arc<MockSource>, MockManager>;

fn create_applet(
    response: Result<PlayerSnapshot, SourceError>,
) -> (Arc<Journal>, Arc<MockSource>, AppletControl, TestApplet) {
    let journal = Arc::new(Journal::default());
    let source = Arc::new(MockSource {
        journal: Arc::clone(&journal),
        response: Mutex::new(response),
    });
    let manager = MockManager {
        journal: Arc::clone(&journal),
        next_id: Mutex::new(0),
    };
    let flags = Arc::new(CapabilityFlags::new(true));
    let control = AppletControl::new(flags.clone());
    let buttons_flags = flags.clone();
    let handler: SoftButtonHandler = Arc::new(move |buttons: SoftButtons| {
        if buttons.contains(SoftButtons::BUTTON0) {
            buttons_flags.toggle_show_titles();
        }
    });
    let applet = Applet::new(Arc::clone(&source), manager, control.clone(), handler)
        .with_tick_period(Duration::from_millis(5));
    (journal, source, control, applet)
}

fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn test_startup_blocks_until_first_arrival() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    let runner = thread::spawn(move || applet.run());

    thread::sleep(Duration::from_millis(100));
    assert!(journal.events().is_empty(), "loop body ran without a device");

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    assert!(wait_until(Duration::from_secs(2), || journal.draws().len() >= 3));

    control.terminate();
    let result = runner.join().unwrap();
    assert!(result.is_ok());

    let events = journal.events();
    assert_eq!(events[0], Event::Open(1));
    assert_eq!(journal.count(|e| matches!(e, Event::Open(_))), 1);
    assert_eq!(journal.count(|e| matches!(e, Event::Reopen(_))), 0);

    let (id, rows) = &journal.draws()[0];
    assert_eq!(*id, 1);
    assert_eq!(rows[0].trim_end(), "Teardrop");
    assert!(rows[3].ends_with("2:05/4:03"));
}

#[test]
fn test_unsupported_arrival_does_not_start_the_loop() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    let runner = thread::spawn(move || {
        let result = applet.run();
        (result, applet.ticks())
    });

    control.bridge().notify_arrival(LcdDeviceType::Qvga);
    thread::sleep(Duration::from_millis(100));
    control.terminate();

    let (result, ticks) = runner.join().unwrap();
    assert!(result.is_ok());
    assert_eq!(ticks, 0);
    assert!(journal.events().is_empty());
}

#[test]
fn test_terminate_before_any_device() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    let runner = thread::spawn(move || applet.run());
    thread::sleep(Duration::from_millis(20));
    control.terminate();

    assert!(runner.join().unwrap().is_ok());
    assert!(journal.events().is_empty());
}

#[test]
fn test_coalesced_arrivals_reopen_once() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Open);

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    applet.tick().unwrap();

    assert_eq!(journal.count(|e| matches!(e, Event::Open(_))), 1);
    assert_eq!(journal.count(|e| matches!(e, Event::Reopen(_))), 1);
    assert_eq!(journal.handlers.lock().unwrap().len(), 1);
    assert!(!control.bridge().is_pending(LcdDeviceType::Monochrome));
    assert!(journal.draws().iter().all(|(id, _)| *id == 1));
}

#[test]
fn test_unsupported_arrival_is_cleared_without_action() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    control.bridge().notify_arrival(LcdDeviceType::Qvga);
    applet.tick().unwrap();

    assert_eq!(applet.device_state(), DeviceConnectionState::Absent);
    assert!(!control.bridge().is_pending(LcdDeviceType::Qvga));
    assert!(journal.events().is_empty());

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    control.bridge().notify_arrival(LcdDeviceType::Qvga);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Open);
    assert_eq!(journal.count(|e| matches!(e, Event::Open(_))), 1);
}

#[test]
fn test_source_error_draws_idle_page() {
    let (journal, source, control, mut applet) =
        create_applet(Err(SourceError::unavailable("4102", "Invalid OAuth token")));

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    applet.tick().unwrap();

    let draws = journal.draws();
    assert_eq!(draws.len(), 2);
    let rows = &draws[0].1;
    assert!(rows[0].trim().is_empty());
    assert!(rows[3].starts_with("\u{2016} \u{25CB}"));

    *source.response.lock().unwrap() = Ok(now_playing());
    applet.tick().unwrap();
    assert_eq!(journal.draws()[2].1[0].trim_end(), "Teardrop");
}

#[test]
fn test_disabled_applet_neither_fetches_nor_draws() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    control.flags().set_applet_enabled(false);
    applet.tick().unwrap();
    applet.tick().unwrap();

    assert_eq!(journal.events(), vec![Event::Open(1)]);

    control.flags().set_applet_enabled(true);
    applet.tick().unwrap();
    assert_eq!(journal.draws().len(), 1);
}

#[test]
fn test_soft_button_hides_titles_on_next_frame() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();

    let handler = journal.handlers.lock().unwrap()[0].clone();
    handler(SoftButtons::BUTTON0);
    applet.tick().unwrap();

    let draws = journal.draws();
    assert_eq!(draws[0].1[0].trim_end(), "Teardrop");
    assert!(draws[1].1[0].trim().is_empty());
    assert!(draws[1].1[3].ends_with("2:05/4:03"));
}

#[test]
fn test_disposed_device_is_not_drawn_until_new_arrival() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    assert_eq!(journal.draws().len(), 1);

    journal.disposed.store(true, Ordering::SeqCst);
    applet.tick().unwrap();
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Disposed);
    assert_eq!(journal.draws().len(), 1);

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Open);
    assert_eq!(journal.count(|e| matches!(e, Event::Open(_))), 2);
    assert_eq!(journal.count(|e| matches!(e, Event::Reopen(_))), 0);
    assert_eq!(journal.draws().last().unwrap().0, 2);
}

#[test]
fn test_failed_open_waits_for_next_arrival() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    journal.fail_open.store(true, Ordering::SeqCst);
    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Absent);
    assert!(!control.bridge().is_pending(LcdDeviceType::Monochrome));

    journal.fail_open.store(false, Ordering::SeqCst);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Absent);

    control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    applet.tick().unwrap();
    assert_eq!(applet.device_state(), DeviceConnectionState::Open);
    assert_eq!(journal.draws().len(), 1);
}

#[test]
fn test_device_io_error_ends_the_loop() {
    let (journal, _source, control, mut applet) = create_applet(Ok(now_playing()));

    journal.fail_draw_io.store(true, Ordering::SeqCst);
    control.bridge().notify_arrival(LcdDeviceType::Monochrome);

    let result = applet.run();
    assert!(matches!(
        result,
        Err(AppletError::UnhandledTickFailure {
            tick: 1,
            source: DeviceError::Io(_)
        })
    ));
    assert!(journal.draws().is_empty());
}
