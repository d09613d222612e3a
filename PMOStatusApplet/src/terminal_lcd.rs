//! LCD emulator drawn in the terminal.
//!
//! Stands in for the vendor LCD manager: the 26x4 monochrome page is drawn
//! in a bordered box and the keyboard plays the part of the hardware (soft
//! buttons, plug and unplug). Keys are read on a dedicated event thread
//! which, like the real device-event thread, only flips atomics and wakes
//! the applet through the [`ArrivalBridge`](pmolcd::ArrivalBridge).

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use pmolcd::render::{MONOCHROME_COLUMNS, PAGE_ROWS};
use pmolcd::{
    AppletControl, DeviceError, LcdDevice, LcdDeviceType, LcdManager, RenderPage,
    SoftButtonHandler, SoftButtons,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const HELP: &str = "1-4 soft buttons  u unplug  p plug  r replug  g QVGA  e enable  q quit";

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Cannot enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Cannot enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// What the emulated panel currently shows.
struct Screen {
    guard: TerminalGuard,
    title: String,
    rows: Vec<String>,
}

impl Screen {
    fn render(&mut self, status: &str) -> io::Result<()> {
        let title = self.title.clone();
        let rows = self.rows.clone();
        self.guard.terminal.draw(|f| {
            let area = f.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(PAGE_ROWS as u16 + 2),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ])
                .split(area);

            let panel = Rect {
                width: (MONOCHROME_COLUMNS as u16 + 2).min(chunks[0].width),
                ..chunks[0]
            };
            let lines: Vec<Line> = rows.iter().map(|r| Line::from(r.as_str())).collect();
            let lcd = Paragraph::new(lines)
                .style(Style::default().fg(Color::Black).bg(Color::Green))
                .block(Block::default().borders(Borders::ALL).title(title.as_str()));
            f.render_widget(lcd, panel);

            f.render_widget(
                Paragraph::new(status).style(Style::default().fg(Color::Gray)),
                chunks[1],
            );
            f.render_widget(
                Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
                chunks[2],
            );
        })?;
        Ok(())
    }
}

/// State shared by the manager, the devices it opens and the event thread.
struct Shared {
    screen: Mutex<Screen>,
    control: AppletControl,
    plugged: AtomicBool,
    /// Bumped on every unplug; a device opened under an older generation
    /// is disposed.
    generation: AtomicU64,
    buttons: Mutex<Option<SoftButtonHandler>>,
}

impl Shared {
    fn status_line(&self) -> String {
        let flags = self.control.flags();
        format!(
            "display {}  applet {}  titles {}",
            if self.plugged.load(Ordering::SeqCst) { "plugged" } else { "unplugged" },
            if flags.applet_enabled() { "enabled" } else { "disabled" },
            if flags.show_titles() { "shown" } else { "hidden" },
        )
    }

    fn redraw(&self, rows: Option<Vec<String>>) -> io::Result<()> {
        let status = self.status_line();
        let mut screen = self
            .screen
            .lock()
            .map_err(|err| io::Error::other(err.to_string()))?;
        if let Some(rows) = rows {
            screen.rows = rows;
        }
        screen.render(&status)
    }

    fn unplug(&self) {
        self.plugged.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.control.bridge().notify_removal(LcdDeviceType::Monochrome);
        if let Err(err) = self.redraw(Some(blank_rows())) {
            warn!(error = %err, "Cannot redraw emulator");
        }
    }

    fn plug(&self) {
        self.plugged.store(true, Ordering::SeqCst);
        self.control.bridge().notify_arrival(LcdDeviceType::Monochrome);
    }

    fn press(&self, index: u8) {
        let Some(buttons) = SoftButtons::from_index(index) else {
            return;
        };
        let handler = match self.buttons.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        match handler {
            Some(handler) => handler(buttons),
            None => debug!(?buttons, "Soft button pressed with no subscriber"),
        }
    }

    /// Returns false once the applet should stop.
    fn handle_key(&self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char(c @ '1'..='4') => self.press(c as u8 - b'1'),
            KeyCode::Char('u') => self.unplug(),
            KeyCode::Char('p') => self.plug(),
            KeyCode::Char('r') => {
                if self.plugged.load(Ordering::SeqCst) {
                    self.control.bridge().notify_arrival(LcdDeviceType::Monochrome);
                }
            }
            KeyCode::Char('g') => self.control.bridge().notify_arrival(LcdDeviceType::Qvga),
            KeyCode::Char('e') => {
                let flags = self.control.flags();
                flags.set_applet_enabled(!flags.applet_enabled());
            }
            _ => {}
        }

        if let Err(err) = self.redraw(None) {
            warn!(error = %err, "Cannot redraw emulator");
        }
        true
    }
}

fn blank_rows() -> Vec<String> {
    vec![String::new(); PAGE_ROWS]
}

/// [`LcdManager`] backed by the terminal.
pub struct TerminalLcd {
    shared: Arc<Shared>,
}

impl TerminalLcd {
    /// Takes over the terminal and starts the key event thread.
    ///
    /// The display starts plugged in, so an arrival is signalled right
    /// away, as the vendor SDK does for a panel already attached.
    pub fn start(title: &str, control: AppletControl) -> Result<(Self, JoinHandle<()>)> {
        let terminal = setup_terminal()?;
        let shared = Arc::new(Shared {
            screen: Mutex::new(Screen {
                guard: TerminalGuard { terminal },
                title: format!(" {} ", title),
                rows: blank_rows(),
            }),
            control,
            plugged: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            buttons: Mutex::new(None),
        });

        shared.redraw(None)?;

        let events = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("lcd-events".into())
            .spawn(move || event_loop(events))?;

        shared.plug();
        info!("Terminal LCD emulator started");
        Ok((TerminalLcd { shared }, handle))
    }
}

fn event_loop(shared: Arc<Shared>) {
    while shared.control.is_running() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if !shared.handle_key(key) {
                        shared.control.terminate();
                    }
                }
                Ok(Event::Resize(_, _)) => {
                    let _ = shared.redraw(None);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "Cannot read terminal event");
                    shared.control.terminate();
                }
            },
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "Cannot poll terminal events");
                shared.control.terminate();
            }
        }
    }
    debug!("LCD event thread stopped");
}

impl LcdManager for TerminalLcd {
    type Device = TerminalLcdDevice;

    fn open_device_by_type(
        &self,
        device_type: LcdDeviceType,
        on_soft_buttons: SoftButtonHandler,
    ) -> Result<TerminalLcdDevice, DeviceError> {
        if device_type != LcdDeviceType::Monochrome {
            return Err(DeviceError::open_failed(device_type, "not emulated"));
        }
        if !self.shared.plugged.load(Ordering::SeqCst) {
            return Err(DeviceError::open_failed(device_type, "no display attached"));
        }

        match self.shared.buttons.lock() {
            Ok(mut buttons) => *buttons = Some(on_soft_buttons),
            Err(err) => return Err(DeviceError::open_failed(device_type, err.to_string())),
        }

        Ok(TerminalLcdDevice {
            shared: Arc::clone(&self.shared),
            generation: self.shared.generation.load(Ordering::SeqCst),
            foreground: false,
        })
    }
}

pub struct TerminalLcdDevice {
    shared: Arc<Shared>,
    generation: u64,
    foreground: bool,
}

impl LcdDevice for TerminalLcdDevice {
    fn reopen(&mut self) -> Result<(), DeviceError> {
        if self.is_disposed() {
            return Err(DeviceError::open_failed(
                LcdDeviceType::Monochrome,
                "display was unplugged",
            ));
        }
        debug!("Emulated display reopened");
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.shared.generation.load(Ordering::SeqCst) != self.generation
    }

    fn set_as_foreground(&mut self, foreground: bool) -> Result<(), DeviceError> {
        self.foreground = foreground;
        Ok(())
    }

    fn update_and_draw(&mut self, page: &RenderPage) -> Result<(), DeviceError> {
        if self.is_disposed() {
            return Err(DeviceError::DisposedMidFrame);
        }
        if !self.foreground {
            return Ok(());
        }
        self.shared
            .redraw(Some(page.to_rows(MONOCHROME_COLUMNS, PAGE_ROWS)))
            .map_err(|err| DeviceError::Io(err.to_string()))
    }
}
