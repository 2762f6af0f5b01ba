/// Terminal host: mouse hover/click routed through the pick dispatcher
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use simple3d_core::{Camera, EventKind};

pub mod cli;
pub mod config;
pub mod demo;
pub mod renderer;

pub use cli::Cli;
pub use config::{ConfigError, DemoConfig};
pub use demo::Demo;
pub use renderer::AsciiRenderer;

/// Camera orbit step per arrow key press (radians)
const ORBIT_STEP: f32 = 0.1;

/// Main application struct for the terminal demo
pub struct TerminalApp {
    config: DemoConfig,
    demo: Demo,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
}

impl TerminalApp {
    pub fn new(config: DemoConfig) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let mut renderer = AsciiRenderer::new(columns as usize, rows as usize);
        renderer.set_light_direction(config.light());

        Ok(Self {
            demo: Demo::new(config.delivery_mode),
            camera: config.camera(columns, rows),
            renderer,
            running: true,
            config,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        let cleanup = restore_all(
            || execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show),
            terminal::disable_raw_mode,
        );

        result.and(cleanup)
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = self.config.frame_time();
        let mut last_frame = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Drain pending input without blocking the frame
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            let dt = frame_start - last_frame;
            last_frame = frame_start;
            if self.demo.tick(dt) {
                self.render()?;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                self.renderer.resize(columns as usize, rows as usize);
                self.config.fit_aspect(&mut self.camera, columns, rows);
                self.demo.frame_loop.request_render();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('a') | KeyCode::Left => self.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.orbit(ORBIT_STEP, 0.0),
            KeyCode::Char('w') | KeyCode::Up => self.orbit(0.0, ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.orbit(0.0, -ORBIT_STEP),
            KeyCode::Char('m') => {
                self.demo.toggle_delivery_mode();
                self.demo.frame_loop.request_render();
            }
            _ => {}
        }
    }

    fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.camera.orbit(yaw, pitch);
        self.demo.frame_loop.request_render();
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        let event_kind = match kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => EventKind::Hover,
            MouseEventKind::Down(MouseButton::Left) => EventKind::Click,
            _ => return,
        };
        // Pointer at the centre of the cell, matching the renderer's rays
        let viewport = self.renderer.viewport();
        let (x, y) = (f32::from(column) + 0.5, f32::from(row) + 0.5);
        let before = self.demo.hovered();
        match self.demo.pointer(&self.camera, &viewport, x, y, &event_kind) {
            Ok(invoked) => log::debug!("terminal: {event_kind} at ({column}, {row}) ran {invoked} callback(s)"),
            Err(err) => log::warn!("terminal: {event_kind} at ({column}, {row}) failed: {err}"),
        }
        if self.demo.hovered() != before {
            self.demo.frame_loop.request_render();
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer
            .render_scene(&self.demo.scene, &self.camera, self.demo.hovered());

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        let hovered = self
            .demo
            .hovered()
            .and_then(|id| self.demo.scene.get(id))
            .map_or("-", |object| object.name.as_str());

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Simple3D | FPS: {:.1} | {:?} | hover: {} | clicks: {} | Mouse=pick WASD/Arrows=Orbit M=Mode Q=Quit",
                self.demo.frame_loop.stats().fps(),
                self.demo.dispatcher.mode(),
                hovered,
                self.demo.clicks(),
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Run both restore steps even if the first fails; the first error wins
fn restore_all<A, B>(screen: A, raw_mode: B) -> io::Result<()>
where
    A: FnOnce() -> io::Result<()>,
    B: FnOnce() -> io::Result<()>,
{
    let screen = screen();
    let raw_mode = raw_mode();
    screen.and(raw_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_raw_mode_is_restored_after_screen_failure() {
        let raw_mode_off = Cell::new(false);
        let result = restore_all(
            || Err(io::Error::new(io::ErrorKind::BrokenPipe, "screen")),
            || {
                raw_mode_off.set(true);
                Err(io::Error::new(io::ErrorKind::Other, "raw mode"))
            },
        );
        assert!(raw_mode_off.get());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_restore_reports_later_failure() {
        let result = restore_all(|| Ok(()), || Err(io::Error::new(io::ErrorKind::Other, "raw mode")));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::Other);
        assert!(restore_all(|| Ok(()), || Ok(())).is_ok());
    }
}
