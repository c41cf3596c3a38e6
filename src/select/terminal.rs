//! Terminal session for the selector: raw mode, event loop, editor hand-off
//!
//! Raw mode turns Ctrl-C into a key event, so an interactive interrupt
//! restores the terminal and ends the session as [`Outcome::Interrupted`].
//! A SIGINT sent from outside (`kill -INT`) is not routed through the loop:
//! the default handler ends the process without the guard's restore, and
//! the shell is left in raw mode until `reset` or `stty sane`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{self, DisableLineWrap, EnableLineWrap};
use crossterm::execute;

use crate::error::{Error, Result};

use super::clipboard;
use super::keys::action_for;
use super::render::Renderer;
use super::state::{Outcome, Selector};

const DEFAULT_EDITOR: &str = "vim";
const TTY_PATH: &str = "/dev/tty";

/// Raw mode with a hidden cursor for as long as the guard lives.
///
/// Drawing goes to the controlling terminal so stdout stays free for the
/// selected path; stderr stands in when there is no terminal to open.
struct TerminalGuard {
    out: Box<dyn Write>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        let out: Box<dyn Write> = match open_tty() {
            Some(tty) => Box::new(tty),
            None => Box::new(io::stderr()),
        };
        let mut guard = Self { out };
        guard.resume()?;
        Ok(guard)
    }

    fn resume(&mut self) -> Result<()> {
        terminal::enable_raw_mode().map_err(Error::Terminal)?;
        execute!(self.out, Hide, DisableLineWrap).map_err(Error::Terminal)
    }

    fn suspend(&mut self) -> Result<()> {
        execute!(self.out, Show, EnableLineWrap).map_err(Error::Terminal)?;
        terminal::disable_raw_mode().map_err(Error::Terminal)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.suspend();
    }
}

fn open_tty() -> Option<File> {
    OpenOptions::new().read(true).write(true).open(TTY_PATH).ok()
}

/// Viewport rows: the terminal height minus the status line.
fn viewport_height(rows: u16) -> usize {
    usize::from(rows).saturating_sub(1).max(1)
}

/// Run the selector until it yields a result. The terminal is restored on
/// every exit path, including errors and panics.
pub fn run(selector: &mut Selector<'_>, color: bool) -> Result<Outcome> {
    let mut guard = TerminalGuard::enter()?;
    let mut renderer = Renderer::new(color);
    if let Ok((_, rows)) = terminal::size() {
        selector.set_height(viewport_height(rows));
    }

    loop {
        renderer
            .draw(&mut guard.out, selector)
            .map_err(Error::Terminal)?;

        let event = event::read().map_err(Error::Terminal)?;
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let Some(action) = action_for(key) else {
                    continue;
                };
                match selector.apply(action) {
                    Outcome::Continue => {}
                    Outcome::Edit(path) => {
                        renderer.clear(&mut guard.out).map_err(Error::Terminal)?;
                        open_in_editor(&mut guard, &path)?;
                        renderer.reset();
                    }
                    outcome => {
                        renderer.clear(&mut guard.out).map_err(Error::Terminal)?;
                        if let Outcome::Yank(path) = &outcome {
                            clipboard::copy(&path.to_string_lossy());
                        }
                        return Ok(outcome);
                    }
                }
            }
            Event::Resize(_, rows) => selector.set_height(viewport_height(rows)),
            _ => {}
        }
    }
}

/// Run `$EDITOR` on `path` with the terminal back in cooked mode. The
/// editor's exit status is ignored.
fn open_in_editor(guard: &mut TerminalGuard, path: &Path) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
    let mut words = editor.split_whitespace();
    let program = words.next().unwrap_or(DEFAULT_EDITOR);

    let mut command = Command::new(program);
    command.args(words).arg(path);
    if let Some(tty) = open_tty() {
        let stdio = |file: &File| file.try_clone().map(Stdio::from).unwrap_or_else(|_| Stdio::inherit());
        command.stdin(stdio(&tty)).stdout(stdio(&tty)).stderr(stdio(&tty));
    }

    guard.suspend()?;
    if let Err(e) = command.status() {
        log::warn!("cannot run {}: {}", program, e);
    }
    guard.resume()
}
