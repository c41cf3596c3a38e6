//! In-place drawing of the selector below the prompt

use std::io::{self, Write};

use crossterm::cursor::{MoveToColumn, MoveToPreviousLine};
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use termcolor::{Ansi, NoColor};

use crate::output::write_row;

use super::state::Selector;

const STATUS_KEYS: &str = "↑↓ move  ←→ fold  o open  ⏎ select  y yank  q quit";

/// Redraws the viewport over the previous frame, one terminal line per row
/// plus a status line. The cursor is left on the status line.
#[derive(Debug, Default)]
pub struct Renderer {
    /// Lines of the last frame, status line included.
    drawn: usize,
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { drawn: 0, color }
    }

    /// Forget the last frame, e.g. after an editor took over the screen.
    pub fn reset(&mut self) {
        self.drawn = 0;
    }

    pub fn draw<W: Write>(&mut self, out: &mut W, selector: &Selector<'_>) -> io::Result<()> {
        self.rewind(out)?;
        queue!(out, Clear(ClearType::FromCursorDown))?;

        let end = selector
            .rows()
            .len()
            .min(selector.scroll().saturating_add(selector.height()));
        let mut lines = 0;
        for index in selector.scroll()..end {
            let row = &selector.rows()[index];
            let Some(node) = row.node(selector.roots()) else {
                continue;
            };
            let selected = index == selector.cursor();
            let line = if self.color && !selected {
                let mut buf = Ansi::new(Vec::new());
                write_row(&mut buf, row, node, selector.layout(), selector.icons())?;
                buf.into_inner()
            } else {
                let mut buf = NoColor::new(Vec::new());
                write_row(&mut buf, row, node, selector.layout(), selector.icons())?;
                buf.into_inner()
            };
            if selected {
                queue!(out, SetAttribute(Attribute::Reverse))?;
            }
            out.write_all(&line)?;
            if selected {
                queue!(out, SetAttribute(Attribute::Reset))?;
            }
            continue_line(out)?;
            lines += 1;
        }

        queue!(out, SetAttribute(Attribute::Dim))?;
        write!(
            out,
            "{}  {}/{}",
            STATUS_KEYS,
            selector.cursor() + 1,
            selector.rows().len()
        )?;
        queue!(out, SetAttribute(Attribute::Reset))?;
        out.flush()?;
        self.drawn = lines + 1;
        Ok(())
    }

    /// Erase the last frame, leaving the cursor where it started.
    pub fn clear<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.rewind(out)?;
        queue!(out, Clear(ClearType::FromCursorDown))?;
        out.flush()?;
        self.drawn = 0;
        Ok(())
    }

    fn rewind<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.drawn > 1 {
            let up = u16::try_from(self.drawn - 1).unwrap_or(u16::MAX);
            queue!(out, MoveToPreviousLine(up))?;
        } else {
            queue!(out, MoveToColumn(0))?;
        }
        Ok(())
    }
}

/// Raw mode does not translate `\n`.
fn continue_line<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(b"\r\n")
}
