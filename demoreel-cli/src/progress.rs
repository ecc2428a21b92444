//! Single-line render progress on stderr.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{Clear, ClearType},
    tty::IsTty,
};

const BAR_WIDTH: usize = 30;

pub struct ProgressLine {
    enabled: bool,
    last: Option<u8>,
}

impl ProgressLine {
    /// Progress is drawn only when enabled and stderr is a terminal.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: enabled && io::stderr().is_tty(),
            last: None,
        }
    }

    pub fn update(&mut self, percent: u8) {
        if !self.enabled || self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        let _ = draw(percent);
    }

    pub fn finish(&mut self) {
        if self.enabled && self.last.is_some() {
            eprintln!();
        }
        self.last = None;
    }
}

fn draw(percent: u8) -> io::Result<()> {
    let mut stderr = io::stderr();
    queue!(
        stderr,
        cursor::MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(bar(percent))
    )?;
    stderr.flush()
}

fn bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "rendering [{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}
