use anyhow::Result;
use console::{Key, Term};

mod prompt;
mod summary;

pub use prompt::prompt_yes_no;
pub use summary::{side_label, summary_line, Position};

/// A single keypress as far as the interactive loop cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Enter,
    Char(char),
    Other,
}

/// Where the interactive loop reads keys from and writes lines to.
pub trait Terminal {
    /// Blocks until the user presses a key. Keys aren't echoed.
    fn read_key(&mut self) -> Result<Keystroke>;
    fn clear(&mut self) -> Result<()>;
    fn write_line(&mut self, line: &str) -> Result<()>;
}

pub struct ConsoleTerminal {
    term: Term,
}

impl ConsoleTerminal {
    pub fn new_stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Terminal for ConsoleTerminal {
    fn read_key(&mut self) -> Result<Keystroke> {
        Ok(match self.term.read_key()? {
            Key::Enter => Keystroke::Enter,
            Key::Char('\n') | Key::Char('\r') => Keystroke::Enter,
            Key::Char(c) => Keystroke::Char(c),
            _ => Keystroke::Other,
        })
    }

    fn clear(&mut self) -> Result<()> {
        self.term.clear_screen()?;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.term.write_line(line)?;
        Ok(())
    }
}
