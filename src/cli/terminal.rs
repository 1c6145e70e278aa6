use console::Term;
use dialoguer::Input;
use std::io::{self, BufRead, Write};

use crate::cli::Spinner;

/// Everything the dispatcher needs from the interactive user.
pub trait Terminal: Send {
    fn print(&mut self, text: &str);

    /// `Ok(None)` means the user is gone (end of input or interrupt).
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// y/N question; anything but `y` is a no.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self
            .read_line(prompt)?
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
    }

    fn spinner(&self, _message: &str) -> Option<Spinner> {
        None
    }
}

/// Real terminal: dialoguer line editing on a tty, plain stdin otherwise.
pub struct ConsoleTerminal {
    interactive: bool,
}

impl ConsoleTerminal {
    pub fn new() -> Self {
        Self {
            interactive: Term::stdout().is_term() && Term::stderr().is_term(),
        }
    }
}

impl Default for ConsoleTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ConsoleTerminal {
    fn print(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.interactive {
            print!("{prompt} ");
            io::stdout().flush()?;
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            return Ok((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()));
        }

        let result = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text();

        match result {
            Ok(line) => Ok(Some(line)),
            Err(dialoguer::Error::IO(e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
                ) =>
            {
                Ok(None)
            }
            Err(dialoguer::Error::IO(e)) => Err(e),
        }
    }

    fn spinner(&self, message: &str) -> Option<Spinner> {
        self.interactive.then(|| Spinner::new(message))
    }
}
