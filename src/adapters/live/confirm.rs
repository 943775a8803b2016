//! Live confirmation adapters.

use std::io::{self, BufRead, Write};

use crate::ports::Confirmation;
use crate::scan::ClassifiedShortcut;

/// Asks on the terminal before converting.
pub struct PromptConfirmation;

impl Confirmation for PromptConfirmation {
    fn confirm(&self, accepted: &[ClassifiedShortcut]) -> bool {
        let stdin = io::stdin();
        let stdout = io::stdout();
        match ask(&mut stdin.lock(), &mut stdout.lock(), accepted.len()) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "prompt failed; not converting");
                false
            }
        }
    }
}

/// Confirms without asking (`--yes`).
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&self, _accepted: &[ClassifiedShortcut]) -> bool {
        true
    }
}

/// Prompts until the answer is yes or quit. End of input counts as quit.
///
/// # Errors
///
/// Returns an error if reading or writing the terminal fails.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, count: usize) -> io::Result<bool> {
    loop {
        write!(output, "Convert {count} shortcut(s) into folder links? [Y]es / [Q]uit: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "q" | "quit" | "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer Y or Q.")?,
        }
    }
}
