//! Interactive prompts on stdin.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    read_confirmation(io::stdin().lock())
}

/// Reads one answer line. Only `y` and `yes` confirm.
pub fn read_confirmation<R: BufRead>(mut reader: R) -> Result<bool> {
    let mut input = String::new();
    reader.read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Reads a secret value from stdin, prompting when attached to a terminal.
pub fn read_secret(prompt: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{}: ", prompt);
        io::stderr().flush()?;
    }

    let mut input = String::new();
    stdin.lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_confirmation() {
        assert!(read_confirmation("y\n".as_bytes()).unwrap());
        assert!(read_confirmation(" YES \n".as_bytes()).unwrap());
        assert!(!read_confirmation("n\n".as_bytes()).unwrap());
        assert!(!read_confirmation("\n".as_bytes()).unwrap());
        assert!(!read_confirmation("".as_bytes()).unwrap());
    }
}
