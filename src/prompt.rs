use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Blocking "press enter" gate between phases
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    /// Print `message` and wait for one line of input. Closed input is an error.
    pub fn confirm(&mut self, message: &str) -> Result<()> {
        write!(self.output, "{}", message).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("Failed to read confirmation")?;
        if n == 0 {
            anyhow::bail!("stdin closed before confirmation");
        }
        Ok(())
    }
}
