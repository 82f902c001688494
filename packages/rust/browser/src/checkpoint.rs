//! Human-in-the-loop suspension points.
//!
//! A [`Checkpoint`] blocks the run until something outside the program says
//! to continue: a person pressing Enter after solving a login challenge, or
//! confirming the browser may close. There is no timeout.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use leetscribe_shared::{LeetscribeError, Result};
use tracing::debug;

/// Suspend until an external signal arrives.
#[allow(async_fn_in_trait)]
pub trait Checkpoint {
    async fn wait(&self, prompt: &str) -> Result<()>;
}

/// Resumes immediately. Used for unattended runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoResume;

impl Checkpoint for AutoResume {
    async fn wait(&self, prompt: &str) -> Result<()> {
        debug!(prompt, "auto-resuming checkpoint");
        Ok(())
    }
}

/// Prints the prompt and waits for a line on standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinCheckpoint;

impl Checkpoint for StdinCheckpoint {
    async fn wait(&self, prompt: &str) -> Result<()> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || read_confirmation(&prompt))
            .await
            .map_err(|e| LeetscribeError::Browser(format!("checkpoint task failed: {e}")))?
    }
}

fn read_confirmation(prompt: &str) -> Result<()> {
    let stdin_err = |e| LeetscribeError::io(PathBuf::from("<stdin>"), e);

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "\n[!] {prompt}").and_then(|_| stdout.flush()).map_err(stdin_err)?;
    drop(stdout);

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(stdin_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_resume_never_blocks() {
        AutoResume.wait("Solve any CAPTCHA").await.unwrap();
    }
}
