// src/services/operator.rs
//! Operator interaction.
//!
//! Console prompts stay behind [`Operator`] so the credential manager and
//! the request executor never touch the terminal.

use dialoguer::Confirm;
use log::warn;

/// Decisions delegated to whoever runs the tool.
pub trait Operator {
    /// Asks a yes/no question. Defaults to "no" when no answer can be read.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive terminal operator.
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn confirm(&self, prompt: &str) -> bool {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                warn!("Could not read an answer: {}", e);
                false
            })
    }
}

/// Operator that answers every prompt the same way (`--yes`, scripts).
pub struct FixedOperator(pub bool);

impl Operator for FixedOperator {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
