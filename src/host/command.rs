//! Host actions: run a shell command or just log the binding.

use std::process::Command;

use anyhow::{bail, Context};
use tracing::info;

use crate::config::{Binding, HandsignConfig};
use crate::dispatch::{Action, ActionRegistry, Detached};
use crate::hand::GestureId;

/// Runs a shell command and waits for it to exit.
#[derive(Debug, Clone)]
pub struct CommandAction {
    pub label: String,
    pub command: String,
}

impl CommandAction {
    pub fn new(label: &str, command: &str) -> Self {
        Self {
            label: label.to_string(),
            command: command.to_string(),
        }
    }

    fn shell(&self) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.command);
            cmd
        }
    }
}

impl Action for CommandAction {
    fn invoke(&mut self, gesture: GestureId) -> anyhow::Result<()> {
        info!("{} -> {}: {}", gesture, self.label, self.command);
        let status = self
            .shell()
            .status()
            .with_context(|| format!("spawning `{}`", self.command))?;
        if !status.success() {
            bail!("`{}` exited with {}", self.command, status);
        }
        Ok(())
    }
}

/// Logs the binding label without side effects.
#[derive(Debug, Clone)]
pub struct LogAction {
    pub label: String,
}

impl Action for LogAction {
    fn invoke(&mut self, gesture: GestureId) -> anyhow::Result<()> {
        info!("{} ({}) -> {}", gesture, gesture.display_name(), self.label);
        Ok(())
    }
}

/// How bindings are turned into actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionMode {
    /// Log instead of running commands.
    pub dry_run: bool,
    /// Run commands on worker threads.
    pub detach: bool,
}

/// Build the registry for every configured binding.
pub fn build_registry(config: &HandsignConfig, mode: ActionMode) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    for binding in &config.bindings {
        register_binding(&mut registry, binding, mode);
    }
    registry
}

fn register_binding(registry: &mut ActionRegistry, binding: &Binding, mode: ActionMode) {
    let Binding {
        gesture,
        label,
        command,
    } = binding;

    match command.as_deref() {
        Some(command) if !mode.dry_run => {
            let action = CommandAction::new(label, command);
            if mode.detach {
                registry.register(*gesture, Detached::new(action));
            } else {
                registry.register(*gesture, action);
            }
        }
        _ => registry.register(
            *gesture,
            LogAction {
                label: label.clone(),
            },
        ),
    }
}
