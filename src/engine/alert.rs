//! Notification sinks

use std::sync::Arc;
use tracing::{info, warn};

use crate::common::traits::Notifier;
use crate::common::types::AlertClass;

/// Writes notifications to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, lines: &[String], image: Option<AlertClass>) {
        let image = image.map(|i| i.key()).unwrap_or("-");
        info!("Notification [{}]: {}", image, lines.join(" | "));
    }
}

/// Hands notifications to an external program
///
/// Invoked as `<program> <image-key|-> <line>...`. The child is not awaited
/// and failures to start it are only logged.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(lines: &[String], image: Option<AlertClass>) -> Vec<String> {
        let mut args = Vec::with_capacity(lines.len() + 1);
        args.push(image.map(|i| i.key()).unwrap_or("-").to_string());
        args.extend(lines.iter().cloned());
        args
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, lines: &[String], image: Option<AlertClass>) {
        LogNotifier.notify(lines, image);
        let spawned = tokio::process::Command::new(&self.program)
            .args(Self::args(lines, image))
            .kill_on_drop(false)
            .spawn();
        if let Err(e) = spawned {
            warn!("Cannot run alert command {}: {}", self.program, e);
        }
    }
}

/// Sink for a configured `alert_command`, or the log when there is none
pub fn notifier_for(alert_command: Option<&str>) -> Arc<dyn Notifier> {
    match alert_command {
        Some(program) => Arc::new(CommandNotifier::new(program)),
        None => Arc::new(LogNotifier),
    }
}
