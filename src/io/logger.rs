use std::fmt;
use tracing::Level;

/// Diagnostic sink for [`RemoteRangeReader`](super::RemoteRangeReader).
///
/// Messages are purely observational; a reader without a logger behaves
/// exactly like one with.
pub trait Logger: Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);
    fn debug(&self, args: fmt::Arguments<'_>);
}

/// Forwards messages to `tracing`, dropping those above its own level.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    level: Level,
}

impl TracingLogger {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// `DEBUG` when verbose, otherwise `INFO`.
    pub fn verbose(verbose: bool) -> Self {
        Self::new(if verbose { Level::DEBUG } else { Level::INFO })
    }
}

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        if self.level >= Level::INFO {
            tracing::info!("{}", args);
        }
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        if self.level >= Level::DEBUG {
            tracing::debug!("{}", args);
        }
    }
}
