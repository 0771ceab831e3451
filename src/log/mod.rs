use derive_more::Display;
use std::sync::Arc;

/* -------------------------------------------------------------------------- */
/*                             Enum: LogSeverity                              */
/* -------------------------------------------------------------------------- */

/// `LogSeverity` classifies messages emitted through a [`Logger`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

/* -------------------------------------------------------------------------- */
/*                                Trait: Logger                               */
/* -------------------------------------------------------------------------- */

/// `Logger` is the sink every engine stage reports through. The engine shares
/// one logger across all worker threads, so implementations must be
/// thread-safe.
pub trait Logger: Send + Sync {
    fn log(&self, severity: LogSeverity, message: &str);
}

/// `SharedLogger` is the handle threaded through parsing and generation
/// contexts.
pub type SharedLogger = Arc<dyn Logger>;

/* -------------------------------------------------------------------------- */
/*                            Struct: DefaultLogger                           */
/* -------------------------------------------------------------------------- */

/// `DefaultLogger` forwards messages to the `tracing` subscriber installed by
/// the program entry point.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLogger;

/* ------------------------------ Impl: Logger ------------------------------ */

impl Logger for DefaultLogger {
    fn log(&self, severity: LogSeverity, message: &str) {
        match severity {
            LogSeverity::Info => tracing::info!("{message}"),
            LogSeverity::Warning => tracing::warn!("{message}"),
            LogSeverity::Error => tracing::error!("{message}"),
        }
    }
}
