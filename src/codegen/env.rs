use std::any::Any;
use std::sync::Arc;

use crate::log::SharedLogger;
use crate::parsing::FileParsingResult;

/* -------------------------------------------------------------------------- */
/*                             Struct: CodeGenEnv                             */
/* -------------------------------------------------------------------------- */

/// `CodeGenEnv` is the per-pass scratchpad threaded through every generation
/// hook: the parsing result of the file currently being generated for, the
/// shared logger, and a free-form extension slot units use to expose their
/// own state (section selectors, first-entity flags) to property generators.
///
/// A unit creates one environment at the start of a generation pass and the
/// environment dies with the pass.
pub struct CodeGenEnv {
    extension: Option<Box<dyn Any + Send>>,
    file_result: Option<Arc<FileParsingResult>>,
    logger: SharedLogger,
}

impl CodeGenEnv {
    pub fn new(logger: SharedLogger) -> Self {
        CodeGenEnv {
            extension: None,
            file_result: None,
            logger,
        }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// `file_result` is the parsing result of the file currently flowing
    /// through the generators, if a generation stage set one.
    pub fn file_result(&self) -> Option<&Arc<FileParsingResult>> {
        self.file_result.as_ref()
    }

    /// `file_result_arc` clones the handle out, releasing the borrow on the
    /// environment so generators can keep resolving entities while mutating
    /// it.
    pub fn file_result_arc(&self) -> Option<Arc<FileParsingResult>> {
        self.file_result.clone()
    }

    pub fn set_file_result(&mut self, result: Arc<FileParsingResult>) {
        self.file_result = Some(result);
    }

    /// `set_extension` installs unit-specific state into the extension slot,
    /// replacing whatever was there.
    pub fn set_extension<T: Any + Send>(&mut self, value: T) {
        self.extension = Some(Box::new(value));
    }

    pub fn extension<T: Any + Send>(&self) -> Option<&T> {
        self.extension.as_ref()?.downcast_ref()
    }

    pub fn extension_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.extension.as_mut()?.downcast_mut()
    }
}
