//! Loader collaborator traits.
//!
//! The module system resolves names and keeps the load ledger; interpreting
//! file content is delegated to these collaborators. Each receives the module
//! system itself so that code executed during a load can issue nested loads
//! of its own.

use std::path::Path;

use crate::error::ModuleError;
use crate::module::ModuleSystem;

/// Loads and executes a precompiled bytecode module.
pub trait BytecodeLoader {
    fn load(&self, system: &mut ModuleSystem, path: &Path) -> Result<(), ModuleError>;
}

/// Parses and executes textual source.
///
/// `label` is the attribution string for error reporting; the module system
/// passes the canonical path.
pub trait SourceEvaluator {
    fn eval(
        &self,
        system: &mut ModuleSystem,
        path: &Path,
        source: &str,
        label: &str,
    ) -> Result<(), ModuleError>;
}

/// Loads a platform shared library as a module.
pub trait NativeLoader {
    fn load(&self, system: &mut ModuleSystem, path: &Path) -> Result<(), ModuleError>;
}
