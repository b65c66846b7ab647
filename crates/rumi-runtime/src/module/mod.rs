//! Module loading: resolution, dispatch, and at-most-once tracking.
//!
//! [`ModuleSystem`] owns the search path, the load ledger, and the three
//! loader collaborators. `load` always executes the resolved file; `require`
//! consults the ledger first and guarantees a module identified by its
//! canonical path runs at most once per process, even when requested under
//! different spellings (relative vs. absolute, symlink aliases, bare name
//! vs. explicit extension).

pub mod ledger;
pub mod resolver;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::ModuleError;
use crate::loaders::{BytecodeLoader, NativeLoader, SourceEvaluator};
use ledger::LoadLedger;
use resolver::{resolve, SearchPath};

/// Source file extension.
pub const SOURCE_EXT: &str = ".rumi";
/// Precompiled bytecode extension.
pub const BYTECODE_EXT: &str = ".rumc";

/// Extensions `require` recognizes, in tie-break order.
pub const REQUIRE_EXTS: &[&str] = &[SOURCE_EXT, BYTECODE_EXT];
/// Extensions `load` recognizes: source, bytecode, and native libraries.
pub const LOAD_EXTS: &[&str] = &[SOURCE_EXT, BYTECODE_EXT, ".so", ".dylib", ".dll"];

/// The module system for one runtime instance.
///
/// Single-threaded cooperative: re-entrancy happens only through nested,
/// synchronous calls made by a loader collaborator, never preemption.
pub struct ModuleSystem {
    search_path: SearchPath,
    ledger: LoadLedger,
    source: Rc<dyn SourceEvaluator>,
    bytecode: Rc<dyn BytecodeLoader>,
    native: Rc<dyn NativeLoader>,
}

impl ModuleSystem {
    /// Create a module system with the given collaborators and a search path
    /// seeded with the current directory.
    pub fn new(
        source: Rc<dyn SourceEvaluator>,
        bytecode: Rc<dyn BytecodeLoader>,
        native: Rc<dyn NativeLoader>,
    ) -> Self {
        Self {
            search_path: SearchPath::new(),
            ledger: LoadLedger::new(),
            source,
            bytecode,
            native,
        }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn search_path_mut(&mut self) -> &mut SearchPath {
        &mut self.search_path
    }

    /// Successfully required modules, canonical paths in load order.
    pub fn loaded_modules(&self) -> &[PathBuf] {
        self.ledger.loaded()
    }

    pub fn ledger(&self) -> &LoadLedger {
        &self.ledger
    }

    /// Resolve `name` and execute it unconditionally.
    ///
    /// The full extension set applies, so native libraries are eligible. The
    /// ledger is neither consulted nor updated: loading the same file twice
    /// runs it twice.
    pub fn load(&mut self, name: &str) -> Result<bool, ModuleError> {
        let path = resolve(name, LOAD_EXTS, &self.search_path)?;
        self.dispatch(&path)?;
        Ok(true)
    }

    /// Resolve `name` and execute it at most once.
    ///
    /// Only source and bytecode are eligible. Returns `Ok(false)` without
    /// touching any loader when the canonical path has already been loaded or
    /// is mid-load (a nested self-require sees the in-progress entry and
    /// backs off instead of recursing). A failed load is not committed; a
    /// later `require` of the same name starts over.
    pub fn require(&mut self, name: &str) -> Result<bool, ModuleError> {
        let path = resolve(name, REQUIRE_EXTS, &self.search_path)?;
        if self.ledger.already_handled(&path) {
            tracing::debug!(path = %path.display(), "already required, skipping");
            return Ok(false);
        }

        self.ledger.begin(path.clone());
        let result = self.dispatch(&path);
        // Runs on every exit path: always clears the in-progress mark,
        // commits only a successful load.
        self.ledger.finish(&path, result.is_ok());
        result.map(|()| true)
    }

    /// Invoke the collaborator selected by the resolved path's extension.
    fn dispatch(&mut self, path: &Path) -> Result<(), ModuleError> {
        // Clone the collaborator handle out first; it may re-enter `self`.
        match path.extension().and_then(|e| e.to_str()) {
            Some("rumc") => {
                let loader = Rc::clone(&self.bytecode);
                loader.load(self, path)
            }
            Some("rumi") => {
                // Scoped read: the handle is closed before evaluation starts.
                let text = std::fs::read_to_string(path)?;
                let label = path.display().to_string();
                let evaluator = Rc::clone(&self.source);
                evaluator.eval(self, path, &text, &label)
            }
            _ => {
                let loader = Rc::clone(&self.native);
                loader.load(self, path)
            }
        }
    }
}
