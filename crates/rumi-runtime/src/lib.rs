//! Rumi runtime module system.
//!
//! Resolves logical module names to canonical filesystem paths, dispatches
//! them to the configured loaders by extension, and guarantees that `require`
//! loads a module at most once per process, even under path aliasing.
//!
//! Interpreting module content is out of scope here: source evaluation,
//! bytecode loading, and shared-library loading are collaborator traits in
//! [`loaders`]; `rumi-native` provides the shared-library one.

pub mod error;
pub mod loaders;
pub mod module;

pub use error::ModuleError;
pub use loaders::{BytecodeLoader, NativeLoader, SourceEvaluator};
pub use module::ledger::LoadLedger;
pub use module::resolver::{resolve, SearchPath};
pub use module::{ModuleSystem, BYTECODE_EXT, LOAD_EXTS, REQUIRE_EXTS, SOURCE_EXT};
