//! Shared-library module loading for the Rumi runtime.
//!
//! Provides the [`rumi_runtime::NativeLoader`] collaborator: a cross-platform
//! `dlopen`/`LoadLibraryW` wrapper plus the per-library init-symbol protocol.

pub mod library;
pub mod loader;

pub use library::{Library, LibraryError};
pub use loader::SharedLibraryLoader;
