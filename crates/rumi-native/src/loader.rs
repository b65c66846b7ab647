//! Native module loading for the Rumi module system.

use std::cell::RefCell;
use std::path::Path;

use rumi_runtime::{ModuleError, ModuleSystem, NativeLoader};

use crate::library::{Library, LibraryError};

/// Init function every native module must export: returns zero on success.
type InitFn = unsafe extern "C" fn() -> i32;

/// Loads shared libraries as Rumi modules.
///
/// Each library must export an init function named after its file:
/// `geo-utils.so` exports `rumi_geo_utils_module_init`. Opened libraries are
/// retained for the life of the loader, since module code keeps pointing into
/// them after init returns.
#[derive(Default)]
pub struct SharedLibraryLoader {
    libraries: RefCell<Vec<Library>>,
}

impl SharedLibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of the libraries opened so far, in load order.
    pub fn loaded_paths(&self) -> Vec<String> {
        self.libraries
            .borrow()
            .iter()
            .map(|lib| lib.path().to_string())
            .collect()
    }

    fn open_and_init(&self, path: &Path) -> Result<(), LibraryError> {
        let library = Library::open(path)?;
        let symbol = entry_symbol(path);
        let init: InitFn = unsafe { library.symbol(&symbol)? };
        let code = unsafe { init() };
        if code != 0 {
            return Err(LibraryError::InitFailed {
                symbol,
                path: library.path().to_string(),
                code,
            });
        }
        tracing::debug!(path = library.path(), symbol = %symbol, "initialized native module");
        self.libraries.borrow_mut().push(library);
        Ok(())
    }
}

impl NativeLoader for SharedLibraryLoader {
    fn load(&self, _system: &mut ModuleSystem, path: &Path) -> Result<(), ModuleError> {
        self.open_and_init(path)
            .map_err(|e| ModuleError::Loader(e.to_string()))
    }
}

/// Init symbol for a library path: file stem with hyphens mapped to
/// underscores, wrapped as `rumi_{stem}_module_init`.
fn entry_symbol(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module");
    format!("rumi_{}_module_init", stem.replace('-', "_"))
}
