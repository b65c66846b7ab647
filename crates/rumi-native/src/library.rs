//! Cross-platform shared-library handles.
//!
//! Unix loads through `dlopen`, Windows through `LoadLibraryW`. Symbols are
//! only valid while the owning [`Library`] is alive; dropping it unloads the
//! library.

use std::path::Path;
use thiserror::Error;

/// Errors raised while opening a library or resolving a symbol in it.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The library could not be opened. `detail` carries the platform
    /// diagnostic (`dlerror` text or a Windows error code).
    #[error("cannot open library {path}: {detail}")]
    Open { path: String, detail: String },

    /// The symbol is not exported by the library.
    #[error("symbol {symbol} not found in {path}")]
    Symbol { symbol: String, path: String },

    /// A module init function ran but reported failure.
    #[error("init {symbol} in {path} returned {code}")]
    InitFailed {
        symbol: String,
        path: String,
        code: i32,
    },

    /// The path or symbol name cannot cross the C boundary.
    #[error("invalid library path or symbol: {0}")]
    BadName(String),
}

/// An open shared library.
#[derive(Debug)]
pub struct Library {
    raw: RawLibrary,
    path: String,
}

impl Library {
    /// Open the shared library at `path`.
    ///
    /// Symbols are resolved lazily and exported globally, so one native
    /// module can use symbols of a previously loaded one.
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| LibraryError::BadName(format!("{:?}", path)))?;
        let raw = RawLibrary::open(path_str)?;
        tracing::debug!(path = path_str, "opened shared library");
        Ok(Self {
            raw,
            path: path_str.to_string(),
        })
    }

    /// Resolve `name` to a value of type `T`.
    ///
    /// # Safety
    ///
    /// `T` must match the symbol's actual type, and the returned value must
    /// not outlive this library.
    pub unsafe fn symbol<T>(&self, name: &str) -> Result<T, LibraryError> {
        self.raw.symbol(name, &self.path)
    }

    /// The path this library was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(unix)]
type RawLibrary = unix::DlHandle;

#[cfg(windows)]
type RawLibrary = windows::DllHandle;

#[cfg(unix)]
mod unix {
    use super::LibraryError;
    use std::ffi::{CStr, CString};

    #[derive(Debug)]
    pub struct DlHandle {
        handle: *mut std::ffi::c_void,
    }

    /// Last `dlerror` text, if any.
    fn dl_error() -> Option<String> {
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned())
        }
    }

    impl DlHandle {
        pub fn open(path: &str) -> Result<Self, LibraryError> {
            let c_path =
                CString::new(path).map_err(|_| LibraryError::BadName(path.to_string()))?;
            let handle =
                unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY | libc::RTLD_GLOBAL) };
            if handle.is_null() {
                return Err(LibraryError::Open {
                    path: path.to_string(),
                    detail: dl_error().unwrap_or_else(|| "unknown error".to_string()),
                });
            }
            Ok(Self { handle })
        }

        pub unsafe fn symbol<T>(&self, name: &str, path: &str) -> Result<T, LibraryError> {
            let c_name =
                CString::new(name).map_err(|_| LibraryError::BadName(name.to_string()))?;
            // Clear any stale error before the lookup; a null return alone is
            // ambiguous since a symbol may legitimately be null.
            libc::dlerror();
            let symbol = libc::dlsym(self.handle, c_name.as_ptr());
            if symbol.is_null() || dl_error().is_some() {
                return Err(LibraryError::Symbol {
                    symbol: name.to_string(),
                    path: path.to_string(),
                });
            }
            Ok(std::mem::transmute_copy(&symbol))
        }
    }

    impl Drop for DlHandle {
        fn drop(&mut self) {
            unsafe {
                libc::dlclose(self.handle);
            }
        }
    }
}

#[cfg(windows)]
mod windows {
    use super::LibraryError;
    use std::ffi::CString;
    use std::os::windows::ffi::OsStrExt;

    extern "system" {
        fn LoadLibraryW(filename: *const u16) -> *mut std::ffi::c_void;
        fn GetProcAddress(
            module: *mut std::ffi::c_void,
            procname: *const i8,
        ) -> *mut std::ffi::c_void;
        fn FreeLibrary(module: *mut std::ffi::c_void) -> i32;
        fn GetLastError() -> u32;
    }

    #[derive(Debug)]
    pub struct DllHandle {
        handle: *mut std::ffi::c_void,
    }

    impl DllHandle {
        pub fn open(path: &str) -> Result<Self, LibraryError> {
            let wide: Vec<u16> = std::ffi::OsStr::new(path)
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();
            let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
            if handle.is_null() {
                return Err(LibraryError::Open {
                    path: path.to_string(),
                    detail: format!("error code {}", unsafe { GetLastError() }),
                });
            }
            Ok(Self { handle })
        }

        pub unsafe fn symbol<T>(&self, name: &str, path: &str) -> Result<T, LibraryError> {
            let c_name =
                CString::new(name).map_err(|_| LibraryError::BadName(name.to_string()))?;
            let symbol = GetProcAddress(self.handle, c_name.as_ptr());
            if symbol.is_null() {
                return Err(LibraryError::Symbol {
                    symbol: name.to_string(),
                    path: path.to_string(),
                });
            }
            Ok(std::mem::transmute_copy(&symbol))
        }
    }

    impl Drop for DllHandle {
        fn drop(&mut self) {
            unsafe {
                FreeLibrary(self.handle);
            }
        }
    }
}
