//! Integration tests for module loading
//!
//! Exercises the resolve → ledger → dispatch pipeline end to end with
//! recording loader collaborators standing in for the real evaluator,
//! bytecode reader, and shared-library loader.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rumi_runtime::{
    BytecodeLoader, ModuleError, ModuleSystem, NativeLoader, SearchPath, SourceEvaluator,
};
use tempfile::TempDir;

/// Per-collaborator call log shared between the mocks and the assertions.
#[derive(Default)]
struct CallLog {
    source: RefCell<Vec<PathBuf>>,
    bytecode: RefCell<Vec<PathBuf>>,
    native: RefCell<Vec<PathBuf>>,
}

struct RecordingSource {
    log: Rc<CallLog>,
    fail: Cell<bool>,
}

impl SourceEvaluator for RecordingSource {
    fn eval(
        &self,
        _system: &mut ModuleSystem,
        path: &Path,
        _source: &str,
        label: &str,
    ) -> Result<(), ModuleError> {
        assert_eq!(label, path.display().to_string());
        self.log.source.borrow_mut().push(path.to_path_buf());
        if self.fail.get() {
            return Err(ModuleError::Loader(format!("parse failure in {label}")));
        }
        Ok(())
    }
}

struct RecordingBytecode {
    log: Rc<CallLog>,
}

impl BytecodeLoader for RecordingBytecode {
    fn load(&self, _system: &mut ModuleSystem, path: &Path) -> Result<(), ModuleError> {
        self.log.bytecode.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

struct RecordingNative {
    log: Rc<CallLog>,
}

impl NativeLoader for RecordingNative {
    fn load(&self, _system: &mut ModuleSystem, path: &Path) -> Result<(), ModuleError> {
        self.log.native.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Module system whose search path is exactly `dirs`, with recording mocks.
fn system_over(dirs: &[&Path]) -> (ModuleSystem, Rc<CallLog>, Rc<RecordingSource>) {
    let log = Rc::new(CallLog::default());
    let source = Rc::new(RecordingSource {
        log: Rc::clone(&log),
        fail: Cell::new(false),
    });
    let mut system = ModuleSystem::new(
        Rc::clone(&source) as Rc<dyn SourceEvaluator>,
        Rc::new(RecordingBytecode { log: Rc::clone(&log) }),
        Rc::new(RecordingNative { log: Rc::clone(&log) }),
    );
    let mut sp = SearchPath::empty();
    for dir in dirs {
        sp.push(*dir);
    }
    *system.search_path_mut() = sp;
    (system, log, source)
}

#[test]
fn require_twice_loads_once() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mod_a.rumi"), "").unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    assert!(system.require("mod_a").unwrap());
    assert!(!system.require("mod_a").unwrap());
    assert_eq!(log.source.borrow().len(), 1);
    assert_eq!(system.loaded_modules().len(), 1);
}

#[test]
fn require_short_circuits_across_aliases() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mod_a.rumi"), "").unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    assert!(system.require("mod_a").unwrap());
    // Same file under an explicit extension and under an absolute path.
    assert!(!system.require("mod_a.rumi").unwrap());
    let absolute = dir.path().join("mod_a").to_str().unwrap().to_string();
    assert!(!system.require(&absolute).unwrap());
    assert_eq!(log.source.borrow().len(), 1);
}

#[cfg(unix)]
#[test]
fn require_short_circuits_through_symlinks() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("real.rumi"), "").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.rumi"), dir.path().join("alias.rumi"))
        .unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    assert!(system.require("real").unwrap());
    assert!(!system.require("alias").unwrap());
    assert_eq!(log.source.borrow().len(), 1);
}

#[test]
fn load_never_consults_the_ledger() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("mod_a.rumi"), "").unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    assert!(system.load("mod_a").unwrap());
    assert!(system.load("mod_a").unwrap());
    assert_eq!(log.source.borrow().len(), 2);
    assert!(system.loaded_modules().is_empty());

    // A later require still runs the loader: load committed nothing.
    assert!(system.require("mod_a").unwrap());
    assert_eq!(log.source.borrow().len(), 3);
}

#[test]
fn dispatch_selects_loader_by_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("text.rumi"), "").unwrap();
    fs::write(dir.path().join("compiled.rumc"), "").unwrap();
    fs::write(dir.path().join("ext.so"), "").unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    assert!(system.load("text").unwrap());
    assert!(system.load("compiled").unwrap());
    assert!(system.load("ext").unwrap());
    assert_eq!(log.source.borrow().len(), 1);
    assert_eq!(log.bytecode.borrow().len(), 1);
    assert_eq!(log.native.borrow().len(), 1);
}

#[test]
fn require_refuses_native_extensions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ext.so"), "").unwrap();
    let (mut system, log, _) = system_over(&[dir.path()]);

    let err = system.require("ext").unwrap_err();
    assert!(matches!(err, ModuleError::NotFound { .. }));
    assert!(log.native.borrow().is_empty());
}

#[test]
fn failed_require_is_retryable() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.rumi"), "").unwrap();
    let (mut system, log, source) = system_over(&[dir.path()]);

    source.fail.set(true);
    let err = system.require("broken").unwrap_err();
    assert!(matches!(err, ModuleError::Loader(_)));
    // Neither loaded nor stuck in progress.
    assert!(system.loaded_modules().is_empty());
    assert_eq!(system.ledger().in_progress_count(), 0);

    source.fail.set(false);
    assert!(system.require("broken").unwrap());
    assert_eq!(log.source.borrow().len(), 2);
}

#[test]
fn missing_module_error_names_the_request() {
    let dir = TempDir::new().unwrap();
    let (mut system, _, _) = system_over(&[dir.path()]);

    let err = system.require("does_not_exist").unwrap_err();
    assert!(format!("{}", err).contains("does_not_exist"));

    *system.search_path_mut() = SearchPath::empty();
    let err = system.require("does_not_exist").unwrap_err();
    assert!(format!("{}", err).contains("does_not_exist"));
}

#[test]
fn first_directory_shadows_later_extensions() {
    // SearchPath = [lib, root]; lib/foo.rumi and root/foo.rumc both exist.
    // Directory order wins over extension order.
    let root = TempDir::new().unwrap();
    let lib = root.path().join("lib");
    fs::create_dir(&lib).unwrap();
    fs::write(lib.join("foo.rumi"), "").unwrap();
    fs::write(root.path().join("foo.rumc"), "").unwrap();
    let (mut system, log, _) = system_over(&[lib.as_path(), root.path()]);

    assert!(system.require("foo").unwrap());
    assert_eq!(log.bytecode.borrow().len(), 0);
    assert_eq!(
        log.source.borrow().as_slice(),
        &[lib.join("foo.rumi").canonicalize().unwrap()]
    );
}

#[test]
fn loaded_modules_keep_load_order() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("first.rumi"), "").unwrap();
    fs::write(dir.path().join("second.rumc"), "").unwrap();
    let (mut system, _, _) = system_over(&[dir.path()]);

    system.require("first").unwrap();
    system.require("second").unwrap();
    assert_eq!(
        system.loaded_modules(),
        &[
            dir.path().join("first.rumi").canonicalize().unwrap(),
            dir.path().join("second.rumc").canonicalize().unwrap(),
        ]
    );
}

/// Evaluator that immediately requires its own module again, as a module
/// whose source contains `require("cyclic")` would.
struct SelfRequiringSource {
    inner_results: Rc<RefCell<Vec<bool>>>,
}

impl SourceEvaluator for SelfRequiringSource {
    fn eval(
        &self,
        system: &mut ModuleSystem,
        _path: &Path,
        _source: &str,
        _label: &str,
    ) -> Result<(), ModuleError> {
        let again = system.require("cyclic")?;
        self.inner_results.borrow_mut().push(again);
        Ok(())
    }
}

#[test]
fn self_cycle_returns_false_instead_of_recursing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("cyclic.rumi"), "").unwrap();

    let log = Rc::new(CallLog::default());
    let inner_results = Rc::new(RefCell::new(Vec::new()));
    let mut system = ModuleSystem::new(
        Rc::new(SelfRequiringSource {
            inner_results: Rc::clone(&inner_results),
        }),
        Rc::new(RecordingBytecode { log: Rc::clone(&log) }),
        Rc::new(RecordingNative { log: Rc::clone(&log) }),
    );
    let mut sp = SearchPath::empty();
    sp.push(dir.path());
    *system.search_path_mut() = sp;

    assert!(system.require("cyclic").unwrap());
    // The nested require found the in-progress entry and backed off.
    assert_eq!(inner_results.borrow().as_slice(), &[false]);
    assert_eq!(system.loaded_modules().len(), 1);
    assert_eq!(system.ledger().in_progress_count(), 0);
}
