//! Loading the compiled artifact.

use std::path::Path;

use libloading::Library;

use crate::codegen::ENTRY_POINT;
use crate::NativeError;

/// Signature of the generated `evaluate` function.
pub(crate) type EntryFn = unsafe extern "C" fn(*const i64) -> i64;

/// Open `path` and bind its entry point.
///
/// The returned function pointer is only valid while the returned
/// [`Library`] is loaded; callers must keep the two together.
pub(crate) fn load(path: &Path) -> Result<(Library, EntryFn), NativeError> {
    // SAFETY: the artifact was just built from a unit containing nothing but
    // `evaluate`, so loading it runs no initialisers of ours.
    let library = unsafe { Library::new(path) }.map_err(|e| NativeError::LoadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // SAFETY: every generated unit defines `evaluate` with exactly the
    // `EntryFn` signature (see `codegen::compilation_unit`).
    let entry = unsafe { library.get::<EntryFn>(ENTRY_POINT.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|e| NativeError::MissingEntryPoint {
            symbol: ENTRY_POINT.to_string(),
            message: e.to_string(),
        })?;

    Ok((library, entry))
}
