//! The concrete backends.
//!
//! One module per backend. The emission here is intentionally thin: the value
//! of a backend is *when* its hooks run, and each module only turns the calls
//! it receives into a small, readable artifact.

/// The Ada backend.
pub mod ada;
/// The C backend.
pub mod c;
/// The PySide backend.
pub mod pyside;
/// The Python backend.
pub mod python;
/// The SDL backend.
pub mod sdl;
/// The VHDL backend.
pub mod vhdl;

/// Turn a registry type name into an identifier valid in most target
/// languages.
pub(crate) fn clean_name(name: &str) -> String {
    name.replace('-', "_")
}
