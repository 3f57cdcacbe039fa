//! Data model of the glue generator.
//!
//! This crate holds the pre-parsed form of the two kinds of input documents the
//! generator consumes: the interface descriptions (which interfaces exist, with
//! which parameters, bound to which implementations) and the structural-type
//! registries (the named type definitions the parameters refer to).
//!
//! Parsing of the source languages these documents come from happens upstream;
//! here they are plain serde-deserializable YAML. The important contract is
//! ordering: a [`RegistryFile`](struct.RegistryFile.html) keeps its types in
//! declaration order, and every consumer iterating over it must preserve that
//! order, because the reproducibility of the generated code depends on it.

#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod grammar;
mod registry;
mod system;
mod types;

pub use grammar::write_grammar;
pub use registry::{RegistryFile, TypeRegistry};
pub use system::{
    CatalogEntry, ContainerKind, Interface, Parameter, Signal, SignalDecl, SignalRef,
    SystemDescription,
};
pub use types::{LeafKind, Member, StructuralType};
