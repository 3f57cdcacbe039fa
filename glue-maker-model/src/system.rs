use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// A reference from a parameter to a named structural type: the registry file
/// that defines the type, the type name, and an optional size hint that is
/// carried onto the resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Registry file that defines the referenced type.
    pub file: PathBuf,
    /// Name of the referenced type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Optional size hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A named signal declaration of the input documents. The signal table is the
/// set of these declarations, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDecl {
    /// The name parameters refer to.
    pub name: String,
    /// The signal itself.
    #[serde(flatten)]
    pub signal: Signal,
}

/// The signal of a parameter, before and after resolution.
///
/// Input documents carry the `Named` form; the resolver replaces it in place
/// with the `Resolved` form. Dispatch never sees a `Named` signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalRef {
    /// Resolved against the signal table.
    Resolved(Signal),
    /// Only the declared name is known yet.
    Named(String),
}

/// A formal parameter of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Identifier of the parameter.
    pub id: String,
    /// The declared data type of the parameter.
    pub signal: SignalRef,
}

impl Parameter {
    /// The signal this parameter is bound to. Fails if resolution has not run,
    /// which is an internal invariant violation of the caller.
    pub fn bound_signal(&self) -> Result<&Signal> {
        match &self.signal {
            SignalRef::Resolved(signal) => Ok(signal),
            SignalRef::Named(name) => {
                bail!("Parameter {} still references unresolved signal {}", self.id, name)
            }
        }
    }
}

/// A subprogram-level container of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Identifier of the interface, unique across all input documents.
    pub id: String,
    /// The formal parameters, in declaration order.
    #[serde(default)]
    pub params: Vec<Parameter>,
}

/// The kind of container an implementation binds to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// A subprogram implementation.
    #[default]
    Subprogram,
    /// A thread implementation.
    Thread,
    /// A process implementation.
    Process,
}

/// One (interface, implementation, target language, verification name) unit of
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Id of the interface this entry implements.
    pub interface: String,
    /// Id of the implementation.
    pub implementation: String,
    /// Target language of the implementation. Absence means no implementation
    /// is bound and the entry is skipped by the dispatch engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Verification name forwarded to the backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fv_name: Option<String>,
    /// Kind of container the implementation lives in.
    #[serde(default)]
    pub kind: ContainerKind,
}

/// The merged content of the interface-description input documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDescription {
    /// The signal declarations.
    #[serde(default)]
    pub signals: Vec<SignalDecl>,
    /// The interfaces, keyed by id via [`interface`](#method.interface).
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    /// The implementations to generate glue for.
    #[serde(default)]
    pub implementations: Vec<CatalogEntry>,
}

impl SystemDescription {
    /// Load an interface-description document from a YAML file.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<SystemDescription> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read input file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid input file {}", path.display()))
    }

    /// Merge the content of another document into this one.
    pub fn merge(&mut self, other: SystemDescription) {
        self.signals.extend(other.signals);
        self.interfaces.extend(other.interfaces);
        self.implementations.extend(other.implementations);
    }

    /// The signal table: signal name to signal.
    pub fn signal_table(&self) -> HashMap<&str, &Signal> {
        self.signals
            .iter()
            .map(|decl| (decl.name.as_str(), &decl.signal))
            .collect()
    }

    /// The interface with the given id.
    pub fn interface(&self, id: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|interface| interface.id == id)
    }

    /// Mutable access to the interface with the given id.
    pub fn interface_mut(&mut self, id: &str) -> Option<&mut Interface> {
        self.interfaces
            .iter_mut()
            .find(|interface| interface.id == id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;

    use super::*;

    #[test]
    fn test_signal_ref_forms() {
        let named: SignalRef = serde_yaml::from_str("pos").unwrap();
        assert_eq!(named, SignalRef::Named("pos".into()));

        let resolved: SignalRef =
            serde_yaml::from_str("{ file: dataview.yaml, type: T-POS, size: 16 }").unwrap();
        assert_eq!(
            resolved,
            SignalRef::Resolved(Signal {
                file: PathBuf::from("dataview.yaml"),
                type_name: "T-POS".into(),
                size: Some(16),
            })
        );
    }

    #[test]
    fn test_bound_signal_before_resolution() {
        let param = Parameter {
            id: "x".into(),
            signal: SignalRef::Named("pos".into()),
        };
        let err = param.bound_signal().unwrap_err();
        assert_that!(err.to_string().as_str()).contains("pos");
        assert_that!(err.to_string().as_str()).contains("x");
    }

    #[test]
    fn test_merge_and_lookup() {
        let mut system: SystemDescription = serde_yaml::from_str(
            "interfaces:\n  - { id: compute, params: [ { id: x, signal: pos } ] }",
        )
        .unwrap();
        let other: SystemDescription = serde_yaml::from_str(
            "signals:\n  - { name: pos, file: dataview.yaml, type: T-POS }\n\
             implementations:\n  - { interface: compute, implementation: impl1, language: C }",
        )
        .unwrap();
        system.merge(other);

        assert_that!(system.interface("compute")).is_some();
        assert_that!(system.interface("missing")).is_none();
        assert_that!(system.signal_table().get("pos")).is_some();
        assert_that!(system.implementations).has_length(1);
        assert_eq!(system.implementations[0].kind, ContainerKind::Subprogram);
    }
}
