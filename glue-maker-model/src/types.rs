use std::fmt;

use serde::{Deserialize, Serialize};

/// Leaf classification of a structural type.
///
/// The four primitive kinds all route to the single `on_basic` backend hook,
/// while each structured kind has a hook of its own. `AsciiString` is part of
/// the grammar but is rejected as a direct parameter type: parameters must use
/// a fixed-width `OCTET STRING` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    /// The BOOLEAN primitive.
    #[serde(rename = "BOOLEAN")]
    Boolean,
    /// The INTEGER primitive.
    #[serde(rename = "INTEGER")]
    Integer,
    /// The REAL primitive.
    #[serde(rename = "REAL")]
    Real,
    /// The fixed-width OCTET STRING primitive.
    #[serde(rename = "OCTET STRING")]
    OctetString,
    /// Unbounded text. Never allowed as a parameter type.
    #[serde(rename = "IA5String")]
    AsciiString,
    /// An ordered product type.
    #[serde(rename = "SEQUENCE")]
    Sequence,
    /// An unordered product type.
    #[serde(rename = "SET")]
    Set,
    /// A sum type.
    #[serde(rename = "CHOICE")]
    Choice,
    /// An ordered homogeneous collection.
    #[serde(rename = "SEQUENCE OF")]
    SequenceOf,
    /// An unordered homogeneous collection.
    #[serde(rename = "SET OF")]
    SetOf,
    /// An enumeration of named values.
    #[serde(rename = "ENUMERATED")]
    Enumerated,
}

impl LeafKind {
    /// Whether this is one of the four primitive kinds served by `on_basic`.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            LeafKind::Boolean | LeafKind::Integer | LeafKind::Real | LeafKind::OctetString
        )
    }

    /// Whether this is one of the six structured kinds with a dedicated hook.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            LeafKind::Sequence
                | LeafKind::Set
                | LeafKind::Choice
                | LeafKind::SequenceOf
                | LeafKind::SetOf
                | LeafKind::Enumerated
        )
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let spelling = match self {
            LeafKind::Boolean => "BOOLEAN",
            LeafKind::Integer => "INTEGER",
            LeafKind::Real => "REAL",
            LeafKind::OctetString => "OCTET STRING",
            LeafKind::AsciiString => "IA5String",
            LeafKind::Sequence => "SEQUENCE",
            LeafKind::Set => "SET",
            LeafKind::Choice => "CHOICE",
            LeafKind::SequenceOf => "SEQUENCE OF",
            LeafKind::SetOf => "SET OF",
            LeafKind::Enumerated => "ENUMERATED",
        };
        write!(f, "{}", spelling)
    }
}

/// A named member of a SEQUENCE, SET, CHOICE or ENUMERATED type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Name of the field (or of the enumerated value).
    pub name: String,
    /// Name of the member's type. Empty for enumerated values.
    #[serde(rename = "type", default)]
    pub type_name: String,
}

/// A named type definition from a registry file.
///
/// Instances are created and owned by the registry; the dispatch engine only
/// reads them and, for parameter-bound types, annotates `size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralType {
    /// Name of the type, unique within its registry file.
    pub name: String,
    /// Leaf classification.
    pub leaf: LeafKind,
    /// Ordered fields, for the product/sum kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    /// Element type name, for the homogeneous collection kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contained: Option<String>,
    /// True for types synthesized internally by the registry (anonymous inner
    /// types). These are never user-declared and never routed to a backend.
    #[serde(default)]
    pub artificial: bool,
    /// Size hint, attached when the type is bound to a resolved parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
