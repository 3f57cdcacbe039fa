use std::io::{self, Write};

use crate::{LeafKind, StructuralType};

/// Render the grammar of a registry back to its textual form.
///
/// Asynchronous backends that re-publish the data view of the system (e.g. the
/// SDL backend) dump the grammar of the registry file they collected from when
/// they shut down. Artificial types are omitted: they were never part of the
/// user-declared grammar.
pub fn write_grammar<W: Write>(out: &mut W, types: &[StructuralType]) -> io::Result<()> {
    writeln!(out, "Datamodel DEFINITIONS ::= BEGIN")?;
    writeln!(out)?;
    for ty in types.iter().filter(|ty| !ty.artificial) {
        match ty.leaf {
            LeafKind::Sequence | LeafKind::Set | LeafKind::Choice => {
                writeln!(out, "{} ::= {} {{", ty.name, ty.leaf)?;
                let mut members = ty.members.iter().peekable();
                while let Some(member) = members.next() {
                    let comma = if members.peek().is_some() { "," } else { "" };
                    writeln!(out, "    {} {}{}", member.name, member.type_name, comma)?;
                }
                writeln!(out, "}}")?;
            }
            LeafKind::SequenceOf | LeafKind::SetOf => {
                let elem = ty.contained.as_deref().unwrap_or("NULL");
                writeln!(out, "{} ::= {} {}", ty.name, ty.leaf, elem)?;
            }
            LeafKind::Enumerated => {
                let values = ty
                    .members
                    .iter()
                    .map(|member| member.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(out, "{} ::= ENUMERATED {{ {} }}", ty.name, values)?;
            }
            leaf => {
                writeln!(out, "{} ::= {}", ty.name, leaf)?;
            }
        }
    }
    writeln!(out)?;
    writeln!(out, "END")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Member;

    #[test]
    fn test_write_grammar() {
        let types = vec![
            StructuralType {
                name: "T-POS".into(),
                leaf: LeafKind::Sequence,
                members: vec![
                    Member {
                        name: "x".into(),
                        type_name: "T-Int".into(),
                    },
                    Member {
                        name: "y".into(),
                        type_name: "T-Int".into(),
                    },
                ],
                contained: None,
                artificial: false,
                size: None,
            },
            StructuralType {
                name: "T-Int".into(),
                leaf: LeafKind::Integer,
                members: vec![],
                contained: None,
                artificial: false,
                size: None,
            },
            StructuralType {
                name: "T-Hidden".into(),
                leaf: LeafKind::Integer,
                members: vec![],
                contained: None,
                artificial: true,
                size: None,
            },
        ];
        let mut out = Vec::new();
        write_grammar(&mut out, &types).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Datamodel DEFINITIONS ::= BEGIN\n\n\
             T-POS ::= SEQUENCE {\n    x T-Int,\n    y T-Int\n}\n\
             T-Int ::= INTEGER\n\n\
             END\n"
        );
    }
}
