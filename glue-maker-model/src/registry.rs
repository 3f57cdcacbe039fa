use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{LeafKind, StructuralType};

/// The ordered set of type definitions of a single registry document.
///
/// `types` keeps the declaration order of the document. Everything that walks
/// the registry iterates in this order; the generated output is reproducible
/// only because of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    /// Identifier of the file the definitions come from.
    #[serde(skip)]
    pub file: PathBuf,
    /// The type definitions, in declaration order.
    pub types: Vec<StructuralType>,
}

impl RegistryFile {
    /// Load a registry document from a YAML file.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<RegistryFile> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read registry file {}", path.display()))?;
        let mut registry: RegistryFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid registry file {}", path.display()))?;
        registry.file = path;
        Ok(registry)
    }

    /// The definition of the named type, if this file declares it.
    pub fn lookup(&self, name: &str) -> Option<&StructuralType> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// Mutable access to the definition of the named type.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut StructuralType> {
        self.types.iter_mut().find(|ty| ty.name == name)
    }
}

/// All the loaded registry files plus the global name tables built from them.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    /// The loaded files, in load order.
    files: Vec<RegistryFile>,
    /// Map from type name to its leaf classification, across all files.
    leaf_kinds: HashMap<String, LeafKind>,
    /// Map from type name to the file that defines it.
    exported_by: HashMap<String, PathBuf>,
}

impl TypeRegistry {
    /// Load every registry file of the list into a single registry.
    pub fn load_all(paths: &[PathBuf]) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::default();
        for path in paths {
            debug!("Parsing {}...", path.display());
            registry.add(RegistryFile::load(path)?)?;
        }
        Ok(registry)
    }

    /// Add an already loaded file to the registry. A type name exported by two
    /// different files is fatal: names must be unique across the run.
    pub fn add(&mut self, file: RegistryFile) -> Result<()> {
        for ty in &file.types {
            if self.leaf_kinds.insert(ty.name.clone(), ty.leaf).is_some() {
                bail!(
                    "Type {} is defined in more than one registry file (second one: {})",
                    ty.name,
                    file.file.display()
                );
            }
            self.exported_by.insert(ty.name.clone(), file.file.clone());
        }
        self.files.push(file);
        Ok(())
    }

    /// The loaded registry file with the given identifier.
    pub fn file(&self, path: &Path) -> Option<&RegistryFile> {
        self.files.iter().find(|file| file.file == path)
    }

    /// Mutable access to a loaded registry file.
    pub fn file_mut(&mut self, path: &Path) -> Option<&mut RegistryFile> {
        self.files.iter_mut().find(|file| file.file == path)
    }

    /// The declaration-ordered types of the given file, if it was loaded.
    pub fn types_of(&self, path: &Path) -> Option<&[StructuralType]> {
        self.file(path).map(|file| file.types.as_slice())
    }

    /// The leaf classification of the named type.
    pub fn leaf_kind(&self, name: &str) -> Option<LeafKind> {
        self.leaf_kinds.get(name).copied()
    }

    /// The global name to leaf classification table.
    pub fn leaf_kinds(&self) -> &HashMap<String, LeafKind> {
        &self.leaf_kinds
    }

    /// The file that exports the named type.
    pub fn defining_file(&self, name: &str) -> Option<&Path> {
        self.exported_by.get(name).map(PathBuf::as_path)
    }

    /// The definition of the named type, wherever it is defined.
    pub fn lookup(&self, name: &str) -> Option<&StructuralType> {
        let file = self.exported_by.get(name)?;
        self.file(file)?.lookup(name)
    }

    /// The set of type names reachable from `roots` without walking through an
    /// artificial container.
    ///
    /// Used by the `--prune-artificial-members` mode: a type referenced only as
    /// a member of an artificial wrapper is not part of the returned set and is
    /// therefore withheld from asynchronous backends.
    pub fn reachable_without_artificial<'a, I>(&self, roots: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut queue: Vec<&str> = roots.into_iter().collect();
        while let Some(name) = queue.pop() {
            if !seen.insert(name.to_string()) {
                continue;
            }
            let Some(def) = self.lookup(name) else {
                continue;
            };
            if def.artificial {
                // reachable itself, but nothing below it is
                continue;
            }
            for member in &def.members {
                if !member.type_name.is_empty() {
                    queue.push(&member.type_name);
                }
            }
            if let Some(contained) = &def.contained {
                queue.push(contained);
            }
        }
        seen
    }
}
