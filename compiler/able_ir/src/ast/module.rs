//! Module root: package declaration, imports, and body.

use super::Stmt;
use crate::Name;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Module {
    pub package: Option<PackageDecl>,
    pub imports: Vec<Import>,
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Module {
            package: None,
            imports: Vec::new(),
            body,
        }
    }
}

/// `package a.b`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDecl {
    pub name_path: Vec<Name>,
    pub is_private: bool,
}

impl PackageDecl {
    /// Dotted package name (`a.b`).
    pub fn qualified_name(&self) -> String {
        join_path(&self.name_path)
    }
}

/// `import a.b`, `import a.b::alias`, `import a.b.{x, y::z}`, `import a.b.*`,
/// or `dynimport a.b.{x}` when `dynamic`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub package_path: Vec<Name>,
    pub alias: Option<Name>,
    pub selectors: Vec<ImportSelector>,
    pub wildcard: bool,
    pub dynamic: bool,
}

impl Import {
    pub fn qualified_name(&self) -> String {
        join_path(&self.package_path)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSelector {
    pub name: Name,
    pub alias: Option<Name>,
}

fn join_path(path: &[Name]) -> String {
    path.iter()
        .map(Name::as_str)
        .collect::<Vec<_>>()
        .join(".")
}
