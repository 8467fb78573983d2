//! Module evaluation, the package registry, and imports.

use std::sync::Arc;

use able_diagnostic::Diagnostic;
use able_ir::ast::{Import, Module, Stmt};
use able_ir::Name;
use able_runtime::value::{DynRef, PackageValue};
use able_runtime::{Environment, EvalError, EvalResult, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{CallFrame, Interpreter};
use crate::exec::control::top_level_result;

/// Top-level definitions of one package.
#[derive(Clone, Default)]
pub(crate) struct PackageEntry {
    pub public: FxHashMap<Name, Value>,
    pub private: FxHashSet<Name>,
}

/// Packages by dotted name. Modules declaring the same package merge.
#[derive(Default)]
pub(crate) struct PackageRegistry {
    packages: FxHashMap<Name, PackageEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ImportError {
    #[error("Import error: package '{0}' not found")]
    PackageNotFound(Name),
    #[error("Import error: symbol '{0}' is private")]
    Private(Name),
    #[error("Import error: symbol '{symbol}' not found in package '{package}'")]
    MissingSymbol { package: Name, symbol: Name },
}

impl From<ImportError> for EvalError {
    fn from(err: ImportError) -> Self {
        EvalError::new(err.to_string())
    }
}

impl PackageRegistry {
    pub fn get(&self, package: &str) -> Option<&PackageEntry> {
        self.packages.get(package)
    }

    /// A public symbol of `package`.
    pub fn symbol(&self, package: &str, name: &Name) -> Result<Value, ImportError> {
        let entry = self
            .packages
            .get(package)
            .ok_or_else(|| ImportError::PackageNotFound(Name::new(package)))?;
        if entry.private.contains(name) {
            return Err(ImportError::Private(name.clone()));
        }
        entry
            .public
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::MissingSymbol {
                package: Name::new(package),
                symbol: name.clone(),
            })
    }

    fn register(&mut self, package: Name, entry: PackageEntry) {
        let existing = self.packages.entry(package).or_default();
        for name in entry.private {
            existing.public.remove(&name);
            existing.private.insert(name);
        }
        for (name, value) in entry.public {
            existing.private.remove(&name);
            existing.public.insert(name, value);
        }
    }
}

impl Interpreter {
    /// Evaluate a module: imports, then the body.
    ///
    /// A module with a package declaration runs in its own scope under the
    /// globals and then publishes its top-level definitions; one without
    /// runs in the current scope.
    #[tracing::instrument(level = "debug", skip_all, fields(package = ?module.package.as_ref().map(|p| p.qualified_name())))]
    pub fn eval_module(&mut self, module: &Module) -> EvalResult {
        let package = module
            .package
            .as_ref()
            .map(|decl| Name::new(decl.qualified_name()));
        let env = match package {
            Some(_) => self.shared.globals.child(),
            None => self.env.clone(),
        };
        let frame = CallFrame {
            receiver: None,
            package: package.clone(),
            placeholder: None,
        };

        let result = {
            let mut scoped = self.scoped_env(env.clone()).with_frame(frame);
            scoped.eval_module_body(module)
        };
        if let Some(package) = package {
            self.publish_package(package, &env, &module.body);
        }
        result
    }

    /// Evaluate a module after checking diagnostics from a static pass
    /// against the configured policy.
    pub fn eval_module_with_diagnostics(
        &mut self,
        module: &Module,
        diagnostics: &[Diagnostic],
    ) -> EvalResult {
        if let Some(blocking) = self.shared.diagnostic_policy.first_blocking(diagnostics) {
            let error = EvalError::new(format!("typecheck error: {}", blocking.message));
            return Err(match blocking.primary_span() {
                Some(span) => error.with_span(span),
                None => error,
            });
        }
        for diagnostic in diagnostics {
            tracing::warn!(
                severity = %diagnostic.severity,
                message = %diagnostic.message,
                "typecheck diagnostic"
            );
        }
        self.eval_module(module)
    }

    fn eval_module_body(&mut self, module: &Module) -> EvalResult {
        for import in &module.imports {
            self.eval_import(import)?;
        }
        top_level_result(self.eval_stmts(&module.body))
    }

    fn eval_import(&mut self, import: &Import) -> Result<(), EvalError> {
        let package = Name::new(import.qualified_name());
        let packages = self.shared.packages.read();

        if !import.selectors.is_empty() {
            for selector in &import.selectors {
                let value = if import.dynamic {
                    dyn_ref(&package, &selector.name)
                } else {
                    packages.symbol(package.as_str(), &selector.name)?
                };
                let binding = selector.alias.as_ref().unwrap_or(&selector.name);
                self.env.define(binding.clone(), value);
            }
            return Ok(());
        }

        let entry = packages.get(package.as_str());
        if import.wildcard {
            let entry = entry.ok_or_else(|| ImportError::PackageNotFound(package.clone()))?;
            for (name, value) in &entry.public {
                let value = if import.dynamic {
                    dyn_ref(&package, name)
                } else {
                    value.clone()
                };
                self.env.define(name.clone(), value);
            }
            return Ok(());
        }

        // Dynamic package values resolve every member against the registry.
        let symbols = match entry {
            Some(entry) if !import.dynamic => entry.public.clone(),
            Some(_) => FxHashMap::default(),
            None if import.dynamic => FxHashMap::default(),
            None => return Err(ImportError::PackageNotFound(package).into()),
        };
        let binding = import
            .alias
            .clone()
            .or_else(|| import.package_path.last().cloned())
            .unwrap_or_else(|| package.clone());
        self.env.define(
            binding,
            Value::Package(Arc::new(PackageValue {
                name: package,
                symbols,
            })),
        );
        Ok(())
    }

    fn publish_package(&self, package: Name, env: &Environment, body: &[Stmt]) {
        let mut entry = PackageEntry::default();
        for stmt in body {
            let Some((name, is_private)) = stmt.defined_name() else {
                continue;
            };
            if is_private {
                entry.private.insert(name.clone());
            } else if let Some(value) = env.lookup(name.as_str()) {
                entry.public.insert(name.clone(), value);
            }
        }
        tracing::debug!(
            package = %package,
            public = entry.public.len(),
            private = entry.private.len(),
            "package registered"
        );
        self.shared.packages.write().register(package, entry);
    }
}

fn dyn_ref(package: &Name, name: &Name) -> Value {
    Value::DynRef(Arc::new(DynRef {
        package: package.clone(),
        name: name.clone(),
    }))
}
