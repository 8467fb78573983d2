//! Struct construction: literals, functional update, and positional
//! constructor calls.

use std::sync::Arc;

use able_ir::ast::{StructDefinition, StructKind, StructLiteral, TypeExpr};
use able_ir::Name;
use able_runtime::value::{StructFields, StructInstance};
use able_runtime::{EvalError, EvalResult, Value};

use super::Interpreter;
use crate::resolver::types::uses_generics;
use crate::resolver::TypeRegistry;

impl Interpreter {
    pub(crate) fn eval_struct_literal(&mut self, lit: &StructLiteral) -> EvalResult {
        let def = self.struct_definition(&lit.struct_type)?;

        let mut sources = Vec::with_capacity(lit.update.len());
        for source in &lit.update {
            match self.eval_expr(source)? {
                Value::Struct(instance) if instance.definition.name == def.name => {
                    sources.push(instance);
                }
                other => {
                    return Err(EvalError::new(format!(
                        "Functional update source must be a '{}' instance, got {}",
                        def.name,
                        other.type_name()
                    )));
                }
            }
        }

        let fields = if lit.positional || def.kind == StructKind::Positional {
            let mut values = Vec::with_capacity(lit.fields.len());
            for field in &lit.fields {
                values.push(self.eval_expr(&field.value)?);
            }
            self.positional_fields(&def, values)?
        } else {
            let mut values: Vec<(Name, Option<Value>)> = def
                .fields
                .iter()
                .filter_map(|field| field.name.clone())
                .map(|name| (name, None))
                .collect();
            for source in &sources {
                if let StructFields::Named(existing) = source.fields() {
                    for (name, value) in existing {
                        if let Some(slot) = values.iter_mut().find(|(field, _)| *field == name) {
                            slot.1 = Some(value);
                        }
                    }
                }
            }
            for init in &lit.fields {
                let Some(name) = &init.name else {
                    return Err(EvalError::new(format!(
                        "Positional field in named struct literal for '{}'",
                        def.name
                    )));
                };
                let value = self.eval_expr(&init.value)?;
                let Some(slot) = values.iter_mut().find(|(field, _)| field == name) else {
                    return Err(EvalError::new(format!(
                        "Unknown field '{name}' in struct literal for '{}'",
                        def.name
                    )));
                };
                slot.1 = Some(value);
            }

            let registry = self.shared.registry.read();
            let mut fields = Vec::with_capacity(values.len());
            for (name, value) in values {
                let Some(value) = value else {
                    return Err(EvalError::new(format!(
                        "Missing field '{name}' in struct literal for '{}'",
                        def.name
                    )));
                };
                let declared = def
                    .fields
                    .iter()
                    .find(|field| field.name.as_ref() == Some(&name))
                    .map(|field| &field.ty);
                let value = match declared {
                    Some(ty) => coerce_field(&registry, &def, ty, value)?,
                    None => value,
                };
                fields.push((name, value));
            }
            StructFields::Named(fields)
        };

        Ok(Value::struct_instance(StructInstance::new(
            def,
            fields,
            lit.type_args.clone(),
        )))
    }

    /// `Point(1, 2)`: calling a struct definition. Named structs take their
    /// fields in declaration order.
    pub(crate) fn construct_positional(
        &self,
        def: &Arc<StructDefinition>,
        args: Vec<Value>,
    ) -> EvalResult {
        let fields = match def.kind {
            StructKind::Positional => self.positional_fields(def, args)?,
            StructKind::Singleton if args.is_empty() => StructFields::Named(Vec::new()),
            _ => {
                if args.len() != def.fields.len() {
                    return Err(field_count_mismatch(def, args.len()));
                }
                let registry = self.shared.registry.read();
                let mut fields = Vec::with_capacity(args.len());
                for (field, value) in def.fields.iter().zip(args) {
                    let Some(name) = field.name.clone() else {
                        continue;
                    };
                    fields.push((name, coerce_field(&registry, def, &field.ty, value)?));
                }
                StructFields::Named(fields)
            }
        };
        Ok(Value::struct_instance(StructInstance::new(
            Arc::clone(def),
            fields,
            Vec::new(),
        )))
    }

    fn positional_fields(
        &self,
        def: &Arc<StructDefinition>,
        values: Vec<Value>,
    ) -> Result<StructFields, EvalError> {
        if values.len() != def.fields.len() {
            return Err(field_count_mismatch(def, values.len()));
        }
        let registry = self.shared.registry.read();
        let mut slots = Vec::with_capacity(values.len());
        for (field, value) in def.fields.iter().zip(values) {
            slots.push(coerce_field(&registry, def, &field.ty, value)?);
        }
        Ok(StructFields::Positional(slots))
    }

    fn struct_definition(&self, name: &Name) -> Result<Arc<StructDefinition>, EvalError> {
        if let Some(Value::StructDefinition(def)) = self.env.lookup(name.as_str()) {
            return Ok(def);
        }
        self.shared
            .registry
            .read()
            .struct_def(name.as_str())
            .cloned()
            .ok_or_else(|| EvalError::new(format!("Unknown struct '{name}'")))
    }
}

/// Coerce a field value to its declared type when that type is concrete
/// and the value conforms.
fn coerce_field(
    registry: &TypeRegistry,
    def: &StructDefinition,
    ty: &TypeExpr,
    value: Value,
) -> EvalResult {
    let generics: Vec<Name> = def.generic_params.iter().map(|p| p.name.clone()).collect();
    if uses_generics(ty, &generics)
        || !registry.free_type_variables(ty).is_empty()
        || !registry.value_matches_type(&value, ty)
    {
        return Ok(value);
    }
    registry.coerce_to_type(value, ty)
}

fn field_count_mismatch(def: &StructDefinition, got: usize) -> EvalError {
    EvalError::new(format!(
        "Struct '{}' expects {} fields, got {got}",
        def.name,
        def.fields.len()
    ))
}
