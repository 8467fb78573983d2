//! Stringification used by `print`, interpolation, and error messages.

use std::fmt;

use super::{StructFields, Value};

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Array(items) => {
                f.write_str("[")?;
                write_joined(f, &items.snapshot())?;
                f.write_str("]")
            }
            Value::Range(range) => {
                let delim = if range.inclusive { ".." } else { "..." };
                write!(f, "{}{delim}{}", range.start, range.end)
            }
            Value::Struct(inst) => {
                let name = &inst.definition.name;
                match inst.fields() {
                    StructFields::Named(fields) if fields.is_empty() => write!(f, "{name}"),
                    StructFields::Named(fields) => {
                        write!(f, "{name} {{ ")?;
                        for (idx, (field, value)) in fields.iter().enumerate() {
                            if idx > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{field}: {value}")?;
                        }
                        f.write_str(" }")
                    }
                    StructFields::Positional(slots) => {
                        write!(f, "{name} {{ ")?;
                        write_joined(f, &slots)?;
                        f.write_str(" }")
                    }
                }
            }
            Value::StructDefinition(def) => write!(f, "<struct {}>", def.name),
            Value::UnionDefinition(def) => write!(f, "<union {}>", def.name),
            Value::InterfaceDefinition(def) => write!(f, "<interface {}>", def.name),
            Value::Interface(iv) => write!(f, "{}", iv.underlying),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::FunctionOverload(overloads) => match overloads.first() {
                Some(first) => write!(f, "<function {}>", first.name()),
                None => f.write_str("<function>"),
            },
            Value::Native(native) => write!(f, "<native {}>", native.name),
            Value::BoundMethod(_) => f.write_str("<bound method>"),
            Value::Partial(_) => f.write_str("<partial function>"),
            Value::Proc(handle) => write!(f, "<proc #{}>", handle.id()),
            Value::Future(handle) => write!(f, "<future #{}>", handle.id()),
            Value::Iterator(_) => f.write_str("<iterator>"),
            Value::IteratorEnd => f.write_str("IteratorEnd"),
            Value::Generator(_) => f.write_str("<generator>"),
            Value::Package(pkg) => write!(f, "<package {}>", pkg.name),
            Value::DynRef(dyn_ref) => write!(f, "<dynref {}.{}>", dyn_ref.package, dyn_ref.name),
            Value::ImplNamespace(ns) => write!(f, "<impl {}>", ns.name),
            Value::Error(err) => f.write_str(&err.message),
            Value::Channel(ch) => write!(f, "<channel #{}>", ch.id()),
            Value::Mutex(m) => write!(f, "<mutex #{}>", m.id()),
        }
    }
}
