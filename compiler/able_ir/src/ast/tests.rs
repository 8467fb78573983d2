use super::build::*;
use super::*;
use crate::Name;
use pretty_assertions::assert_eq;

#[test]
fn pattern_bound_names_in_source_order() {
    let pattern = p_array(
        vec![
            p_ident("first"),
            p_struct(Some("Point"), vec![("x", p_ident("px")), ("y", p_wild())]),
        ],
        Some("rest"),
    );
    let names: Vec<String> = pattern
        .bound_names()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["first", "px", "rest"]);
}

#[test]
fn placeholder_detection_stops_at_lambdas() {
    assert!(bin(BinaryOp::Add, placeholder(), int(1)).contains_placeholder());
    assert!(call_named("f", vec![placeholder_at(2)]).contains_placeholder());
    assert!(!lambda(&["x"], placeholder()).contains_placeholder());
    assert!(!bin(BinaryOp::Add, int(2), int(1)).contains_placeholder());
}

#[test]
fn expects_self_rules() {
    assert!(method("area", &[], vec![]).expects_self());
    assert!(!function("new", &["x"], vec![]).expects_self());

    let mut shorthand = function("area", &[], vec![]);
    shorthand.is_method_shorthand = true;
    assert!(shorthand.expects_self());
    assert_eq!(shorthand.arity(), 1);

    let typed_self = function_with("eq", vec![Parameter::typed("this", ty("Self"))], vec![]);
    assert!(typed_self.expects_self());
}

#[test]
fn defined_names_and_privacy() {
    let mut def = function("helper", &[], vec![]);
    def.is_private = true;
    let stmt = fn_stmt(def);
    let (name, private) = stmt.defined_name().unwrap_or_else(|| panic!("function defines a name"));
    assert_eq!(name.as_str(), "helper");
    assert!(private);
    assert!(stmt_is_unnamed(&impl_stmt(impl_def("Show", ty("Point"), vec![]))));
}

fn stmt_is_unnamed(stmt: &Stmt) -> bool {
    stmt.defined_name().is_none()
}

#[test]
fn qualified_package_and_import_names() {
    let pkg = PackageDecl {
        name_path: vec![Name::new("app"), Name::new("util")],
        is_private: false,
    };
    assert_eq!(pkg.qualified_name(), "app.util");
    assert_eq!(import(&["core", "io"]).qualified_name(), "core.io");
}

#[test]
fn assign_op_symbols() {
    assert_eq!(AssignOp::Compound(BinaryOp::Shl).as_symbol(), "<<=");
    assert_eq!(AssignOp::Declare.as_symbol(), ":=");
}
