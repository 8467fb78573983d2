use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_define_and_lookup() {
    let env = Environment::new();
    env.define("x", Value::i32(42));
    assert_eq!(env.lookup("x"), Some(Value::i32(42)));
    assert_eq!(env.lookup("y"), None);
}

#[test]
fn test_child_shadows_parent() {
    let parent = Environment::new();
    parent.define("x", Value::i32(1));

    let child = parent.child();
    child.define("x", Value::i32(2));

    assert_eq!(child.lookup("x"), Some(Value::i32(2)));
    assert_eq!(parent.lookup("x"), Some(Value::i32(1)));
}

#[test]
fn test_assign_updates_nearest_binding() {
    let parent = Environment::new();
    parent.define("x", Value::i32(1));
    let child = parent.child();

    assert!(child.assign("x", Value::i32(5)).is_ok());
    assert_eq!(parent.lookup("x"), Some(Value::i32(5)));
    assert!(!child.has_local("x"));
}

#[test]
fn test_assign_undefined_fails() {
    let env = Environment::new();
    let err = env.assign("missing", Value::Nil);
    assert_eq!(err, Err(EnvError::Undefined(Name::new("missing"))));
}

#[test]
fn test_get_converts_to_eval_error() {
    let env = Environment::new();
    let err: EvalError = env.get("nope").map(|_| ()).map_err(EvalError::from).unwrap_err();
    assert_eq!(err.message, "Undefined variable 'nope'");
}

#[test]
fn test_runtime_data_is_inherited() {
    let root = Environment::new();
    let scope = root.child().child();
    assert!(scope.runtime_data().is_none());

    root.set_runtime_data(Arc::new(7_u32));
    let data = scope.runtime_data().unwrap();
    assert_eq!(data.downcast_ref::<u32>(), Some(&7));
}

#[test]
fn test_local_bindings_sorted() {
    let env = Environment::new();
    env.define("b", Value::i32(2));
    env.define("a", Value::i32(1));
    let names: Vec<String> = env
        .local_bindings()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_assign_all_is_all_or_nothing() {
    let env = Environment::new();
    env.define("a", Value::i32(1));
    env.define("b", Value::i32(2));

    let err = env
        .assign_all(vec![
            (Name::new("a"), Value::i32(10)),
            (Name::new("missing"), Value::i32(20)),
        ])
        .unwrap_err();
    assert_eq!(err, EnvError::Undefined(Name::new("missing")));
    assert_eq!(env.lookup("a"), Some(Value::i32(1)));

    env.assign_all(vec![
        (Name::new("a"), Value::i32(10)),
        (Name::new("b"), Value::i32(20)),
    ])
    .unwrap();
    assert_eq!(env.lookup("a"), Some(Value::i32(10)));
    assert_eq!(env.lookup("b"), Some(Value::i32(20)));
}
