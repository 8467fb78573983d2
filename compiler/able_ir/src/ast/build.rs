//! Constructors for building trees by hand.
//!
//! Embedders without a parser, and the test suites, assemble programs with
//! these helpers. Every node gets [`Span::DUMMY`].

use std::sync::Arc;

use super::{
    ArrayRest, AssignOp, AssignTarget, BinaryOp, Block, Expr, ExprKind, FloatType,
    FunctionDefinition, FunctionSignature, GenericParameter, ImplDefinition, Import,
    ImportSelector, InterfaceDefinition, IntegerType, IteratorLiteral, LambdaExpr, Literal,
    MatchClause, MemberName, MethodsDefinition, OrClause, Parameter, Pattern, Stmt,
    StructDefinition, StructFieldDefinition, StructFieldInit, StructKind, StructLiteral,
    StructPattern, StructPatternField, TypeExpr, UnaryOp, UnionDefinition,
};
use crate::{Name, Span};

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::DUMMY)
}

// Literals

pub fn nil() -> Expr {
    expr(ExprKind::Literal(Literal::Nil))
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Literal(Literal::Bool(value)))
}

pub fn chr(value: char) -> Expr {
    expr(ExprKind::Literal(Literal::Char(value)))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Literal(Literal::String(Arc::from(value))))
}

/// Unsuffixed integer literal (`i32`).
pub fn int(value: i128) -> Expr {
    expr(ExprKind::Literal(Literal::Integer {
        value,
        suffix: None,
    }))
}

pub fn int_typed(value: i128, ty: IntegerType) -> Expr {
    expr(ExprKind::Literal(Literal::Integer {
        value,
        suffix: Some(ty),
    }))
}

/// Unsuffixed float literal (`f64`).
pub fn float(value: f64) -> Expr {
    expr(ExprKind::Literal(Literal::Float {
        value,
        suffix: None,
    }))
}

pub fn float_typed(value: f64, ty: FloatType) -> Expr {
    expr(ExprKind::Literal(Literal::Float {
        value,
        suffix: Some(ty),
    }))
}

pub fn array(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Array(items))
}

pub fn interpolation(parts: Vec<Expr>) -> Expr {
    expr(ExprKind::Interpolation(parts))
}

// Names and operators

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Identifier(Name::new(name)))
}

pub fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

pub fn range(start: Expr, end: Expr, inclusive: bool) -> Expr {
    expr(ExprKind::Range {
        start: Box::new(start),
        end: Box::new(end),
        inclusive,
    })
}

// Calls and members

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    call_with_types(callee, args, Vec::new())
}

pub fn call_with_types(callee: Expr, args: Vec<Expr>, type_args: Vec<TypeExpr>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        args,
        type_args,
    })
}

/// `name(args)`
pub fn call_named(name: &str, args: Vec<Expr>) -> Expr {
    call(ident(name), args)
}

/// `object.method(args)`
pub fn method_call(object: Expr, method: &str, args: Vec<Expr>) -> Expr {
    call(member(object, method), args)
}

pub fn member(object: Expr, name: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        member: MemberName::Named(Name::new(name)),
        safe: false,
    })
}

pub fn safe_member(object: Expr, name: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        member: MemberName::Named(Name::new(name)),
        safe: true,
    })
}

pub fn positional_member(object: Expr, index: usize) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        member: MemberName::Positional(index),
        safe: false,
    })
}

pub fn index(object: Expr, idx: Expr) -> Expr {
    expr(ExprKind::Index {
        object: Box::new(object),
        index: Box::new(idx),
    })
}

pub fn implicit_member(name: &str) -> Expr {
    expr(ExprKind::ImplicitMember(Name::new(name)))
}

/// `_`
pub fn placeholder() -> Expr {
    expr(ExprKind::Placeholder(None))
}

/// `#n`, 1-based.
pub fn placeholder_at(n: usize) -> Expr {
    expr(ExprKind::Placeholder(Some(n)))
}

// Blocks and assignment

pub fn blk(stmts: Vec<Stmt>) -> Block {
    Block::new(stmts)
}

pub fn block(stmts: Vec<Stmt>) -> Expr {
    expr(ExprKind::Block(Block::new(stmts)))
}

fn assignment(op: AssignOp, target: AssignTarget, value: Expr) -> Expr {
    expr(ExprKind::Assignment {
        op,
        target: Box::new(target),
        value: Box::new(value),
    })
}

/// `name := value`
pub fn declare(name: &str, value: Expr) -> Expr {
    declare_pattern(Pattern::ident(name), value)
}

pub fn declare_pattern(pattern: Pattern, value: Expr) -> Expr {
    assignment(AssignOp::Declare, AssignTarget::Pattern(pattern), value)
}

/// `name = value`
pub fn assign(name: &str, value: Expr) -> Expr {
    assign_pattern(Pattern::ident(name), value)
}

pub fn assign_pattern(pattern: Pattern, value: Expr) -> Expr {
    assignment(AssignOp::Assign, AssignTarget::Pattern(pattern), value)
}

/// `name OP= value`
pub fn compound(op: BinaryOp, name: &str, value: Expr) -> Expr {
    assignment(
        AssignOp::Compound(op),
        AssignTarget::Pattern(Pattern::ident(name)),
        value,
    )
}

/// `object.field = value`, or `object.field OP= value` with `op`.
pub fn assign_member(object: Expr, field: &str, op: AssignOp, value: Expr) -> Expr {
    assignment(
        op,
        AssignTarget::Member {
            object,
            member: MemberName::Named(Name::new(field)),
        },
        value,
    )
}

/// `object[idx] = value`, or a compound form with `op`.
pub fn assign_index(object: Expr, idx: Expr, op: AssignOp, value: Expr) -> Expr {
    assignment(op, AssignTarget::Index { object, index: idx }, value)
}

// Functions

pub fn lambda(params: &[&str], body: Expr) -> Expr {
    expr(ExprKind::Lambda(Arc::new(LambdaExpr {
        generic_params: Vec::new(),
        params: params.iter().map(|p| Parameter::named(*p)).collect(),
        return_type: None,
        body,
        where_clause: Vec::new(),
    })))
}

/// Plain function with untyped parameters.
pub fn function(name: &str, params: &[&str], body: Vec<Stmt>) -> FunctionDefinition {
    function_with(name, params.iter().map(|p| Parameter::named(*p)).collect(), body)
}

pub fn function_with(name: &str, params: Vec<Parameter>, body: Vec<Stmt>) -> FunctionDefinition {
    FunctionDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        params,
        return_type: None,
        body: Block::new(body),
        where_clause: Vec::new(),
        is_method_shorthand: false,
        is_private: false,
    }
}

pub fn fn_stmt(def: FunctionDefinition) -> Stmt {
    Stmt::Function(Arc::new(def))
}

pub fn generic_param(name: &str, constraints: &[&str]) -> GenericParameter {
    GenericParameter::new(name, constraints.iter().map(|c| ty(c)).collect())
}

// Async

pub fn proc_expr(body: Expr) -> Expr {
    expr(ExprKind::Proc(Arc::new(body)))
}

pub fn spawn(body: Expr) -> Expr {
    expr(ExprKind::Spawn(Arc::new(body)))
}

pub fn iterator(binding: Option<&str>, body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Iterator(Arc::new(IteratorLiteral {
        body: Block::new(body),
        binding: binding.map(Name::new),
    })))
}

// Control flow

pub fn if_expr(condition: Expr, body: Vec<Stmt>, or_clauses: Vec<OrClause>) -> Expr {
    expr(ExprKind::If {
        condition: Box::new(condition),
        body: Block::new(body),
        or_clauses,
    })
}

pub fn or_clause(condition: Option<Expr>, body: Vec<Stmt>) -> OrClause {
    OrClause {
        condition,
        body: Block::new(body),
    }
}

pub fn match_expr(subject: Expr, clauses: Vec<MatchClause>) -> Expr {
    expr(ExprKind::Match {
        subject: Box::new(subject),
        clauses,
    })
}

pub fn case(pattern: Pattern, body: Expr) -> MatchClause {
    MatchClause {
        pattern,
        guard: None,
        body,
    }
}

pub fn case_if(pattern: Pattern, guard: Expr, body: Expr) -> MatchClause {
    MatchClause {
        pattern,
        guard: Some(guard),
        body,
    }
}

pub fn rescue(monitored: Expr, clauses: Vec<MatchClause>) -> Expr {
    expr(ExprKind::Rescue {
        monitored: Box::new(monitored),
        clauses,
    })
}

pub fn ensure(body: Expr, ensure_block: Vec<Stmt>) -> Expr {
    expr(ExprKind::Ensure {
        body: Box::new(body),
        ensure: Block::new(ensure_block),
    })
}

pub fn or_else(value: Expr, binding: Option<&str>, handler: Vec<Stmt>) -> Expr {
    expr(ExprKind::OrElse {
        expr: Box::new(value),
        handler: Block::new(handler),
        binding: binding.map(Name::new),
    })
}

pub fn propagate(value: Expr) -> Expr {
    expr(ExprKind::Propagation(Box::new(value)))
}

pub fn breakpoint(label: &str, body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Breakpoint {
        label: Name::new(label),
        body: Block::new(body),
    })
}

pub fn loop_expr(body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Loop(Block::new(body)))
}

// Statements

pub fn stmt(e: Expr) -> Stmt {
    Stmt::Expr(e)
}

pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        condition,
        body: Block::new(body),
    }
}

pub fn for_in(pattern: Pattern, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::For {
        pattern,
        iterable,
        body: Block::new(body),
    }
}

pub fn brk(label: Option<&str>, value: Option<Expr>) -> Stmt {
    Stmt::Break {
        label: label.map(Name::new),
        value,
    }
}

pub fn cont(label: Option<&str>) -> Stmt {
    Stmt::Continue {
        label: label.map(Name::new),
    }
}

pub fn raise(value: Expr) -> Stmt {
    Stmt::Raise(value)
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return(value)
}

pub fn yield_stmt(value: Expr) -> Stmt {
    Stmt::Yield(Some(value))
}

// Struct literals

pub fn struct_lit(name: &str, fields: Vec<(&str, Expr)>) -> Expr {
    expr(ExprKind::StructLiteral(Box::new(StructLiteral {
        struct_type: Name::new(name),
        fields: fields
            .into_iter()
            .map(|(field, value)| StructFieldInit {
                name: Some(Name::new(field)),
                value,
            })
            .collect(),
        positional: false,
        update: Vec::new(),
        type_args: Vec::new(),
    })))
}

pub fn struct_positional(name: &str, values: Vec<Expr>) -> Expr {
    expr(ExprKind::StructLiteral(Box::new(StructLiteral {
        struct_type: Name::new(name),
        fields: values
            .into_iter()
            .map(|value| StructFieldInit { name: None, value })
            .collect(),
        positional: true,
        update: Vec::new(),
        type_args: Vec::new(),
    })))
}

/// `Name { ...base, field: value }`
pub fn struct_update(name: &str, base: Expr, fields: Vec<(&str, Expr)>) -> Expr {
    let mut lit = struct_lit(name, fields);
    if let ExprKind::StructLiteral(inner) = &mut lit.kind {
        inner.update.push(base);
    }
    lit
}

// Definitions

pub fn ty(name: &str) -> TypeExpr {
    TypeExpr::simple(name)
}

pub fn ty_generic(base: &str, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::generic(base, args)
}

fn named_struct(name: &str, fields: &[(&str, TypeExpr)]) -> StructDefinition {
    StructDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        kind: if fields.is_empty() {
            StructKind::Singleton
        } else {
            StructKind::Named
        },
        fields: fields
            .iter()
            .map(|(field, ty)| StructFieldDefinition {
                name: Some(Name::new(field)),
                ty: ty.clone(),
            })
            .collect(),
        where_clause: Vec::new(),
        is_private: false,
    }
}

pub fn struct_def(name: &str, fields: &[(&str, TypeExpr)]) -> Stmt {
    Stmt::Struct(Arc::new(named_struct(name, fields)))
}

pub fn generic_struct_def(name: &str, params: &[&str], fields: &[(&str, TypeExpr)]) -> Stmt {
    let mut def = named_struct(name, fields);
    def.generic_params = params
        .iter()
        .map(|p| GenericParameter::new(*p, Vec::new()))
        .collect();
    Stmt::Struct(Arc::new(def))
}

pub fn positional_struct_def(name: &str, fields: Vec<TypeExpr>) -> Stmt {
    Stmt::Struct(Arc::new(StructDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        kind: StructKind::Positional,
        fields: fields
            .into_iter()
            .map(|ty| StructFieldDefinition { name: None, ty })
            .collect(),
        where_clause: Vec::new(),
        is_private: false,
    }))
}

pub fn union_def(name: &str, variants: Vec<TypeExpr>) -> Stmt {
    Stmt::Union(Arc::new(UnionDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        variants,
        is_private: false,
    }))
}

/// Signature taking `self` plus `extra` untyped parameters.
pub fn signature(name: &str, extra: &[&str]) -> FunctionSignature {
    let mut params = vec![Parameter::typed("self", ty("Self"))];
    params.extend(extra.iter().map(|p| Parameter::named(*p)));
    FunctionSignature {
        name: Name::new(name),
        generic_params: Vec::new(),
        params,
        return_type: None,
        default_impl: None,
    }
}

/// Signature with a default body.
pub fn default_signature(name: &str, extra: &[&str], body: Vec<Stmt>) -> FunctionSignature {
    let mut sig = signature(name, extra);
    let mut def = function_with(name, sig.params.clone(), body);
    def.generic_params.clone_from(&sig.generic_params);
    sig.default_impl = Some(Arc::new(def));
    sig
}

pub fn interface_def(name: &str, signatures: Vec<FunctionSignature>, bases: &[&str]) -> Stmt {
    Stmt::Interface(Arc::new(InterfaceDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        self_type: None,
        signatures,
        base_interfaces: bases.iter().map(|b| ty(b)).collect(),
        is_private: false,
    }))
}

/// Method definition whose first parameter is `self`.
pub fn method(name: &str, extra: &[&str], body: Vec<Stmt>) -> FunctionDefinition {
    let mut params = vec![Parameter::named("self")];
    params.extend(extra.iter().map(|p| Parameter::named(*p)));
    function_with(name, params, body)
}

pub fn impl_def(interface: &str, target: TypeExpr, methods: Vec<FunctionDefinition>) -> ImplDefinition {
    ImplDefinition {
        interface_name: Name::new(interface),
        interface_args: Vec::new(),
        target,
        generic_params: Vec::new(),
        where_clause: Vec::new(),
        definitions: methods.into_iter().map(Arc::new).collect(),
        impl_name: None,
        is_private: false,
    }
}

pub fn impl_stmt(def: ImplDefinition) -> Stmt {
    Stmt::Impl(Arc::new(def))
}

pub fn methods_def(target: TypeExpr, methods: Vec<FunctionDefinition>) -> Stmt {
    Stmt::Methods(Arc::new(MethodsDefinition {
        target,
        generic_params: Vec::new(),
        where_clause: Vec::new(),
        definitions: methods.into_iter().map(Arc::new).collect(),
    }))
}

// Patterns

pub fn p_ident(name: &str) -> Pattern {
    Pattern::ident(name)
}

pub fn p_wild() -> Pattern {
    Pattern::Wildcard
}

pub fn p_int(value: i128) -> Pattern {
    Pattern::Literal(Literal::Integer {
        value,
        suffix: None,
    })
}

pub fn p_string(value: &str) -> Pattern {
    Pattern::Literal(Literal::String(Arc::from(value)))
}

pub fn p_typed(pattern: Pattern, ty: TypeExpr) -> Pattern {
    Pattern::Typed {
        pattern: Box::new(pattern),
        ty,
    }
}

/// `[a, b, ...rest]`; `rest` of `Some("_")` is a wildcard rest.
pub fn p_array(elements: Vec<Pattern>, rest: Option<&str>) -> Pattern {
    Pattern::Array {
        elements,
        rest: rest.map(|r| {
            if r == "_" {
                ArrayRest::Wildcard
            } else {
                ArrayRest::Bind(Name::new(r))
            }
        }),
    }
}

pub fn p_struct(struct_type: Option<&str>, fields: Vec<(&str, Pattern)>) -> Pattern {
    Pattern::Struct(StructPattern {
        struct_type: struct_type.map(Name::new),
        fields: fields
            .into_iter()
            .map(|(field, pattern)| StructPatternField {
                field: Some(Name::new(field)),
                pattern,
                binding: None,
            })
            .collect(),
        positional: false,
        has_rest: false,
    })
}

pub fn p_positional(struct_type: Option<&str>, fields: Vec<Pattern>) -> Pattern {
    Pattern::Struct(StructPattern {
        struct_type: struct_type.map(Name::new),
        fields: fields
            .into_iter()
            .map(|pattern| StructPatternField {
                field: None,
                pattern,
                binding: None,
            })
            .collect(),
        positional: true,
        has_rest: false,
    })
}

// Modules

pub fn import(path: &[&str]) -> Import {
    Import {
        package_path: path.iter().map(|p| Name::new(*p)).collect(),
        alias: None,
        selectors: Vec::new(),
        wildcard: false,
        dynamic: false,
    }
}

pub fn import_selectors(path: &[&str], selectors: &[(&str, Option<&str>)]) -> Import {
    let mut imp = import(path);
    imp.selectors = selectors
        .iter()
        .map(|(name, alias)| ImportSelector {
            name: Name::new(name),
            alias: alias.map(Name::new),
        })
        .collect();
    imp
}
