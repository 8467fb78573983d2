//! Expression nodes.
//!
//! Every expression produces a value. Blocks, `if`, `match`, `rescue`,
//! `ensure`, and `breakpoint` are expressions too; statements only appear
//! inside a [`Block`].

use std::sync::Arc;

use super::{
    AssignOp, BinaryOp, GenericParameter, Literal, Parameter, Pattern, Stmt, TypeExpr, UnaryOp,
    WhereConstraint,
};
use crate::{Name, Span};

/// Expression node with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Expression without a meaningful source location.
    pub fn synthetic(kind: ExprKind) -> Self {
        Expr {
            kind,
            span: Span::DUMMY,
        }
    }

    /// Whether a placeholder (`_` or `#N`) appears in this expression
    /// without being enclosed by a nested lambda, iterator literal, or
    /// async body.
    pub fn contains_placeholder(&self) -> bool {
        let mut found = false;
        self.visit_placeholders(&mut |_| found = true);
        found
    }

    /// Calls `f` for every placeholder reachable without crossing a lambda,
    /// iterator literal, or async body, in evaluation order.
    pub fn visit_placeholders(&self, f: &mut impl FnMut(Option<usize>)) {
        match &self.kind {
            ExprKind::Placeholder(index) => f(*index),
            ExprKind::Unary { operand, .. } | ExprKind::Propagation(operand) => {
                operand.visit_placeholders(f);
            }
            ExprKind::Binary { left, right, .. } => {
                left.visit_placeholders(f);
                right.visit_placeholders(f);
            }
            ExprKind::Call { callee, args, .. } => {
                callee.visit_placeholders(f);
                for arg in args {
                    arg.visit_placeholders(f);
                }
            }
            ExprKind::Member { object, .. } => object.visit_placeholders(f),
            ExprKind::Index { object, index } => {
                object.visit_placeholders(f);
                index.visit_placeholders(f);
            }
            ExprKind::Array(items) | ExprKind::Interpolation(items) => {
                for item in items {
                    item.visit_placeholders(f);
                }
            }
            ExprKind::Range { start, end, .. } => {
                start.visit_placeholders(f);
                end.visit_placeholders(f);
            }
            ExprKind::StructLiteral(lit) => {
                for field in &lit.fields {
                    field.value.visit_placeholders(f);
                }
                for source in &lit.update {
                    source.visit_placeholders(f);
                }
            }
            ExprKind::If {
                condition, body, or_clauses, ..
            } => {
                condition.visit_placeholders(f);
                body.visit_placeholders(f);
                for clause in or_clauses {
                    if let Some(cond) = &clause.condition {
                        cond.visit_placeholders(f);
                    }
                    clause.body.visit_placeholders(f);
                }
            }
            ExprKind::Match { subject, clauses }
            | ExprKind::Rescue {
                monitored: subject,
                clauses,
            } => {
                subject.visit_placeholders(f);
                for clause in clauses {
                    if let Some(guard) = &clause.guard {
                        guard.visit_placeholders(f);
                    }
                    clause.body.visit_placeholders(f);
                }
            }
            ExprKind::Block(block) | ExprKind::Loop(block) => block.visit_placeholders(f),
            ExprKind::Literal(_)
            | ExprKind::Identifier(_)
            | ExprKind::ImplicitMember(_)
            | ExprKind::Assignment { .. }
            | ExprKind::Lambda(_)
            | ExprKind::Proc(_)
            | ExprKind::Spawn(_)
            | ExprKind::Iterator(_)
            | ExprKind::OrElse { .. }
            | ExprKind::Breakpoint { .. }
            | ExprKind::Ensure { .. } => {}
        }
    }
}

/// Sequence of statements evaluated in a fresh child scope.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }

    fn visit_placeholders(&self, f: &mut impl FnMut(Option<usize>)) {
        for stmt in &self.stmts {
            if let Stmt::Expr(expr) = stmt {
                expr.visit_placeholders(f);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Array(Vec<Expr>),
    Identifier(Name),
    /// `` `x = ${x}` ``: parts are concatenated after stringification.
    Interpolation(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        type_args: Vec<TypeExpr>,
    },
    Block(Block),
    Assignment {
        op: AssignOp,
        target: Box<AssignTarget>,
        value: Box<Expr>,
    },
    /// `a..b` when inclusive, `a...b` otherwise.
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },
    /// `obj.member`, `obj.0`, or `obj?.member` when `safe`.
    Member {
        object: Box<Expr>,
        member: MemberName,
        safe: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Lambda(Arc<LambdaExpr>),
    /// `proc expr`: runs asynchronously, yields a `ProcHandle`.
    Proc(Arc<Expr>),
    /// `spawn expr`: runs asynchronously, yields a memoizing `Future`.
    Spawn(Arc<Expr>),
    /// `expr?`
    Propagation(Box<Expr>),
    /// `expr or { err => handler }`
    OrElse {
        expr: Box<Expr>,
        handler: Block,
        binding: Option<Name>,
    },
    /// `breakpoint 'label { ... }`
    Breakpoint {
        label: Name,
        body: Block,
    },
    If {
        condition: Box<Expr>,
        body: Block,
        or_clauses: Vec<OrClause>,
    },
    Match {
        subject: Box<Expr>,
        clauses: Vec<MatchClause>,
    },
    Rescue {
        monitored: Box<Expr>,
        clauses: Vec<MatchClause>,
    },
    Ensure {
        body: Box<Expr>,
        ensure: Block,
    },
    Iterator(Arc<IteratorLiteral>),
    /// `#field`: member of the enclosing method's receiver.
    ImplicitMember(Name),
    /// `_` when `None`, `#N` (1-based) when `Some(N)`.
    Placeholder(Option<usize>),
    StructLiteral(Box<StructLiteral>),
    /// `loop { ... }`: repeats until `break`.
    Loop(Block),
}

/// Target of an assignment expression.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    /// Identifier or destructuring pattern.
    Pattern(Pattern),
    Member { object: Expr, member: MemberName },
    Index { object: Expr, index: Expr },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberName {
    Named(Name),
    /// `.0`, `.1`, ...
    Positional(usize),
}

impl std::fmt::Display for MemberName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberName::Named(name) => write!(f, "{name}"),
            MemberName::Positional(idx) => write!(f, "{idx}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LambdaExpr {
    pub generic_params: Vec<GenericParameter>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeExpr>,
    pub body: Expr,
    pub where_clause: Vec<WhereConstraint>,
}

/// `or cond { ... }` clause of an `if`; a missing condition is the final else.
#[derive(Clone, Debug, PartialEq)]
pub struct OrClause {
    pub condition: Option<Expr>,
    pub body: Block,
}

/// `case pattern if guard => body`
#[derive(Clone, Debug, PartialEq)]
pub struct MatchClause {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// `Iterator { gen => body }`: a lazily driven generator.
#[derive(Clone, Debug, PartialEq)]
pub struct IteratorLiteral {
    pub body: Block,
    /// Controller name; `gen` when omitted.
    pub binding: Option<Name>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructLiteral {
    pub struct_type: Name,
    pub fields: Vec<StructFieldInit>,
    pub positional: bool,
    /// `...base` sources for functional update, applied in order.
    pub update: Vec<Expr>,
    pub type_args: Vec<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructFieldInit {
    /// `None` for positional literals.
    pub name: Option<Name>,
    pub value: Expr,
}
