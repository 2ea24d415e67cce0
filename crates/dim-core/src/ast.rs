//! Method body AST.
//!
//! Expressions and statements are closed sum types so that adding a variant
//! forces every lowering `match` to handle it. Local variables are already
//! numbered by the parser: every [`Block`] lists exactly the locals declared
//! directly inside it.
//!
//! ## Node identity
//!
//! The compiler memoizes per-node resolutions (the method a call binds to)
//! in side tables keyed by [`NodeKey`], the address of the node inside the
//! borrowed, immutable tree. Nodes are never mutated after parsing.

use crate::types::{ClassType, Type};

/// Identifier of a local variable, unique within a method.
pub type LocalId = u32;

/// Identity of an AST node for the duration of one borrow of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn of<T>(node: &T) -> Self {
        NodeKey(node as *const T as usize)
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Binary operators known to the lowering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    /// `??`
    Coalesce,
}

impl BinaryOp {
    /// Parse an operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "??" => BinaryOp::Coalesce,
            _ => return None,
        })
    }

    /// The token, which is also the C spelling for direct operators.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }

    /// Operators whose result is always `bool`.
    pub fn yields_bool(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }

    /// `==` and `!=` may compare class references.
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "-" => UnaryOp::Neg,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitNot,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A local by id.
    Local(LocalId),
    /// A method parameter by position (`self` is position 0 for instance methods).
    Argument(usize),
    /// `Type.Method(args)`.
    CallStatic {
        callee: ClassType,
        name: String,
        args: Vec<Expr>,
    },
    /// `Method(args)`, resolved against the current class and the using types.
    Call { name: String, args: Vec<Expr> },
    /// `receiver.Method(args)`; `args[0]` is the receiver.
    CallInstance { name: String, args: Vec<Expr> },
    /// A bare name that refers to a static field of the current class or a using type.
    Class(ClassType),
    /// `Type.field`.
    StaticField { class: ClassType, field: String },
    /// `expr.field`.
    InstanceField { instance: Box<Expr>, field: String },
    /// Numeric literal, kept as written.
    Number(String),
    /// String literal (raw text).
    String(String),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Postfix `@`: assert a nullable reference is present.
    Unwrap(Box<Expr>),
    /// `cond ? a : b`.
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Expression-form narrowing: `is Target bind = source ? then : else`.
    Is {
        target: ClassType,
        bind: LocalId,
        source: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `source as Target`.
    As { source: Box<Expr>, target: ClassType },
    /// Allocate an instance of the class being compiled.
    New,
    Nil,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn local(id: LocalId, line: u32) -> Self {
        Self::new(ExprKind::Local(id), line)
    }

    pub fn argument(index: usize, line: u32) -> Self {
        Self::new(ExprKind::Argument(index), line)
    }

    pub fn number(text: impl Into<String>, line: u32) -> Self {
        Self::new(ExprKind::Number(text.into()), line)
    }

    pub fn string(text: impl Into<String>, line: u32) -> Self {
        Self::new(ExprKind::String(text.into()), line)
    }

    pub fn nil(line: u32) -> Self {
        Self::new(ExprKind::Nil, line)
    }

    pub fn new_instance(line: u32) -> Self {
        Self::new(ExprKind::New, line)
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>, line: u32) -> Self {
        Self::new(
            ExprKind::Call {
                name: name.into(),
                args,
            },
            line,
        )
    }

    pub fn call_static(callee: ClassType, name: impl Into<String>, args: Vec<Expr>, line: u32) -> Self {
        Self::new(
            ExprKind::CallStatic {
                callee,
                name: name.into(),
                args,
            },
            line,
        )
    }

    /// Instance call; `receiver` becomes `args[0]`.
    pub fn call_instance(receiver: Expr, name: impl Into<String>, rest: Vec<Expr>, line: u32) -> Self {
        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(receiver);
        args.extend(rest);
        Self::new(
            ExprKind::CallInstance {
                name: name.into(),
                args,
            },
            line,
        )
    }

    pub fn static_field(class: ClassType, field: impl Into<String>, line: u32) -> Self {
        Self::new(
            ExprKind::StaticField {
                class,
                field: field.into(),
            },
            line,
        )
    }

    pub fn instance_field(instance: Expr, field: impl Into<String>, line: u32) -> Self {
        Self::new(
            ExprKind::InstanceField {
                instance: Box::new(instance),
                field: field.into(),
            },
            line,
        )
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        let line = left.line;
        Self::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            line,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, line: u32) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        )
    }

    pub fn unwrap(operand: Expr, line: u32) -> Self {
        Self::new(ExprKind::Unwrap(Box::new(operand)), line)
    }

    pub fn if_else(condition: Expr, then_branch: Expr, else_branch: Expr, line: u32) -> Self {
        Self::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            line,
        )
    }

    pub fn is(
        target: ClassType,
        bind: LocalId,
        source: Expr,
        then_branch: Expr,
        else_branch: Expr,
        line: u32,
    ) -> Self {
        Self::new(
            ExprKind::Is {
                target,
                bind,
                source: Box::new(source),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            line,
        )
    }

    pub fn as_cast(source: Expr, target: ClassType, line: u32) -> Self {
        Self::new(
            ExprKind::As {
                source: Box::new(source),
                target,
            },
            line,
        )
    }

    /// Whether this expression is one of the call forms.
    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Call { .. } | ExprKind::CallStatic { .. } | ExprKind::CallInstance { .. }
        )
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A statement with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// A call evaluated for its side effects.
    Call(Expr),
    Return(Option<Expr>),
    /// Force a collection.
    Gc,
    /// Assignment to an unqualified static field name.
    Assignment { name: String, value: Expr },
    LocalAssignment { id: LocalId, value: Expr },
    StaticFieldAssignment {
        class: ClassType,
        field: String,
        value: Expr,
    },
    InstanceFieldAssignment {
        instance: Expr,
        field: String,
        value: Expr,
    },
    While { condition: Expr, body: Box<Stmt> },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Block(Block),
    Try(TryStmt),
    Throw(Expr),
    Is(IsStmt),
    Empty,
}

/// A lexical block and the locals declared directly in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub locals: Vec<(LocalId, Type)>,
}

/// `try <call> catch Type <call> ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    /// Must be a single call statement.
    pub body: Box<Stmt>,
    pub catches: Vec<CatchClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub exception: ClassType,
    /// Must be a single call statement.
    pub handler: Box<Stmt>,
    pub line: u32,
}

/// Statement-form narrowing: `is Target bind = source; then else otherwise`.
#[derive(Debug, Clone, PartialEq)]
pub struct IsStmt {
    pub target: ClassType,
    pub bind: LocalId,
    pub source: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn call(expr: Expr) -> Self {
        let line = expr.line;
        Self::new(StmtKind::Call(expr), line)
    }

    pub fn ret(value: Option<Expr>, line: u32) -> Self {
        Self::new(StmtKind::Return(value), line)
    }

    pub fn gc(line: u32) -> Self {
        Self::new(StmtKind::Gc, line)
    }

    pub fn empty(line: u32) -> Self {
        Self::new(StmtKind::Empty, line)
    }

    pub fn assign_local(id: LocalId, value: Expr, line: u32) -> Self {
        Self::new(StmtKind::LocalAssignment { id, value }, line)
    }

    pub fn assign_name(name: impl Into<String>, value: Expr, line: u32) -> Self {
        Self::new(
            StmtKind::Assignment {
                name: name.into(),
                value,
            },
            line,
        )
    }

    pub fn assign_static(class: ClassType, field: impl Into<String>, value: Expr, line: u32) -> Self {
        Self::new(
            StmtKind::StaticFieldAssignment {
                class,
                field: field.into(),
                value,
            },
            line,
        )
    }

    pub fn assign_field(instance: Expr, field: impl Into<String>, value: Expr, line: u32) -> Self {
        Self::new(
            StmtKind::InstanceFieldAssignment {
                instance,
                field: field.into(),
                value,
            },
            line,
        )
    }

    pub fn block(body: Vec<Stmt>, locals: Vec<(LocalId, Type)>, line: u32) -> Self {
        Self::new(StmtKind::Block(Block { body, locals }), line)
    }

    pub fn while_loop(condition: Expr, body: Stmt, line: u32) -> Self {
        Self::new(
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
            line,
        )
    }

    pub fn if_else(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>, line: u32) -> Self {
        Self::new(
            StmtKind::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            },
            line,
        )
    }

    pub fn try_catch(body: Stmt, catches: Vec<CatchClause>, line: u32) -> Self {
        Self::new(
            StmtKind::Try(TryStmt {
                body: Box::new(body),
                catches,
            }),
            line,
        )
    }

    pub fn throw(value: Expr, line: u32) -> Self {
        Self::new(StmtKind::Throw(value), line)
    }

    pub fn is(
        target: ClassType,
        bind: LocalId,
        source: Expr,
        then_branch: Stmt,
        else_branch: Option<Stmt>,
        line: u32,
    ) -> Self {
        Self::new(
            StmtKind::Is(IsStmt {
                target,
                bind,
                source,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            }),
            line,
        )
    }
}

impl CatchClause {
    pub fn new(exception: ClassType, handler: Stmt) -> Self {
        let line = handler.line;
        Self {
            exception,
            handler: Box::new(handler),
            line,
        }
    }
}
