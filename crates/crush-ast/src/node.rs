//! Node variants for the optimizer's AST.
//!
//! The variant set is ESTree-flavored: statements and expressions of a
//! dynamically-typed, C-family scripting language. The optimizer only has
//! rewrite rules for a subset of these; everything else exists so a real
//! program round-trips through the tree unharmed.

/// Stable index of a node inside its [`NodeArena`](crate::arena::NodeArena).
///
/// Ids are never reused within one arena; a replaced node stays in the arena
/// as a detached orphan and is simply never reachable from the root again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal payload. Immutable once created.
///
/// `Regex` keeps the live pattern/flags pair; the optimizer only ever uses it
/// for its string conversion during concatenation and comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Num(f64),
    Str(String),
    Bool(bool),
    Regex { pattern: String, flags: String },
    Null,
    Undefined,
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    TypeOf,
    Void,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::BitNot => "~",
        }
    }

    pub fn from_str(s: &str) -> Option<UnaryOp> {
        Some(match s {
            "+" => UnaryOp::Plus,
            "-" => UnaryOp::Minus,
            "!" => UnaryOp::Not,
            "typeof" => UnaryOp::TypeOf,
            "void" => UnaryOp::Void,
            "~" => UnaryOp::BitNot,
            _ => return None,
        })
    }
}

/// Binary operators the tree can carry.
///
/// The constant folder only folds the arithmetic, equality and relational
/// subset; the rest pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Gt,
    Ge,
    Lt,
    Le,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    InstanceOf,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::EqEqEq => "===",
            BinaryOp::NotEqEq => "!==",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        }
    }

    pub fn from_str(s: &str) -> Option<BinaryOp> {
        Some(match s {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "**" => BinaryOp::Pow,
            "==" => BinaryOp::EqEq,
            "!=" => BinaryOp::NotEq,
            "===" => BinaryOp::EqEqEq,
            "!==" => BinaryOp::NotEqEq,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "in" => BinaryOp::In,
            "instanceof" => BinaryOp::InstanceOf,
            _ => return None,
        })
    }
}

/// Short-circuiting logical operators. Kept apart from [`BinaryOp`] because
/// the interchange format does the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::Nullish => "??",
        }
    }

    pub fn from_str(s: &str) -> Option<LogicalOp> {
        Some(match s {
            "&&" => LogicalOp::And,
            "||" => LogicalOp::Or,
            "??" => LogicalOp::Nullish,
            _ => return None,
        })
    }
}

/// Object property role: plain init, getter or setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Init => "init",
            PropertyKind::Get => "get",
            PropertyKind::Set => "set",
        }
    }

    pub fn from_str(s: &str) -> Option<PropertyKind> {
        Some(match s {
            "init" => PropertyKind::Init,
            "get" => PropertyKind::Get,
            "set" => PropertyKind::Set,
            _ => return None,
        })
    }
}

/// Which syntactic flavor a function node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnFlavor {
    Declaration,
    Expression,
    Arrow,
}

/// Variable declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }

    pub fn from_str(s: &str) -> Option<VarKind> {
        Some(match s {
            "var" => VarKind::Var,
            "let" => VarKind::Let,
            "const" => VarKind::Const,
            _ => return None,
        })
    }
}

/// A tagged AST node. Child links are `NodeId`s into the owning arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Root of one compilation unit. Behaves like a block for
    /// statement-removal purposes. `source_type` is interchange metadata
    /// (`"script"` or `"module"`) carried through untouched.
    Program { body: Vec<NodeId>, source_type: String },

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    Literal(LitValue),
    Identifier { name: String },
    /// `this` reference.
    This,
    /// Template string. `quasis` holds the cooked text chunks surrounding
    /// the interpolated expressions.
    TemplateLiteral { quasis: Vec<String>, expressions: Vec<NodeId> },
    Unary { op: UnaryOp, argument: NodeId },
    Binary { op: BinaryOp, left: NodeId, right: NodeId },
    Logical { op: LogicalOp, left: NodeId, right: NodeId },
    /// `target op value`; operator kept as raw text (`=`, `+=`, ...).
    Assignment { op: String, left: NodeId, right: NodeId },
    Conditional { test: NodeId, consequent: NodeId, alternate: NodeId },
    Member { object: NodeId, property: NodeId, computed: bool },
    Call { callee: NodeId, arguments: Vec<NodeId> },
    New { callee: NodeId, arguments: Vec<NodeId> },
    Sequence { expressions: Vec<NodeId> },
    Array { elements: Vec<Option<NodeId>> },
    Object { properties: Vec<NodeId> },
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        computed: bool,
        shorthand: bool,
    },
    /// Function of any flavor. `name` is an `Identifier` node when present.
    /// An arrow's `body` may be a bare expression instead of a block.
    Function {
        flavor: FnFlavor,
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    ExpressionStatement { expression: NodeId },
    Block { body: Vec<NodeId> },
    If { test: NodeId, consequent: NodeId, alternate: Option<NodeId> },
    Return { argument: Option<NodeId> },
    Throw { argument: NodeId },
    Break { label: Option<String> },
    Continue { label: Option<String> },
    VariableDeclaration { kind: VarKind, declarations: Vec<NodeId> },
    VariableDeclarator { name: NodeId, init: Option<NodeId> },
    While { test: NodeId, body: NodeId },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    Empty,
}

impl Node {
    /// Statements after which later siblings in the same block are
    /// unreachable.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Node::Return { .. } | Node::Throw { .. } | Node::Break { .. } | Node::Continue { .. }
        )
    }

    /// Nodes that act as a statement container: `Program` and `Block`.
    pub fn is_block_like(&self) -> bool {
        matches!(self, Node::Program { .. } | Node::Block { .. })
    }

    /// A bare value with no possible side effect when sitting directly in a
    /// statement position.
    pub fn is_bare_value(&self) -> bool {
        matches!(self, Node::Literal(_) | Node::Identifier { .. })
    }
}
