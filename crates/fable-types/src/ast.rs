//! AST node types for the Fable language.
//!
//! Programs are built directly in Rust (see the convenience constructors on
//! [`Expr`]) or loaded from their JSON serialization with
//! [`Program::from_json`]. Large recursive types are boxed to keep enum
//! sizes reasonable. Declarations are kept in `Vec`s so that registration
//! order follows declaration order.

use serde::{Deserialize, Serialize};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete Fable program.
///
/// Data types, interfaces and instances are registered in that order before
/// any binding is evaluated. `bindings` are mutually visible, so top-level
/// functions may be recursive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub data: Vec<DataDecl>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub instances: Vec<InstanceDecl>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    pub main: Expr,
}

impl Program {
    /// A program with no declarations that evaluates `main`.
    pub fn new(main: Expr) -> Self {
        Self {
            data: Vec::new(),
            interfaces: Vec::new(),
            instances: Vec::new(),
            bindings: Vec::new(),
            main,
        }
    }

    pub fn with_data(mut self, decl: DataDecl) -> Self {
        self.data.push(decl);
        self
    }

    pub fn with_interface(mut self, decl: InterfaceDecl) -> Self {
        self.interfaces.push(decl);
        self
    }

    pub fn with_instance(mut self, decl: InstanceDecl) -> Self {
        self.instances.push(decl);
        self
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.bindings.push(Binding {
            name: name.into(),
            value,
        });
        self
    }

    /// Load a program from its JSON serialization.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Serialize the program to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `name = value` at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub value: Expr,
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations
// ══════════════════════════════════════════════════════════════════════════════

/// `data Maybe a = Nothing | Just a`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub constructors: Vec<ConstructorDecl>,
}

impl DataDecl {
    pub fn new(name: impl Into<String>, params: &[&str]) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            constructors: Vec::new(),
        }
    }

    /// Add a constructor with the given number of fields.
    pub fn constructor(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.constructors.push(ConstructorDecl {
            name: name.into(),
            arity,
        });
        self
    }
}

/// A single data constructor and its field count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub name: String,
    pub arity: usize,
}

/// `interface Monad : Functor { pure, bind, then }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub superinterfaces: Vec<String>,
    pub methods: Vec<MethodSig>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superinterfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, superinterface: impl Into<String>) -> Self {
        self.superinterfaces.push(superinterface.into());
        self
    }

    /// Declare a required method.
    pub fn method(mut self, name: impl Into<String>, arity: usize, dispatch: Dispatch) -> Self {
        self.methods.push(MethodSig {
            name: name.into(),
            arity,
            dispatch,
            default: None,
        });
        self
    }

    /// Declare a method with a default implementation.
    pub fn default_method(
        mut self,
        name: impl Into<String>,
        arity: usize,
        dispatch: Dispatch,
        default: Expr,
    ) -> Self {
        self.methods.push(MethodSig {
            name: name.into(),
            arity,
            dispatch,
            default: Some(default),
        });
        self
    }
}

/// Signature of an interface method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub arity: usize,
    pub dispatch: Dispatch,
    /// Used when an instance does not implement the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
}

/// Where a method call finds the type tag it dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// The tag of the argument at this position.
    Arg(usize),
    /// The call site names the type (`pure`, `mempty`).
    Explicit,
}

/// `instance Functor Tree { map = ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDecl {
    pub interface: String,
    pub type_name: String,
    pub methods: Vec<MethodImpl>,
}

impl InstanceDecl {
    pub fn new(interface: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            type_name: type_name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, name: impl Into<String>, body: Expr) -> Self {
        self.methods.push(MethodImpl {
            name: name.into(),
            body,
        });
        self
    }
}

/// A method body supplied by an instance. Evaluates to a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodImpl {
    pub name: String,
    pub body: Expr,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
    Unit,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Lit(Literal),
    Var(String),
    /// `\a b -> body`
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    /// `f a b` (curried)
    Apply {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `let name = value in body`
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `Just x`. The data type is found through the constructor name.
    Construct {
        constructor: String,
        args: Vec<Expr>,
    },
    /// `[a, b, c]`
    List(Vec<Expr>),
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `Interface.method args`, dispatched through the instance registry.
    /// `at` names the type for methods with explicit dispatch.
    Method {
        interface: String,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<String>,
        args: Vec<Expr>,
    },
    /// `map func functor` through `Functor`.
    Map {
        func: Box<Expr>,
        functor: Box<Expr>,
    },
    /// `bind monad func` through `Monad`.
    Bind {
        monad: Box<Expr>,
        func: Box<Expr>,
    },
    /// `pure value` at the named monad.
    Pure {
        type_name: String,
        value: Box<Expr>,
    },
    /// `foldl`/`foldr` through `Foldable`.
    Fold {
        direction: FoldDirection,
        func: Box<Expr>,
        seed: Box<Expr>,
        foldable: Box<Expr>,
    },
}

/// Fold association and evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldDirection {
    /// Left-associated, strict in the accumulator.
    Left,
    /// Right-associated, lazy in the accumulator.
    Right,
}

impl FoldDirection {
    /// The `Foldable` method implementing this direction.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Left => "foldl",
            Self::Right => "foldr",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    /// `++` on lists and strings
    Append,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Append => "++",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

/// `pattern -> body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

/// Match patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// `_`
    Wildcard,
    /// `x` binds the whole subject.
    Bind(String),
    Lit(Literal),
    /// `Just x`, `Writer w a`
    Constructor { name: String, fields: Vec<Pattern> },
    /// `[]`
    Nil,
    /// `x : xs`
    Cons { head: Box<Pattern>, tail: Box<Pattern> },
}

impl Pattern {
    pub fn bind(name: impl Into<String>) -> Self {
        Self::Bind(name.into())
    }

    pub fn constructor(name: impl Into<String>, fields: Vec<Pattern>) -> Self {
        Self::Constructor {
            name: name.into(),
            fields,
        }
    }

    pub fn cons(head: Pattern, tail: Pattern) -> Self {
        Self::Cons {
            head: Box::new(head),
            tail: Box::new(tail),
        }
    }
}

// ── Convenience constructors ─────────────────────────────────────────────────

impl Expr {
    pub fn int(n: i64) -> Self {
        Self::Lit(Literal::Int(n))
    }

    pub fn bool(b: bool) -> Self {
        Self::Lit(Literal::Bool(b))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Self::Lit(Literal::Str(s.into()))
    }

    pub fn unit() -> Self {
        Self::Lit(Literal::Unit)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn lambda(params: &[&str], body: Expr) -> Self {
        Self::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }

    pub fn apply(func: Expr, args: Vec<Expr>) -> Self {
        Self::Apply {
            func: Box::new(func),
            args,
        }
    }

    /// Apply a named function.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::apply(Self::var(name), args)
    }

    pub fn let_in(name: impl Into<String>, value: Expr, body: Expr) -> Self {
        Self::Let {
            name: name.into(),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    pub fn if_then_else(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn construct(constructor: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Construct {
            constructor: constructor.into(),
            args,
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::List(items)
    }

    pub fn ints(items: &[i64]) -> Self {
        Self::List(items.iter().map(|n| Self::int(*n)).collect())
    }

    pub fn match_on(subject: Expr, arms: Vec<(Pattern, Expr)>) -> Self {
        Self::Match {
            subject: Box::new(subject),
            arms: arms
                .into_iter()
                .map(|(pattern, body)| MatchArm { pattern, body })
                .collect(),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn method(interface: impl Into<String>, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Method {
            interface: interface.into(),
            method: method.into(),
            at: None,
            args,
        }
    }

    /// A method call with an explicitly named dispatch type.
    pub fn method_at(
        interface: impl Into<String>,
        method: impl Into<String>,
        at: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::Method {
            interface: interface.into(),
            method: method.into(),
            at: Some(at.into()),
            args,
        }
    }

    pub fn map(func: Expr, functor: Expr) -> Self {
        Self::Map {
            func: Box::new(func),
            functor: Box::new(functor),
        }
    }

    pub fn bind(monad: Expr, func: Expr) -> Self {
        Self::Bind {
            monad: Box::new(monad),
            func: Box::new(func),
        }
    }

    pub fn pure_at(type_name: impl Into<String>, value: Expr) -> Self {
        Self::Pure {
            type_name: type_name.into(),
            value: Box::new(value),
        }
    }

    pub fn foldl(func: Expr, seed: Expr, foldable: Expr) -> Self {
        Self::fold(FoldDirection::Left, func, seed, foldable)
    }

    pub fn foldr(func: Expr, seed: Expr, foldable: Expr) -> Self {
        Self::fold(FoldDirection::Right, func, seed, foldable)
    }

    fn fold(direction: FoldDirection, func: Expr, seed: Expr, foldable: Expr) -> Self {
        Self::Fold {
            direction,
            func: Box::new(func),
            seed: Box::new(seed),
            foldable: Box::new(foldable),
        }
    }
}
