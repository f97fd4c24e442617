//! Abstract Syntax Tree (AST) definitions for TinyScript.
//!
//! The tree is produced by an external parser. Every node carries a
//! [`NodeId`] so that analysis results can be keyed by node.

use std::fmt;
use tinyscript_core::Span;

/// Identity of a syntax node, unique within one parse session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A declaration in a file, an object body or an object type body.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: NodeId,
    pub kind: DeclarationKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    /// `Name = Type` or `Name! = Type`
    TypeAlias(TypeAlias),
    /// `native type Name` or `native type Name!`
    NativeType(NativeType),
    /// `[Receiver.]name[!][params][: Type] = body`
    Concrete(ConcreteDeclaration),
    /// `[Receiver.]name[!][params]: Type`, a declaration without a value
    Abstract(AbstractDeclaration),
    /// `native [Receiver.]name[!][params]: Type`
    Native(NativeDeclaration),
    /// `&Base`
    Inherit(Expression),
    /// A bare expression statement (an unnamed field).
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: String,
    pub mutable: bool,
    pub definition: TypeExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeType {
    pub name: String,
    pub mutable: bool,
}

/// The name of a value declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclarationName {
    Identifier(String),
    Operator(Operator),
}

impl fmt::Display for DeclarationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationName::Identifier(name) => write!(f, "{name}"),
            DeclarationName::Operator(operator) => write!(f, "({operator})"),
        }
    }
}

/// Declaration modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_override: bool,
    pub is_private: bool,
}

/// Everything before the `=` or `:` of a value declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationHead {
    pub receiver: Option<TypeExpression>,
    pub name: DeclarationName,
    pub impure: bool,
    /// Parameter object type, e.g. `[x: Int, y: Int]`.
    pub params: Option<TypeExpression>,
    pub modifiers: Modifiers,
}

impl DeclarationHead {
    #[must_use]
    pub fn new(name: DeclarationName) -> Self {
        Self {
            receiver: None,
            name,
            impure: false,
            params: None,
            modifiers: Modifiers::default(),
        }
    }

    #[must_use]
    pub fn impure(mut self) -> Self {
        self.impure = true;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: TypeExpression) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, receiver: TypeExpression) -> Self {
        self.receiver = Some(receiver);
        self
    }

    #[must_use]
    pub fn overriding(mut self) -> Self {
        self.modifiers.is_override = true;
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.modifiers.is_private = true;
        self
    }

    /// The identifier, if this is not an operator declaration.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match &self.name {
            DeclarationName::Identifier(name) => Some(name),
            DeclarationName::Operator(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteDeclaration {
    pub head: DeclarationHead,
    pub annotation: Option<TypeExpression>,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbstractDeclaration {
    pub head: DeclarationHead,
    pub annotation: TypeExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeDeclaration {
    pub head: DeclarationHead,
    pub annotation: TypeExpression,
}

/// Binary and unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
}

impl Operator {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Integer(i64),
    Float(f64),
    String(String),

    /// `name`, `name!`, `name[args]`, `target.name![args]`, ...
    Reference(Reference),

    This,

    /// `left op right`
    Binary {
        operator: Operator,
        impure: bool,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `op operand`
    Unary {
        operator: Operator,
        impure: bool,
        operand: Box<Expression>,
    },

    /// `if (condition) then else otherwise`
    If {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Option<Box<Expression>>,
    },

    /// `value ?: fallback`
    Elvis {
        value: Box<Expression>,
        fallback: Box<Expression>,
    },

    /// `(callee)[args]` for callees that are not plain references.
    Call {
        callee: Box<Expression>,
        impure: bool,
        arguments: Box<Expression>,
    },

    /// `[params]! => body`
    Function(AnonymousFunction),

    /// `[a = 1, b = 2]`, `[1, 2]`, `[&Base, c = 3]`
    Object(Vec<Declaration>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub receiver: Option<Box<Expression>>,
    pub name: String,
    pub impure: bool,
    /// An object literal holding the arguments.
    pub arguments: Option<Box<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousFunction {
    pub impure: bool,
    pub params: Option<TypeExpression>,
    pub return_type: Option<TypeExpression>,
    pub body: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpression {
    pub id: NodeId,
    pub kind: TypeExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpressionKind {
    /// `Name` or `Name!`
    Name { name: String, mutable: bool },
    /// `[x: Int, y = 2, &Base]`
    Object(Vec<Declaration>),
    /// `fn[params] -> Type` or `fn![params] -> Type`
    Function {
        impure: bool,
        params: Option<Box<TypeExpression>>,
        return_type: Box<TypeExpression>,
    },
    /// `Type?`
    Nullable(Box<TypeExpression>),
    /// `typeof expression`
    Of(Box<Expression>),
}
