//! Builder utilities for constructing syntax trees.
//!
//! The analyzer consumes trees produced by an external parser. The builder
//! hands out fresh [`NodeId`]s so that the prelude and tests can construct
//! trees without source text.

use std::cell::Cell;
use tinyscript_core::Span;

use crate::ast::{
    AbstractDeclaration, AnonymousFunction, ConcreteDeclaration, Declaration, DeclarationHead,
    DeclarationKind, DeclarationName, Expression, ExpressionKind, NativeDeclaration, NativeType,
    NodeId, Operator, Reference, TypeAlias, TypeExpression, TypeExpressionKind,
};

/// Allocates node ids and constructs nodes with an empty span.
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: Cell<u32>,
}

impl AstBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering at `first`, so trees from two builders never collide.
    #[must_use]
    pub fn starting_at(first: u32) -> Self {
        Self {
            next_id: Cell::new(first),
        }
    }

    /// Returns a fresh node id.
    pub fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn expression(&self, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.next_id(),
            kind,
            span: Span::default(),
        }
    }

    fn type_expression(&self, kind: TypeExpressionKind) -> TypeExpression {
        TypeExpression {
            id: self.next_id(),
            kind,
            span: Span::default(),
        }
    }

    fn declaration(&self, kind: DeclarationKind) -> Declaration {
        Declaration {
            id: self.next_id(),
            kind,
            span: Span::default(),
        }
    }

    // Expressions

    pub fn int(&self, value: i64) -> Expression {
        self.expression(ExpressionKind::Integer(value))
    }

    pub fn float(&self, value: f64) -> Expression {
        self.expression(ExpressionKind::Float(value))
    }

    pub fn string(&self, value: &str) -> Expression {
        self.expression(ExpressionKind::String(value.to_string()))
    }

    pub fn this(&self) -> Expression {
        self.expression(ExpressionKind::This)
    }

    /// A general reference: `receiver.name!arguments`.
    pub fn reference(
        &self,
        receiver: Option<Expression>,
        name: &str,
        impure: bool,
        arguments: Option<Expression>,
    ) -> Expression {
        self.expression(ExpressionKind::Reference(Reference {
            receiver: receiver.map(Box::new),
            name: name.to_string(),
            impure,
            arguments: arguments.map(Box::new),
        }))
    }

    /// `name`
    pub fn name(&self, name: &str) -> Expression {
        self.reference(None, name, false, None)
    }

    /// `name!`
    pub fn impure_name(&self, name: &str) -> Expression {
        self.reference(None, name, true, None)
    }

    /// `name[args...]` with positional arguments.
    pub fn call(&self, name: &str, arguments: Vec<Expression>) -> Expression {
        let arguments = self.arguments(arguments);
        self.reference(None, name, false, Some(arguments))
    }

    /// `name![args...]` with positional arguments.
    pub fn impure_call(&self, name: &str, arguments: Vec<Expression>) -> Expression {
        let arguments = self.arguments(arguments);
        self.reference(None, name, true, Some(arguments))
    }

    /// `target.name`
    pub fn member(&self, target: Expression, name: &str) -> Expression {
        self.reference(Some(target), name, false, None)
    }

    /// `target.name[args...]` with positional arguments.
    pub fn method_call(
        &self,
        target: Expression,
        name: &str,
        impure: bool,
        arguments: Vec<Expression>,
    ) -> Expression {
        let arguments = self.arguments(arguments);
        self.reference(Some(target), name, impure, Some(arguments))
    }

    pub fn binary(&self, operator: Operator, left: Expression, right: Expression) -> Expression {
        self.expression(ExpressionKind::Binary {
            operator,
            impure: false,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(&self, operator: Operator, operand: Expression) -> Expression {
        self.expression(ExpressionKind::Unary {
            operator,
            impure: false,
            operand: Box::new(operand),
        })
    }

    pub fn if_else(
        &self,
        condition: Expression,
        then_branch: Expression,
        else_branch: Option<Expression>,
    ) -> Expression {
        self.expression(ExpressionKind::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn elvis(&self, value: Expression, fallback: Expression) -> Expression {
        self.expression(ExpressionKind::Elvis {
            value: Box::new(value),
            fallback: Box::new(fallback),
        })
    }

    /// `(callee)[args...]`
    pub fn apply(&self, callee: Expression, impure: bool, arguments: Vec<Expression>) -> Expression {
        let arguments = self.arguments(arguments);
        self.expression(ExpressionKind::Call {
            callee: Box::new(callee),
            impure,
            arguments: Box::new(arguments),
        })
    }

    /// `[params]! -> ret => body`
    pub fn lambda(
        &self,
        impure: bool,
        params: Option<TypeExpression>,
        return_type: Option<TypeExpression>,
        body: Expression,
    ) -> Expression {
        self.expression(ExpressionKind::Function(AnonymousFunction {
            impure,
            params,
            return_type,
            body: Box::new(body),
        }))
    }

    /// An object literal from a declaration list.
    pub fn object(&self, declarations: Vec<Declaration>) -> Expression {
        self.expression(ExpressionKind::Object(declarations))
    }

    /// An object literal of named fields: `[a = 1, b = 2]`.
    pub fn record(&self, fields: Vec<(&str, Expression)>) -> Expression {
        let declarations = fields
            .into_iter()
            .map(|(name, value)| self.value(name, value))
            .collect();
        self.object(declarations)
    }

    /// An object literal of positional fields: `[1, 2]`.
    pub fn arguments(&self, values: Vec<Expression>) -> Expression {
        let declarations = values
            .into_iter()
            .map(|value| self.statement(value))
            .collect();
        self.object(declarations)
    }

    // Type expressions

    /// `Name`
    pub fn type_name(&self, name: &str) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Name {
            name: name.to_string(),
            mutable: false,
        })
    }

    /// `Name!`
    pub fn mutable_type_name(&self, name: &str) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Name {
            name: name.to_string(),
            mutable: true,
        })
    }

    pub fn object_type(&self, declarations: Vec<Declaration>) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Object(declarations))
    }

    /// A parameter list such as `[x: Int, y: Int]`.
    pub fn params(&self, params: Vec<(&str, TypeExpression)>) -> TypeExpression {
        let declarations = params
            .into_iter()
            .map(|(name, ty)| self.abstract_field(name, ty))
            .collect();
        self.object_type(declarations)
    }

    pub fn function_type(
        &self,
        impure: bool,
        params: Option<TypeExpression>,
        return_type: TypeExpression,
    ) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Function {
            impure,
            params: params.map(Box::new),
            return_type: Box::new(return_type),
        })
    }

    pub fn nullable_type(&self, inner: TypeExpression) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Nullable(Box::new(inner)))
    }

    pub fn type_of(&self, expression: Expression) -> TypeExpression {
        self.type_expression(TypeExpressionKind::Of(Box::new(expression)))
    }

    // Declarations

    /// A head for an identifier declaration.
    #[must_use]
    pub fn head(&self, name: &str) -> DeclarationHead {
        DeclarationHead::new(DeclarationName::Identifier(name.to_string()))
    }

    /// A head for an operator declaration on `receiver`.
    #[must_use]
    pub fn operator_head(&self, receiver: TypeExpression, operator: Operator) -> DeclarationHead {
        DeclarationHead::new(DeclarationName::Operator(operator)).with_receiver(receiver)
    }

    pub fn concrete(
        &self,
        head: DeclarationHead,
        annotation: Option<TypeExpression>,
        body: Expression,
    ) -> Declaration {
        self.declaration(DeclarationKind::Concrete(ConcreteDeclaration {
            head,
            annotation,
            body,
        }))
    }

    /// `name = body`
    pub fn value(&self, name: &str, body: Expression) -> Declaration {
        self.concrete(self.head(name), None, body)
    }

    /// `name! = body`
    pub fn impure_value(&self, name: &str, body: Expression) -> Declaration {
        self.concrete(self.head(name).impure(), None, body)
    }

    /// `name: Type = body`
    pub fn typed_value(&self, name: &str, annotation: TypeExpression, body: Expression) -> Declaration {
        self.concrete(self.head(name), Some(annotation), body)
    }

    /// `name[params] = body`
    pub fn function(
        &self,
        name: &str,
        params: Vec<(&str, TypeExpression)>,
        body: Expression,
    ) -> Declaration {
        let head = self.head(name).with_params(self.params(params));
        self.concrete(head, None, body)
    }

    /// `name![params] = body`
    pub fn impure_function(
        &self,
        name: &str,
        params: Vec<(&str, TypeExpression)>,
        body: Expression,
    ) -> Declaration {
        let head = self.head(name).impure().with_params(self.params(params));
        self.concrete(head, None, body)
    }

    /// `Receiver.name = body`
    pub fn method(&self, receiver: TypeExpression, name: &str, body: Expression) -> Declaration {
        self.concrete(self.head(name).with_receiver(receiver), None, body)
    }

    /// `Receiver op [params] = body`
    pub fn operator(
        &self,
        receiver: TypeExpression,
        operator: Operator,
        operand: (&str, TypeExpression),
        body: Expression,
    ) -> Declaration {
        let head = self
            .operator_head(receiver, operator)
            .with_params(self.params(vec![operand]));
        self.concrete(head, None, body)
    }

    /// `name: Type` without a value.
    pub fn abstract_field(&self, name: &str, annotation: TypeExpression) -> Declaration {
        self.abstract_declaration(self.head(name), annotation)
    }

    pub fn abstract_declaration(
        &self,
        head: DeclarationHead,
        annotation: TypeExpression,
    ) -> Declaration {
        self.declaration(DeclarationKind::Abstract(AbstractDeclaration { head, annotation }))
    }

    /// `native head: Type`
    pub fn native(&self, head: DeclarationHead, annotation: TypeExpression) -> Declaration {
        self.declaration(DeclarationKind::Native(NativeDeclaration { head, annotation }))
    }

    /// `Name = definition`
    pub fn type_alias(&self, name: &str, definition: TypeExpression) -> Declaration {
        self.declaration(DeclarationKind::TypeAlias(TypeAlias {
            name: name.to_string(),
            mutable: false,
            definition,
        }))
    }

    /// `Name! = definition`
    pub fn mutable_type_alias(&self, name: &str, definition: TypeExpression) -> Declaration {
        self.declaration(DeclarationKind::TypeAlias(TypeAlias {
            name: name.to_string(),
            mutable: true,
            definition,
        }))
    }

    /// `native type Name` or `native type Name!`
    pub fn native_type(&self, name: &str, mutable: bool) -> Declaration {
        self.declaration(DeclarationKind::NativeType(NativeType {
            name: name.to_string(),
            mutable,
        }))
    }

    /// `&target`
    pub fn inherit(&self, target: Expression) -> Declaration {
        self.declaration(DeclarationKind::Inherit(target))
    }

    /// A bare expression statement.
    pub fn statement(&self, expression: Expression) -> Declaration {
        self.declaration(DeclarationKind::Expression(expression))
    }
}
