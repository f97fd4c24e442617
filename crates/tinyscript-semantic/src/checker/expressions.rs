//! Expression analysis.

use std::rc::Rc;
use tinyscript_ast::{AnonymousFunction, Expression, ExpressionKind, Operator};
use tinyscript_core::types::{FunctionType, ObjectType, Type};
use tinyscript_core::{Result, Span};

use super::core::Analyzer;
use crate::results::{Access, Typed};
use crate::scope::{ScopeId, ScopeKind};
use crate::signature::Query;

impl<'a> Analyzer<'a> {
    /// Analyzes an expression and records its type in the result map.
    pub(crate) fn expression(&self, expression: &'a Expression, scope: ScopeId) -> Result<Typed> {
        let (typed, access) = match &expression.kind {
            ExpressionKind::Integer(value) => (Typed::pure(Type::int_literal(*value)), None),
            ExpressionKind::Float(value) => (Typed::pure(Type::float_literal(*value)), None),
            ExpressionKind::String(_) => (Typed::pure(self.intrinsics.string.clone()), None),
            ExpressionKind::This => (
                Typed::pure(self.this_type(scope, expression.span)?),
                Some(Access::This),
            ),

            // Records its own access kind.
            ExpressionKind::Reference(reference) => {
                return self.reference(expression, reference, scope);
            }

            ExpressionKind::Binary {
                operator,
                impure,
                left,
                right,
            } => {
                let left = self.expression(left, scope)?;
                let right = self.expression(right, scope)?;
                let (ty, access) = self.operator(
                    Some(left.ty),
                    *operator,
                    *impure,
                    right.ty,
                    scope,
                    expression.span,
                )?;
                (Typed::new(ty, *impure || left.impure || right.impure), Some(access))
            }

            ExpressionKind::Unary {
                operator,
                impure,
                operand,
            } => {
                let operand = self.expression(operand, scope)?;
                let (ty, access) =
                    self.operator(None, *operator, *impure, operand.ty, scope, expression.span)?;
                (Typed::new(ty, *impure || operand.impure), Some(access))
            }

            ExpressionKind::If {
                condition,
                then_branch,
                else_branch,
            } => (
                self.conditional(condition, then_branch, else_branch.as_deref(), scope)?,
                None,
            ),

            ExpressionKind::Elvis { value, fallback } => {
                let value = self.expression(value, scope)?;
                let fallback = self.expression(fallback, scope)?;
                let inner = match &value.ty {
                    Type::Nullable(inner) => inner.as_ref().clone(),
                    other => other.clone(),
                };
                (
                    Typed {
                        ty: inner.join(&fallback.ty),
                        impure: value.impure || fallback.impure,
                        provisional: value.provisional || fallback.provisional,
                    },
                    None,
                )
            }

            ExpressionKind::Call {
                callee,
                impure,
                arguments,
            } => {
                let callee_typed = self.expression(callee, scope)?;
                let arguments_typed = self.expression(arguments, scope)?;
                let arguments = arguments_typed
                    .ty
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let ty = self.call_value(
                    &callee_typed.ty,
                    "anonymous function",
                    *impure,
                    &arguments,
                    expression.span,
                )?;
                (
                    Typed::new(ty, *impure || callee_typed.impure || arguments_typed.impure),
                    None,
                )
            }

            ExpressionKind::Function(function) => {
                (self.anonymous_function(function, scope, expression.span)?, None)
            }

            ExpressionKind::Object(declarations) => {
                (self.object_literal(declarations, scope, expression.span)?, None)
            }
        };

        self.record(expression.id, scope, &typed, access);
        Ok(typed)
    }

    fn operator(
        &self,
        lhs: Option<Type>,
        operator: Operator,
        impure: bool,
        rhs: Type,
        scope: ScopeId,
        span: Span,
    ) -> Result<(Type, Access)> {
        let query = Query::operator(lhs, operator, impure, rhs);
        let shapes = [query.shape.clone()];
        let (found, shape) = self.lookup(&query, &shapes, span, |query| {
            self.resolve(scope, query, span)
        })?;
        let ty = self.bind(&found, &shape)?;
        Ok((ty, found.access()))
    }

    /// An `if`. A branch that re-enters a function body still resolving is
    /// skipped: the other branch supplies a provisional type, widened to the
    /// full numeric range, and the skipped branch is re-checked against it
    /// after the block resolves.
    fn conditional(
        &self,
        condition: &'a Expression,
        then_branch: &'a Expression,
        else_branch: Option<&'a Expression>,
        scope: ScopeId,
    ) -> Result<Typed> {
        let condition_typed = self.expression(condition, scope)?;
        self.check_accepts(&self.intrinsics.bool, &condition_typed.ty, condition.span, || {
            "if condition".to_string()
        })?;

        let Some(else_branch) = else_branch else {
            let then = self.expression(then_branch, scope)?;
            return Ok(Typed {
                ty: Type::nullable(then.ty),
                impure: condition_typed.impure || then.impure,
                provisional: then.provisional,
            });
        };

        let (then, otherwise) = match self.expression(then_branch, scope) {
            Ok(then) => match self.expression(else_branch, scope) {
                Ok(otherwise) => (then, otherwise),
                Err(error) if error.is_recoverable_cycle() => {
                    let then = provisional(then, condition_typed.impure);
                    self.defer_branch(scope, else_branch, then.ty.clone());
                    return Ok(then);
                }
                Err(error) => return Err(error),
            },
            Err(error) if error.is_recoverable_cycle() => {
                let otherwise = self.expression(else_branch, scope)?;
                let otherwise = provisional(otherwise, condition_typed.impure);
                self.defer_branch(scope, then_branch, otherwise.ty.clone());
                return Ok(otherwise);
            }
            Err(error) => return Err(error),
        };

        Ok(Typed {
            ty: then.ty.join(&otherwise.ty),
            impure: condition_typed.impure || then.impure || otherwise.impure,
            provisional: then.provisional || otherwise.provisional,
        })
    }

    fn anonymous_function(
        &self,
        function: &'a AnonymousFunction,
        scope: ScopeId,
        span: Span,
    ) -> Result<Typed> {
        let params = match &function.params {
            Some(params) => Some(self.params_type(params, scope)?),
            None => None,
        };
        let body_scope = self.scopes.push(
            Some(scope),
            ScopeKind::Parameters {
                params: params
                    .clone()
                    .unwrap_or_else(|| Rc::new(ObjectType::empty())),
                impure: function.impure,
            },
        );

        let body = self.expression(&function.body, body_scope)?;
        let return_type = match &function.return_type {
            Some(annotation) => {
                let expected = self.type_expression(annotation, scope)?;
                self.check_accepts(&expected, &body.ty, function.body.span, || {
                    "anonymous function result".to_string()
                })?;
                expected
            }
            None => body.ty.clone(),
        };

        let ty = FunctionType::new(function.impure, params, return_type);
        self.check_anonymous_purity(&ty, &body, span)?;
        Ok(Typed::pure(Type::Function(Rc::new(ty))))
    }
}

fn provisional(typed: Typed, condition_impure: bool) -> Typed {
    Typed {
        ty: typed.ty.widen(),
        impure: condition_impure || typed.impure,
        provisional: true,
    }
}
