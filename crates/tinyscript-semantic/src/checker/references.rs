//! Name resolution through the scope chain.

use std::rc::Rc;
use tinyscript_ast::{Expression, ExpressionKind, Reference};
use tinyscript_core::types::{FunctionType, ObjectType, Type};
use tinyscript_core::{Error, Result, Span};

use super::core::Analyzer;
use crate::results::{Access, Typed};
use crate::scope::{Scope, ScopeId, ScopeKind, ThisSource};
use crate::signature::{Query, Shape, Symbol, SymbolValue};

/// What a lookup found.
#[derive(Debug, Clone)]
pub(crate) enum Found<'a> {
    /// A declared or intrinsic symbol.
    Symbol {
        symbol: Rc<Symbol<'a>>,
        access: Access,
    },
    /// A parameter, a receiver field or an inherited field.
    Field { ty: Type, access: Access },
}

impl Found<'_> {
    pub(crate) fn access(&self) -> Access {
        match self {
            Found::Symbol { access, .. } | Found::Field { access, .. } => *access,
        }
    }

    fn with_access(self, access: Access) -> Self {
        match self {
            Found::Symbol { symbol, .. } => Found::Symbol { symbol, access },
            Found::Field { ty, .. } => Found::Field { ty, access },
        }
    }
}

impl<'a> Analyzer<'a> {
    /// Walks the chain innermost-first and returns the first scope's answer.
    pub(crate) fn resolve(
        &self,
        scope: ScopeId,
        query: &Query,
        span: Span,
    ) -> Result<Option<Found<'a>>> {
        for ty in query.types() {
            self.realize(ty)?;
        }
        for scope in self.scopes.chain(scope) {
            if let Some(found) = self.resolve_local(&scope, query, span)? {
                tracing::trace!(%query, scope = %scope.id, "resolved");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Answers a query from a single scope, without consulting its parents
    /// except where the scope kind delegates a rewritten query.
    pub(crate) fn resolve_local(
        &self,
        scope: &Scope<'a>,
        query: &Query,
        span: Span,
    ) -> Result<Option<Found<'a>>> {
        match &scope.kind {
            ScopeKind::Global | ScopeKind::Declaration { .. } => {
                for head in scope.pending_heads(&query.name) {
                    self.force(&head, false)?;
                }
                let mut matches = Vec::new();
                for symbol in scope.symbols() {
                    if symbol.signature.key() != query.name {
                        continue;
                    }
                    if let Some(receiver) = symbol.signature.receiver() {
                        self.realize(receiver)?;
                    }
                    if let Some(params) = symbol.signature.params() {
                        for (_, param) in params.fields() {
                            self.realize(param)?;
                        }
                    }
                    if query.matches(&symbol.signature) {
                        matches.push(symbol);
                    }
                }
                if matches.len() > 1 {
                    return Err(Error::AmbiguousSignature {
                        signature: query.to_string(),
                        candidates: matches.len(),
                        span,
                    });
                }
                Ok(matches.pop().map(|symbol| {
                    let access = match &scope.kind {
                        ScopeKind::Global => Access::Intrinsic,
                        ScopeKind::Declaration { object: true, .. } => {
                            if is_plain_value(&symbol) {
                                Access::ThisField
                            } else {
                                Access::ThisMethod
                            }
                        }
                        _ => Access::Local,
                    };
                    Found::Symbol { symbol, access }
                }))
            }
            ScopeKind::Parameters { params, .. } => {
                Ok(plain_field(params, query).map(|ty| Found::Field {
                    ty,
                    access: Access::Parameter,
                }))
            }
            ScopeKind::This { receiver, .. } => {
                if query.receiver.is_some() || matches!(query.shape, Shape::Operator { .. }) {
                    return Ok(None);
                }
                self.realize(receiver)?;
                if let Some(object) = receiver.as_object()
                    && let Some(ty) = plain_field(object, query)
                {
                    return Ok(Some(Found::Field {
                        ty,
                        access: Access::ThisField,
                    }));
                }
                let Some(parent) = scope.parent else {
                    return Ok(None);
                };
                let found = self.resolve(parent, &query.with_receiver(receiver.clone()), span)?;
                Ok(found.map(|found| found.with_access(Access::ThisMethod)))
            }
            ScopeKind::Object(frame) => {
                let Some(inheritance) = frame.inheritance.get() else {
                    return Ok(None);
                };
                if query.receiver.is_some() || !matches!(query.shape, Shape::Value) {
                    return Ok(None);
                }
                Ok(inheritance
                    .field(&query.name)
                    .filter(|field| field.ty.is_mutable() == query.impure)
                    .map(|field| Found::Field {
                        ty: field.ty.clone(),
                        access: Access::ThisField,
                    }))
            }
        }
    }

    /// Tries each shape, then each shape with the impurity marker flipped to
    /// report a marker mismatch instead of a missing name.
    pub(crate) fn lookup(
        &self,
        base: &Query,
        shapes: &[Shape],
        span: Span,
        resolve: impl Fn(&Query) -> Result<Option<Found<'a>>>,
    ) -> Result<(Found<'a>, Shape)> {
        for shape in shapes {
            if let Some(found) = resolve(&base.with_shape(shape.clone()))? {
                return Ok((found, shape.clone()));
            }
        }
        for shape in shapes {
            if resolve(&base.with_shape(shape.clone()).flipped())?.is_some() {
                return Err(marker_mismatch(&base.name, base.impure, span));
            }
        }
        Err(Error::UnresolvedReference {
            what: base.to_string(),
            span,
        })
    }

    /// The type a binding contributes for the shape it was found with.
    pub(crate) fn bind(&self, found: &Found<'a>, shape: &Shape) -> Result<Type> {
        let symbol = match found {
            Found::Field { ty, .. } => return Ok(ty.clone()),
            Found::Symbol { symbol, .. } => symbol,
        };
        match shape {
            Shape::FunctionValue => {
                let result = self.symbol_result(symbol)?;
                Ok(Type::Function(Rc::new(FunctionType::new(
                    symbol.signature.is_impure(),
                    symbol.signature.params().cloned(),
                    result,
                ))))
            }
            Shape::Operator { lhs, rhs, .. } => match &symbol.value {
                SymbolValue::Builtin(builtin) => {
                    Ok(self.intrinsics.evaluate(*builtin, lhs.as_ref(), rhs))
                }
                _ => self.symbol_result(symbol),
            },
            Shape::Value | Shape::Call(_) => self.symbol_result(symbol),
        }
    }

    /// The value type of a symbol, or its return type when it takes
    /// parameters. An annotation is used without forcing the body.
    pub(crate) fn symbol_result(&self, symbol: &Symbol<'a>) -> Result<Type> {
        match &symbol.value {
            SymbolValue::Known(ty) => Ok(ty.clone()),
            SymbolValue::Builtin(_) => Ok(Type::Any),
            SymbolValue::Declared { annotation, body } => match (annotation, body) {
                (Some(annotation), _) => self.force(annotation, false),
                (None, Some(body)) => Ok(self.force(body, false)?.ty),
                (None, None) => Ok(Type::Any),
            },
        }
    }

    /// Applies a function value to an argument object.
    pub(crate) fn call_value(
        &self,
        callee: &Type,
        name: &str,
        impure: bool,
        arguments: &ObjectType,
        span: Span,
    ) -> Result<Type> {
        let not_callable = || Error::InvalidAnonymousFunctionCall {
            found: callee.to_string(),
            span,
        };
        let function = callee.as_function().ok_or_else(not_callable)?;
        let accepted = match &function.params {
            Some(params) => params.accepts_arguments(arguments),
            None => arguments.is_empty(),
        };
        if !accepted {
            return Err(not_callable());
        }
        if function.impure != impure {
            return Err(marker_mismatch(name, impure, span));
        }
        Ok(function.return_type.clone())
    }

    pub(crate) fn reference(
        &self,
        expression: &'a Expression,
        reference: &'a Reference,
        scope: ScopeId,
    ) -> Result<Typed> {
        let arguments = match &reference.arguments {
            Some(arguments) => Some(self.arguments(arguments, scope)?),
            None => None,
        };
        let arguments_impure = arguments.as_ref().is_some_and(|(_, impure)| *impure);
        let arguments = arguments.map(|(object, _)| object);

        let (ty, access) = match reference.receiver.as_deref() {
            Some(target) if matches!(target.kind, ExpressionKind::This) => {
                self.this_member(target, reference, arguments.as_ref(), scope, expression.span)?
            }
            Some(target) => {
                let target_typed = self.expression(target, scope)?;
                self.member(&target_typed.ty, reference, arguments.as_ref(), scope, expression.span)?
            }
            None => {
                let base = Query::value(&reference.name, reference.impure);
                let shapes = shapes_for(arguments.as_ref());
                let (found, shape) = self.lookup(&base, &shapes, expression.span, |query| {
                    self.resolve(scope, query, expression.span)
                })?;
                let ty = self.apply_binding(&found, &shape, reference, arguments.as_ref(), expression.span)?;
                (ty, found.access())
            }
        };

        let typed = Typed::new(ty, reference.impure || arguments_impure);
        self.record(expression.id, scope, &typed, Some(access));
        Ok(typed)
    }

    /// `target.name`: a field of the target, or a receiver function applied
    /// to it.
    fn member(
        &self,
        target: &Type,
        reference: &Reference,
        arguments: Option<&Rc<ObjectType>>,
        scope: ScopeId,
        span: Span,
    ) -> Result<(Type, Access)> {
        self.realize(target)?;
        if let Some(field) = target.field(&reference.name) {
            let ty = match arguments {
                Some(arguments) => {
                    self.call_value(&field, &reference.name, reference.impure, arguments, span)?
                }
                None => {
                    if field.is_mutable() != reference.impure {
                        return Err(marker_mismatch(&reference.name, reference.impure, span));
                    }
                    field
                }
            };
            return Ok((ty, Access::Member));
        }

        let base = Query::value(&reference.name, reference.impure).with_receiver(target.clone());
        let shapes = shapes_for(arguments);
        match self.lookup(&base, &shapes, span, |query| self.resolve(scope, query, span)) {
            Ok((found, shape)) => {
                let ty = self.apply_binding(&found, &shape, reference, arguments, span)?;
                Ok((ty, Access::Method))
            }
            Err(Error::UnresolvedReference { .. }) if target.as_object().is_some() => {
                Err(Error::ObjectFieldNotFound {
                    field: reference.name.clone(),
                    object: target.to_string(),
                    span,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// `this.name`: resolves a single member of the object being built
    /// without forcing the rest of it.
    fn this_member(
        &self,
        target: &'a Expression,
        reference: &Reference,
        arguments: Option<&Rc<ObjectType>>,
        scope: ScopeId,
        span: Span,
    ) -> Result<(Type, Access)> {
        for current in self.scopes.chain(scope) {
            match &current.kind {
                ScopeKind::This { receiver, .. } => {
                    let receiver = receiver.clone();
                    self.record(target.id, scope, &Typed::pure(receiver.clone()), Some(Access::This));
                    return self.member(&receiver, reference, arguments, scope, span);
                }
                ScopeKind::Object(frame) if frame.this.get().is_some() => {
                    let Some(&members) = frame.members.get() else {
                        continue;
                    };
                    let members = self.scope(members);
                    let base = Query::value(&reference.name, reference.impure);
                    let shapes = shapes_for(arguments);
                    let result = self.lookup(&base, &shapes, span, |query| {
                        match self.resolve_local(&members, query, span)? {
                            Some(found) => Ok(Some(found)),
                            None => self.resolve_local(&current, query, span),
                        }
                    });
                    return match result {
                        Ok((found, shape)) => {
                            let ty = self.apply_binding(&found, &shape, reference, arguments, span)?;
                            Ok((ty, found.access()))
                        }
                        Err(Error::UnresolvedReference { .. }) => Err(Error::ObjectFieldNotFound {
                            field: reference.name.clone(),
                            object: "this".to_string(),
                            span,
                        }),
                        Err(error) => Err(error),
                    };
                }
                _ => {}
            }
        }
        Err(Error::UnresolvedReference {
            what: "`this`".to_string(),
            span,
        })
    }

    /// The type of a bare `this`.
    pub(crate) fn this_type(&self, scope: ScopeId, span: Span) -> Result<Type> {
        for current in self.scopes.chain(scope) {
            match &current.kind {
                ScopeKind::This { receiver, .. } => return Ok(receiver.clone()),
                ScopeKind::Object(frame) => match frame.this.get() {
                    Some(ThisSource::Literal(cell)) => {
                        let cell = Rc::clone(cell);
                        return Ok(self.force(&cell, false)?.ty);
                    }
                    Some(ThisSource::Class(ty)) => return Ok(ty.clone()),
                    None => {}
                },
                _ => {}
            }
        }
        Err(Error::UnresolvedReference {
            what: "`this`".to_string(),
            span,
        })
    }

    fn apply_binding(
        &self,
        found: &Found<'a>,
        shape: &Shape,
        reference: &Reference,
        arguments: Option<&Rc<ObjectType>>,
        span: Span,
    ) -> Result<Type> {
        let ty = self.bind(found, shape)?;
        match (shape, arguments) {
            (Shape::Value, Some(arguments)) => {
                self.call_value(&ty, &reference.name, reference.impure, arguments, span)
            }
            _ => Ok(ty),
        }
    }

    /// Analyzes an argument object, returning its shape and impurity.
    fn arguments(&self, arguments: &'a Expression, scope: ScopeId) -> Result<(Rc<ObjectType>, bool)> {
        let typed = self.expression(arguments, scope)?;
        let object = match &typed.ty {
            Type::Object(object) => Rc::clone(object),
            other => Rc::new(other.as_object().cloned().unwrap_or_default()),
        };
        Ok((object, typed.impure))
    }
}

/// Shapes tried for an unqualified or receiver reference, most specific
/// first.
fn shapes_for(arguments: Option<&Rc<ObjectType>>) -> Vec<Shape> {
    match arguments {
        Some(arguments) => vec![Shape::Call(Rc::clone(arguments)), Shape::Value],
        None => vec![Shape::Value, Shape::FunctionValue],
    }
}

/// A field of `object` answering a plain, receiverless value query whose
/// marker agrees with the field's mutability.
fn plain_field(object: &ObjectType, query: &Query) -> Option<Type> {
    if query.receiver.is_some() || !matches!(query.shape, Shape::Value) {
        return None;
    }
    object
        .field(&query.name)
        .filter(|ty| ty.is_mutable() == query.impure)
        .cloned()
}

fn is_plain_value(symbol: &Symbol<'_>) -> bool {
    symbol.signature.receiver().is_none() && symbol.signature.params().is_none()
}

fn marker_mismatch(name: &str, impure: bool, span: Span) -> Error {
    if impure {
        Error::UnexpectedImpurityMarker {
            name: name.to_string(),
            span,
        }
    } else {
        Error::PureScope {
            name: name.to_string(),
            span,
        }
    }
}
