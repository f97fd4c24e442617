//! Type-expression analysis and type aliases.

use std::rc::Rc;
use tinyscript_ast::{Declaration, DeclarationKind, TypeAlias, TypeExpression, TypeExpressionKind};
use tinyscript_core::types::{FunctionType, ObjectType, Type};
use tinyscript_core::{Error, Result, Span};

use super::Lazy;
use super::core::Analyzer;
use super::objects::ObjectKind;
use crate::results::{DeclarationCategory, ResolvedDeclaration};
use crate::scope::ScopeId;

impl<'a> Analyzer<'a> {
    pub(crate) fn type_expression(
        &self,
        expression: &'a TypeExpression,
        scope: ScopeId,
    ) -> Result<Type> {
        match &expression.kind {
            TypeExpressionKind::Name { name, mutable } => {
                let cell = self.find_type(scope, name, *mutable).ok_or_else(|| {
                    Error::UnresolvedReference {
                        what: format!("type `{name}{}`", if *mutable { "!" } else { "" }),
                        span: expression.span,
                    }
                })?;
                self.force(&cell, false)
            }
            TypeExpressionKind::Object(declarations) => {
                self.object_type(declarations, scope, expression.span)
            }
            TypeExpressionKind::Function {
                impure,
                params,
                return_type,
            } => {
                let params = match params {
                    Some(params) => Some(self.params_type(params, scope)?),
                    None => None,
                };
                let return_type = self.type_expression(return_type, scope)?;
                Ok(Type::Function(Rc::new(FunctionType::new(
                    *impure,
                    params,
                    return_type,
                ))))
            }
            TypeExpressionKind::Nullable(inner) => {
                Ok(Type::nullable(self.type_expression(inner, scope)?))
            }
            TypeExpressionKind::Of(value) => {
                let typed = self.expression(value, scope)?;
                if typed.impure {
                    return Err(Error::PureScope {
                        name: "typeof operand".to_string(),
                        span: value.span,
                    });
                }
                Ok(typed.ty)
            }
        }
    }

    /// A parameter list must denote an object type.
    pub(crate) fn params_type(
        &self,
        expression: &'a TypeExpression,
        scope: ScopeId,
    ) -> Result<Rc<ObjectType>> {
        let ty = self.type_expression(expression, scope)?;
        match &ty {
            Type::Object(object) => Ok(Rc::clone(object)),
            Type::Class(class) => {
                self.realize(&ty)?;
                match class.body() {
                    Some(body) => Ok(Rc::clone(&body.object)),
                    None => Err(Error::Cycle {
                        name: class.name.clone(),
                        recoverable: false,
                        span: expression.span,
                    }),
                }
            }
            other => Err(Error::InvalidDeclaration(
                format!("parameters must be an object type, found `{other}`"),
                expression.span,
            )),
        }
    }

    /// Finds a type cell in the nearest scope that declares it.
    pub(crate) fn find_type(&self, scope: ScopeId, name: &str, mutable: bool) -> Option<Lazy<'a, Type>> {
        self.scopes
            .chain(scope)
            .iter()
            .find_map(|scope| scope.find_type(name, mutable))
    }

    /// Resolves a named type visible from `scope`.
    ///
    /// # Errors
    /// Returns the error of the type's definition, if it fails to resolve.
    pub fn lookup_type(&self, scope: ScopeId, name: &str, mutable: bool) -> Result<Option<Type>> {
        match self.find_type(scope, name, mutable) {
            Some(cell) => Ok(Some(self.force(&cell, false)?)),
            None => Ok(None),
        }
    }

    /// Structural object type. Plain field lists take the short path;
    /// anything with defaults, members or bases is analyzed as a body.
    fn object_type(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        span: Span,
    ) -> Result<Type> {
        let plain = declarations.iter().all(|declaration| {
            matches!(&declaration.kind, DeclarationKind::Abstract(field)
                if field.head.receiver.is_none()
                    && field.head.params.is_none()
                    && field.head.identifier().is_some())
        });
        if !plain {
            let object = self.object_body(declarations, scope, ObjectKind::Structural, span)?;
            return Ok(Type::Object(Rc::new(object.object)));
        }

        let mut fields = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            if let DeclarationKind::Abstract(field) = &declaration.kind {
                let name = field.head.name.to_string();
                if fields.iter().any(|(existing, _)| *existing == name) {
                    return Err(Error::DuplicateDeclaration {
                        name,
                        span: declaration.span,
                    });
                }
                fields.push((name, self.type_expression(&field.annotation, scope)?));
            }
        }
        Ok(Type::object(fields))
    }

    /// Producer of a type alias cell.
    pub(crate) fn resolve_type_alias(
        &self,
        declaration: &'a Declaration,
        alias: &'a TypeAlias,
        scope: ScopeId,
    ) -> Result<Type> {
        let ty = match &alias.definition.kind {
            TypeExpressionKind::Object(body) => {
                self.declare_class(alias, body, scope, declaration.span)?
            }
            _ => {
                let ty = self.type_expression(&alias.definition, scope)?;
                self.check_type_mutability(&alias.name, alias.mutable, &ty, declaration.span)?;
                ty
            }
        };

        self.record_declaration(
            scope,
            ResolvedDeclaration {
                id: declaration.id,
                name: alias.name.clone(),
                category: DeclarationCategory::TypeAlias,
                signature: None,
                ty: ty.clone(),
                impure: false,
            },
        );
        Ok(ty)
    }

    pub(crate) fn check_type_mutability(
        &self,
        name: &str,
        declared: bool,
        expansion: &Type,
        span: Span,
    ) -> Result<()> {
        let found = expansion.is_mutable();
        if found == declared {
            return Ok(());
        }
        let label = |mutable: bool| if mutable { "mutable" } else { "immutable" };
        Err(Error::TypeMutable {
            name: name.to_string(),
            declared: label(declared),
            found: label(found),
            expansion: expansion.to_string(),
            span,
        })
    }
}
