//! The two-phase declaration pipeline: hoist, then finalize.

use std::collections::HashMap;
use std::rc::Rc;
use tinyscript_ast::{
    ConcreteDeclaration, Declaration, DeclarationHead, DeclarationKind, DeclarationName,
    Expression, NativeType, TypeAlias, TypeExpression,
};
use tinyscript_core::types::{AtomicType, FunctionType, ObjectType, Type};
use tinyscript_core::{Error, Result, Span};

use super::Lazy;
use super::core::{Analyzer, Owner};
use crate::deferred::Deferred;
use crate::results::{DeclarationCategory, ResolvedDeclaration, Typed};
use crate::scope::{ScopeId, ScopeKind};
use crate::signature::{Signature, Symbol, SymbolFlags, SymbolValue};

/// Where a declaration block appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockMode {
    /// A file or top-level block.
    File,
    /// An object literal or object type body.
    Object { abstract_allowed: bool },
}

/// A hoisted declaration waiting to be finalized.
#[derive(Clone)]
pub(crate) enum Entry<'a> {
    Type {
        declaration: &'a Declaration,
        name: String,
        cell: Lazy<'a, Type>,
        native: bool,
    },
    Value {
        declaration: &'a Declaration,
        symbol: Rc<Symbol<'a>>,
        /// Contributes a field to the enclosing object.
        member: bool,
    },
    Statement {
        declaration: &'a Declaration,
        name: String,
        cell: Lazy<'a, Typed>,
    },
}

/// A finalized declaration that contributes a field to an object.
#[derive(Debug, Clone)]
pub(crate) struct BlockMember {
    pub name: String,
    pub ty: Type,
    /// Evaluating the member while building the object has an effect.
    pub impure: bool,
    pub flags: SymbolFlags,
    pub span: Span,
}

/// The parts of a declaration head computed during hoisting.
#[derive(Clone)]
struct Head {
    name: String,
    signature: Signature,
    /// Scope the body is analyzed in: parameters, then receiver, then the
    /// declaration scope.
    body_scope: ScopeId,
    category: DeclarationCategory,
}

impl<'a> Analyzer<'a> {
    /// Hoists and finalizes a declaration block, returning the members that
    /// contribute fields to an enclosing object.
    pub(crate) fn analyze_block(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        mode: BlockMode,
    ) -> Result<Vec<BlockMember>> {
        let entries = self.hoist(declarations, scope, mode)?;
        self.finalize(&entries, scope)
    }

    /// Registers every declaration of the block in `scope` without
    /// analyzing any body.
    pub(crate) fn hoist(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        mode: BlockMode,
    ) -> Result<Vec<Entry<'a>>> {
        let target = self.scope(scope);

        tracing::debug!(%scope, "hoisting types");
        let mut types = HashMap::new();
        for (index, declaration) in declarations.iter().enumerate() {
            let (name, mutable, cell, native) = match &declaration.kind {
                DeclarationKind::TypeAlias(alias) => (
                    &alias.name,
                    alias.mutable,
                    self.hoist_type_alias(declaration, alias, scope),
                    false,
                ),
                DeclarationKind::NativeType(native) => (
                    &native.name,
                    native.mutable,
                    self.hoist_native_type(native, declaration.span),
                    true,
                ),
                _ => continue,
            };
            target.define_type(name, mutable, Rc::clone(&cell), declaration.span)?;
            types.insert(
                index,
                Entry::Type {
                    declaration,
                    name: name.clone(),
                    cell,
                    native,
                },
            );
        }

        tracing::debug!(%scope, "hoisting values");
        let mut slots = Vec::with_capacity(declarations.len());
        let mut heads = Vec::new();
        for (index, declaration) in declarations.iter().enumerate() {
            if let Some(entry) = types.remove(&index) {
                slots.push(Some(entry));
                continue;
            }

            let entry = match &declaration.kind {
                DeclarationKind::TypeAlias(_) | DeclarationKind::NativeType(_) => None,
                DeclarationKind::Concrete(_)
                | DeclarationKind::Abstract(_)
                | DeclarationKind::Native(_) => {
                    let head = value_head(declaration)?;
                    if head.receiver.is_none() && head.params.is_none() {
                        let symbol = self.hoist_value(declaration, scope, mode)?;
                        target.define(Rc::clone(&symbol))?;
                        Some(Entry::Value {
                            declaration,
                            symbol,
                            member: is_member(head),
                        })
                    } else {
                        let cell = self.head_cell(declaration, head, scope, mode);
                        target.defer_head(signature_key(head), Rc::clone(&cell));
                        heads.push((slots.len(), declaration, head, cell));
                        None
                    }
                }
                DeclarationKind::Expression(expression) => {
                    Some(self.hoist_statement(declaration, expression, index, scope))
                }
                DeclarationKind::Inherit(_) => {
                    if mode == BlockMode::File {
                        return Err(Error::InvalidDeclaration(
                            "inherit statements are only allowed inside objects".to_string(),
                            declaration.span,
                        ));
                    }
                    None
                }
            };
            slots.push(entry);
        }

        // Heads run after every plain value is registered. A lookup may
        // have forced one already.
        for (slot, declaration, head, cell) in heads {
            let symbol = self.force(&cell, false)?;
            slots[slot] = Some(Entry::Value {
                declaration,
                symbol,
                member: is_member(head),
            });
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Forces every hoisted cell as root, in declaration order, then
    /// realizes every resolved type.
    pub(crate) fn finalize(&self, entries: &[Entry<'a>], scope: ScopeId) -> Result<Vec<BlockMember>> {
        tracing::debug!(%scope, count = entries.len(), "finalizing");
        let mut members = Vec::new();
        let mut realized = Vec::new();

        for entry in entries {
            match entry {
                Entry::Type {
                    declaration,
                    name,
                    cell,
                    native,
                } => {
                    let ty = self.force(cell, true)?;
                    if *native {
                        self.record_declaration(
                            scope,
                            ResolvedDeclaration {
                                id: declaration.id,
                                name: name.clone(),
                                category: DeclarationCategory::NativeType,
                                signature: None,
                                ty: ty.clone(),
                                impure: false,
                            },
                        );
                    }
                    realized.push(ty);
                }
                Entry::Value {
                    declaration,
                    symbol,
                    member,
                } => {
                    let SymbolValue::Declared { annotation, body } = &symbol.value else {
                        continue;
                    };
                    let annotated = match annotation {
                        Some(cell) => Some(self.force(cell, true)?),
                        None => None,
                    };
                    let body = match body {
                        Some(cell) => Some(self.force(cell, true)?),
                        None => None,
                    };
                    let ty = match (annotated, &body) {
                        (Some(ty), _) => ty,
                        (None, Some(typed)) => typed.ty.clone(),
                        (None, None) => Type::Any,
                    };

                    if body.is_none() {
                        let category = if symbol.flags.is_abstract {
                            DeclarationCategory::Abstract
                        } else {
                            DeclarationCategory::Native
                        };
                        self.record_declaration(
                            scope,
                            ResolvedDeclaration {
                                id: declaration.id,
                                name: symbol.name(),
                                category,
                                signature: Some(symbol.signature.clone()),
                                ty: ty.clone(),
                                impure: symbol.signature.is_impure(),
                            },
                        );
                    }

                    if *member {
                        members.push(member_of(symbol, ty.clone(), declaration.span));
                    }
                    realized.push(ty);
                }
                Entry::Statement {
                    declaration,
                    name,
                    cell,
                } => {
                    let typed = self.force(cell, true)?;
                    members.push(BlockMember {
                        name: name.clone(),
                        ty: typed.ty.clone(),
                        impure: typed.impure,
                        flags: SymbolFlags::default(),
                        span: declaration.span,
                    });
                    realized.push(typed.ty);
                }
            }
        }

        tracing::debug!(%scope, "post-pass");
        for ty in &realized {
            self.realize(ty)?;
        }
        Ok(members)
    }

    fn hoist_type_alias(
        &self,
        declaration: &'a Declaration,
        alias: &'a TypeAlias,
        scope: ScopeId,
    ) -> Lazy<'a, Type> {
        Rc::new(Deferred::new(
            alias.name.clone(),
            declaration.span,
            move |cx: &Analyzer<'a>| cx.resolve_type_alias(declaration, alias, scope),
        ))
    }

    fn hoist_native_type(&self, native: &NativeType, span: Span) -> Lazy<'a, Type> {
        let atomic = AtomicType::new(self.fresh_identity(), native.name.clone(), native.mutable);
        Rc::new(Deferred::resolved(
            native.name.clone(),
            span,
            Type::Atomic(Rc::new(atomic)),
        ))
    }

    /// A cell that computes the signature of a declaration with a receiver
    /// or parameters and defines its symbol in `scope`.
    fn head_cell(
        &self,
        declaration: &'a Declaration,
        head: &DeclarationHead,
        scope: ScopeId,
        mode: BlockMode,
    ) -> Lazy<'a, Rc<Symbol<'a>>> {
        Rc::new(Deferred::new(
            head.name.to_string(),
            declaration.span,
            move |cx: &Analyzer<'a>| {
                let symbol = cx.hoist_value(declaration, scope, mode)?;
                cx.scope(scope).define(Rc::clone(&symbol))?;
                Ok(symbol)
            },
        ))
    }

    fn hoist_value(
        &self,
        declaration: &'a Declaration,
        scope: ScopeId,
        mode: BlockMode,
    ) -> Result<Rc<Symbol<'a>>> {
        let (head, annotation, concrete, is_abstract) = match &declaration.kind {
            DeclarationKind::Concrete(concrete) => {
                (&concrete.head, concrete.annotation.as_ref(), Some(concrete), false)
            }
            DeclarationKind::Abstract(declared) => {
                if !matches!(mode, BlockMode::Object { abstract_allowed: true }) {
                    return Err(Error::InvalidDeclaration(
                        format!("`{}` is declared without a value", declared.head.name),
                        declaration.span,
                    ));
                }
                (&declared.head, Some(&declared.annotation), None, true)
            }
            DeclarationKind::Native(native) => (&native.head, Some(&native.annotation), None, false),
            _ => {
                return Err(Error::InvalidDeclaration(
                    "expected a value declaration".to_string(),
                    declaration.span,
                ));
            }
        };

        let head_info = self.declaration_head(head, scope, declaration.span)?;
        let flags = SymbolFlags {
            is_abstract,
            is_private: head.modifiers.is_private,
            is_override: head.modifiers.is_override,
        };

        let annotation = annotation.map(|expression| {
            self.annotation_cell(&head_info, head.impure, expression, concrete.is_none() && !is_abstract)
        });
        let body = concrete.map(|concrete| {
            self.body_cell(declaration, concrete, &head_info, scope, annotation.clone())
        });

        Ok(Rc::new(Symbol {
            signature: head_info.signature,
            declaration: Some(declaration.id),
            span: declaration.span,
            flags,
            value: SymbolValue::Declared { annotation, body },
        }))
    }

    /// Computes the signature eagerly and composes the body scope.
    fn declaration_head(
        &self,
        head: &'a DeclarationHead,
        scope: ScopeId,
        span: Span,
    ) -> Result<Head> {
        let receiver = match &head.receiver {
            Some(expression) => Some(self.type_expression(expression, scope)?),
            None => None,
        };
        let params = match &head.params {
            Some(expression) => Some(self.params_type(expression, scope)?),
            None => None,
        };

        let signature = match &head.name {
            DeclarationName::Identifier(name) => Signature::Name {
                receiver: receiver.clone(),
                name: name.clone(),
                impure: head.impure,
                params: params.clone(),
            },
            DeclarationName::Operator(operator) => {
                let Some(operand) = receiver.clone() else {
                    return Err(Error::InvalidDeclaration(
                        format!("operator `{operator}` needs a receiver type"),
                        span,
                    ));
                };
                match params.as_deref().map(ObjectType::fields) {
                    None => Signature::Operator {
                        lhs: None,
                        operator: *operator,
                        impure: head.impure,
                        rhs: operand,
                    },
                    Some([(_, rhs)]) => Signature::Operator {
                        lhs: Some(operand),
                        operator: *operator,
                        impure: head.impure,
                        rhs: rhs.clone(),
                    },
                    Some(_) => {
                        return Err(Error::InvalidDeclaration(
                            format!("operator `{operator}` takes exactly one parameter"),
                            span,
                        ));
                    }
                }
            }
        };

        let mut body_scope = scope;
        if let Some(receiver) = &receiver {
            body_scope = self.scopes.push(
                Some(body_scope),
                ScopeKind::This {
                    receiver: receiver.clone(),
                    impure: head.impure,
                },
            );
        }
        if let Some(params) = &params {
            body_scope = self.scopes.push(
                Some(body_scope),
                ScopeKind::Parameters {
                    params: Rc::clone(params),
                    impure: head.impure,
                },
            );
        }

        let category = if receiver.is_some()
            || params.is_some()
            || matches!(head.name, DeclarationName::Operator(_))
        {
            DeclarationCategory::Function
        } else {
            DeclarationCategory::Value
        };

        Ok(Head {
            name: head.name.to_string(),
            signature,
            body_scope,
            category,
        })
    }

    /// A lazily resolved type annotation. Native annotations also carry the
    /// purity check, since natives have no body to check.
    fn annotation_cell(
        &self,
        head: &Head,
        marked: bool,
        expression: &'a TypeExpression,
        native: bool,
    ) -> Lazy<'a, Type> {
        let head = head.clone();
        Rc::new(Deferred::new(
            head.name.clone(),
            expression.span,
            move |cx: &Analyzer<'a>| {
                let ty = cx.type_expression(expression, head.body_scope)?;
                if native {
                    cx.check_native_purity(&head.name, marked, &head.signature, &ty, expression.span)?;
                }
                Ok(ty)
            },
        ))
    }

    fn body_cell(
        &self,
        declaration: &'a Declaration,
        concrete: &'a ConcreteDeclaration,
        head: &Head,
        scope: ScopeId,
        annotation: Option<Lazy<'a, Type>>,
    ) -> Lazy<'a, Typed> {
        let order_sensitive = concrete.head.impure
            && concrete.head.params.is_none()
            && concrete.head.receiver.is_none();
        let function_body = concrete.head.params.is_some() || concrete.head.receiver.is_some();

        let head = head.clone();
        let mut cell = Deferred::new(
            head.name.clone(),
            declaration.span,
            move |cx: &Analyzer<'a>| {
                cx.resolve_body(declaration, concrete, &head, scope, annotation.as_ref(), order_sensitive)
            },
        );
        if order_sensitive {
            cell = cell.order_sensitive();
        }
        if function_body {
            cell = cell.function_body();
        }
        Rc::new(cell)
    }

    fn resolve_body(
        &self,
        declaration: &'a Declaration,
        concrete: &'a ConcreteDeclaration,
        head: &Head,
        scope: ScopeId,
        annotation: Option<&Lazy<'a, Type>>,
        order_sensitive: bool,
    ) -> Result<Typed> {
        if order_sensitive && !self.allows_impure_statements(scope) {
            return Err(Error::DisallowedImpureStatement {
                span: declaration.span,
            });
        }

        let marked = concrete.head.impure;
        let owner = Owner {
            name: head.name.clone(),
            impure: marked,
        };
        self.with_owner(owner, || {
            let typed = self.expression(&concrete.body, head.body_scope)?;
            let ty = match annotation {
                Some(cell) => {
                    let expected = self.force(cell, false)?;
                    self.check_accepts(&expected, &typed.ty, concrete.body.span, || {
                        format!("value of `{}`", head.name)
                    })?;
                    expected
                }
                None => typed.ty.clone(),
            };
            let result = Typed {
                ty,
                impure: typed.impure,
                provisional: typed.provisional,
            };
            self.check_declaration_purity(&head.name, marked, &head.signature, &result, declaration.span)?;

            self.record_declaration(
                scope,
                ResolvedDeclaration {
                    id: declaration.id,
                    name: head.name.clone(),
                    category: head.category,
                    signature: Some(head.signature.clone()),
                    ty: result.ty.clone(),
                    impure: marked,
                },
            );
            Ok(Typed {
                impure: marked,
                ..result
            })
        })
    }

    /// Bare expressions are unnamed fields named by their position.
    fn hoist_statement(
        &self,
        declaration: &'a Declaration,
        expression: &'a Expression,
        index: usize,
        scope: ScopeId,
    ) -> Entry<'a> {
        let name = index.to_string();
        let order_sensitive = is_syntactically_impure(expression);
        let statement = name.clone();
        let mut cell = Deferred::new(name.clone(), declaration.span, move |cx: &Analyzer<'a>| {
            let typed = cx.expression(expression, scope)?;
            if typed.impure && !cx.allows_impure_statements(scope) {
                return Err(Error::DisallowedImpureStatement {
                    span: declaration.span,
                });
            }
            cx.record_declaration(
                scope,
                ResolvedDeclaration {
                    id: declaration.id,
                    name: statement.clone(),
                    category: DeclarationCategory::Statement,
                    signature: None,
                    ty: typed.ty.clone(),
                    impure: typed.impure,
                },
            );
            Ok(typed)
        });
        if order_sensitive {
            cell = cell.order_sensitive();
        }
        Entry::Statement {
            declaration,
            name,
            cell: Rc::new(cell),
        }
    }

    /// True when impure statements may be evaluated in `scope`.
    pub(crate) fn allows_impure_statements(&self, scope: ScopeId) -> bool {
        for scope in self.scopes.chain(scope) {
            match &scope.kind {
                ScopeKind::Declaration {
                    allows_impure_statements,
                    ..
                } => return *allows_impure_statements,
                ScopeKind::Parameters { impure, .. } | ScopeKind::This { impure, .. } => {
                    return *impure;
                }
                ScopeKind::Object(_) => {}
                ScopeKind::Global => return false,
            }
        }
        false
    }
}

fn value_head(declaration: &Declaration) -> Result<&DeclarationHead> {
    match &declaration.kind {
        DeclarationKind::Concrete(concrete) => Ok(&concrete.head),
        DeclarationKind::Abstract(declared) => Ok(&declared.head),
        DeclarationKind::Native(native) => Ok(&native.head),
        _ => Err(Error::InvalidDeclaration(
            "expected a value declaration".to_string(),
            declaration.span,
        )),
    }
}

/// Receiverless named declarations contribute a field to an enclosing
/// object.
fn is_member(head: &DeclarationHead) -> bool {
    head.receiver.is_none() && head.identifier().is_some()
}

/// The name lookups use for a head: the identifier or the operator symbol.
fn signature_key(head: &DeclarationHead) -> String {
    match &head.name {
        DeclarationName::Identifier(name) => name.clone(),
        DeclarationName::Operator(operator) => operator.symbol().to_string(),
    }
}

fn member_of(symbol: &Symbol<'_>, ty: Type, span: Span) -> BlockMember {
    let signature = &symbol.signature;
    let (ty, impure) = match signature.params() {
        Some(params) => (
            Type::Function(Rc::new(FunctionType::new(
                signature.is_impure(),
                Some(Rc::clone(params)),
                ty,
            ))),
            false,
        ),
        None => (ty, signature.is_impure() && !symbol.flags.is_abstract),
    };
    BlockMember {
        name: signature.key().to_string(),
        ty,
        impure,
        flags: symbol.flags,
        span,
    }
}

/// An expression carries an impurity marker outside any anonymous function
/// body.
pub(crate) fn is_syntactically_impure(expression: &Expression) -> bool {
    use tinyscript_ast::ExpressionKind;

    match &expression.kind {
        ExpressionKind::Integer(_)
        | ExpressionKind::Float(_)
        | ExpressionKind::String(_)
        | ExpressionKind::This
        | ExpressionKind::Function(_) => false,
        ExpressionKind::Reference(reference) => {
            reference.impure
                || reference.receiver.as_deref().is_some_and(is_syntactically_impure)
                || reference.arguments.as_deref().is_some_and(is_syntactically_impure)
        }
        ExpressionKind::Binary {
            impure,
            left,
            right,
            ..
        } => *impure || is_syntactically_impure(left) || is_syntactically_impure(right),
        ExpressionKind::Unary {
            impure, operand, ..
        } => *impure || is_syntactically_impure(operand),
        ExpressionKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            is_syntactically_impure(condition)
                || is_syntactically_impure(then_branch)
                || else_branch.as_deref().is_some_and(is_syntactically_impure)
        }
        ExpressionKind::Elvis { value, fallback } => {
            is_syntactically_impure(value) || is_syntactically_impure(fallback)
        }
        ExpressionKind::Call {
            callee,
            impure,
            arguments,
        } => *impure || is_syntactically_impure(callee) || is_syntactically_impure(arguments),
        ExpressionKind::Object(declarations) => {
            declarations
                .iter()
                .any(|declaration| match &declaration.kind {
                    DeclarationKind::Concrete(concrete) => {
                        concrete.head.params.is_none() && is_syntactically_impure(&concrete.body)
                    }
                    DeclarationKind::Expression(expression)
                    | DeclarationKind::Inherit(expression) => is_syntactically_impure(expression),
                    _ => false,
                })
        }
    }
}
