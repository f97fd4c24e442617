//! Object literals, object type bodies, classes and inheritance.

use std::rc::Rc;
use tinyscript_ast::{Declaration, DeclarationKind, Expression, ExpressionKind, TypeAlias};
use tinyscript_core::types::{ClassBody, ClassType, ObjectType, Type, TypeIdentity};
use tinyscript_core::{Error, Result, Span};

use super::core::Analyzer;
use super::declarations::{BlockMember, BlockMode, Entry};
use crate::deferred::Deferred;
use crate::results::Typed;
use crate::scope::{InheritedField, Inheritance, ObjectFrame, ScopeId, ScopeKind, ThisSource};

/// What an object body is being analyzed for.
#[derive(Debug, Clone)]
pub(crate) enum ObjectKind {
    /// An object literal value.
    Literal,
    /// The body of a class declared by a type alias.
    Class(Type),
    /// An inline object type with defaults, members or bases.
    Structural,
}

/// The field set assembled from an object body.
#[derive(Debug, Clone)]
pub(crate) struct AssembledObject {
    pub object: ObjectType,
    pub abstract_fields: Vec<String>,
    pub identities: Vec<TypeIdentity>,
    pub impure: bool,
}

/// An object body whose members are hoisted but not yet finalized.
struct OpenObject<'a> {
    frame: ScopeId,
    members: ScopeId,
    entries: Vec<Entry<'a>>,
    inheritance: Inheritance,
}

impl<'a> Analyzer<'a> {
    /// An object literal. `this` inside it denotes the object itself, so the
    /// object is finalized through a cell that a bare `this` can force.
    pub(crate) fn object_literal(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        span: Span,
    ) -> Result<Typed> {
        let open = self.open_object(declarations, scope, &ObjectKind::Literal)?;
        let OpenObject {
            frame,
            members,
            entries,
            inheritance,
        } = open;

        let cell = Rc::new(Deferred::new("this", span, move |cx: &Analyzer<'a>| {
            let object = cx.close_object(&entries, members, &inheritance, span)?;
            cx.instantiate(object, span)
        }));
        if let Some(frame) = self.scope(frame).object_frame() {
            let _ = frame.this.set(ThisSource::Literal(Rc::clone(&cell)));
        }
        self.force(&cell, true)
    }

    /// Analyzes an object type body, or a class body when `kind` is a class.
    pub(crate) fn object_body(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        kind: ObjectKind,
        span: Span,
    ) -> Result<AssembledObject> {
        tracing::debug!(%scope, ?kind, "object body");
        let open = self.open_object(declarations, scope, &kind)?;
        if let ObjectKind::Class(ty) = kind
            && let Some(frame) = self.scope(open.frame).object_frame()
        {
            let _ = frame.this.set(ThisSource::Class(ty));
        }
        self.close_object(&open.entries, open.members, &open.inheritance, span)
    }

    /// Declares the class named by an alias. Its identity set is known at
    /// once; its body is a separate cell so the class may refer to itself.
    pub(crate) fn declare_class(
        &self,
        alias: &'a TypeAlias,
        body: &'a [Declaration],
        scope: ScopeId,
        span: Span,
    ) -> Result<Type> {
        let mut inherited = Vec::new();
        for declaration in body {
            if let DeclarationKind::Inherit(target) = &declaration.kind
                && let Some(Type::Class(base)) = self.named_type(target, scope)?
            {
                inherited.extend(base.identities.iter().copied());
            }
        }

        let identity = self.fresh_identity();
        let class = Rc::new(ClassType::new(
            identity,
            alias.name.clone(),
            alias.mutable,
            inherited,
        ));
        let ty = Type::Class(Rc::clone(&class));
        let class_ty = ty.clone();
        let cell = Rc::new(Deferred::new(
            alias.name.clone(),
            span,
            move |cx: &Analyzer<'a>| cx.class_body(&class, &class_ty, alias, body, scope, span),
        ));
        self.class_bodies.borrow_mut().insert(identity, cell);
        tracing::debug!(class = %alias.name, identity = identity.as_u32(), "class declared");
        Ok(ty)
    }

    fn class_body(
        &self,
        class: &ClassType,
        ty: &Type,
        alias: &TypeAlias,
        body: &'a [Declaration],
        scope: ScopeId,
        span: Span,
    ) -> Result<ClassBody> {
        let object = self.object_body(body, scope, ObjectKind::Class(ty.clone()), span)?;
        let found = object.object.is_mutable();
        if found != class.mutable {
            let label = |mutable: bool| if mutable { "mutable" } else { "immutable" };
            return Err(Error::TypeMutable {
                name: alias.name.clone(),
                declared: label(class.mutable),
                found: label(found),
                expansion: object.object.to_string(),
                span,
            });
        }

        let body = ClassBody {
            object: Rc::new(object.object),
            abstract_fields: object.abstract_fields,
        };
        class.set_body(body.clone());
        Ok(body)
    }

    fn open_object(
        &self,
        declarations: &'a [Declaration],
        scope: ScopeId,
        kind: &ObjectKind,
    ) -> Result<OpenObject<'a>> {
        let inheritance = self.inheritance(declarations, scope)?;

        let allows_impure_statements = match kind {
            ObjectKind::Literal => self.allows_impure_statements(scope),
            ObjectKind::Class(_) | ObjectKind::Structural => false,
        };
        let frame = self
            .scopes
            .push(Some(scope), ScopeKind::Object(ObjectFrame::default()));
        let members = self.scopes.push(
            Some(frame),
            ScopeKind::Declaration {
                allows_impure_statements,
                object: true,
            },
        );
        if let Some(object_frame) = self.scope(frame).object_frame() {
            let _ = object_frame.inheritance.set(inheritance.clone());
            let _ = object_frame.members.set(members);
        }

        let mode = BlockMode::Object {
            abstract_allowed: !matches!(kind, ObjectKind::Literal),
        };
        let entries = self.hoist(declarations, members, mode)?;
        Ok(OpenObject {
            frame,
            members,
            entries,
            inheritance,
        })
    }

    fn close_object(
        &self,
        entries: &[Entry<'a>],
        members: ScopeId,
        inheritance: &Inheritance,
        span: Span,
    ) -> Result<AssembledObject> {
        let members = self.finalize(entries, members)?;
        assemble(members, inheritance, span)
    }

    /// Turns an assembled literal into a value type.
    fn instantiate(&self, object: AssembledObject, span: Span) -> Result<Typed> {
        if let Some(field) = object.abstract_fields.first() {
            return Err(Error::AbstractField {
                field: field.clone(),
                object: object.object.to_string(),
                span,
            });
        }
        let ty = if object.identities.is_empty() {
            Type::Object(Rc::new(object.object))
        } else {
            let name = object.object.to_string();
            Type::Class(Rc::new(ClassType::with_body(
                self.fresh_identity(),
                name,
                object.identities,
                ClassBody {
                    object: Rc::new(object.object),
                    abstract_fields: Vec::new(),
                },
            )))
        };
        Ok(Typed::new(ty, object.impure))
    }

    /// Collects everything contributed by `&Base` statements, evaluated in
    /// the scope enclosing the object.
    fn inheritance(&self, declarations: &'a [Declaration], scope: ScopeId) -> Result<Inheritance> {
        let mut inheritance = Inheritance::default();
        for declaration in declarations {
            let DeclarationKind::Inherit(target) = &declaration.kind else {
                continue;
            };
            let base = match self.named_type(target, scope)? {
                Some(ty) => ty,
                None => self.expression(target, scope)?.ty,
            };
            self.realize(&base)?;

            let fields: Vec<InheritedField> = match &base {
                Type::Class(class) => {
                    let Some(body) = class.body() else {
                        return Err(Error::Cycle {
                            name: class.name.clone(),
                            recoverable: false,
                            span: target.span,
                        });
                    };
                    inheritance.identities.extend(class.identities.iter().copied());
                    body.object
                        .fields()
                        .iter()
                        .map(|(name, ty)| InheritedField {
                            name: name.clone(),
                            ty: ty.clone(),
                            is_abstract: body.is_abstract(name),
                        })
                        .collect()
                }
                Type::Object(object) => object
                    .fields()
                    .iter()
                    .map(|(name, ty)| InheritedField {
                        name: name.clone(),
                        ty: ty.clone(),
                        is_abstract: false,
                    })
                    .collect(),
                other => {
                    return Err(Error::InvalidInheritance {
                        found: other.to_string(),
                        span: target.span,
                    });
                }
            };

            for field in fields {
                merge_inherited(&mut inheritance, field);
            }
        }
        Ok(inheritance)
    }

    /// An inherit target that names a type rather than a value.
    fn named_type(&self, target: &Expression, scope: ScopeId) -> Result<Option<Type>> {
        let ExpressionKind::Reference(reference) = &target.kind else {
            return Ok(None);
        };
        if reference.receiver.is_some() || reference.arguments.is_some() {
            return Ok(None);
        }
        match self.find_type(scope, &reference.name, reference.impure) {
            Some(cell) => Ok(Some(self.force(&cell, false)?)),
            None => Ok(None),
        }
    }
}

fn merge_inherited(inheritance: &mut Inheritance, field: InheritedField) {
    let Some(existing) = inheritance
        .fields
        .iter_mut()
        .find(|existing| existing.name == field.name)
    else {
        inheritance.fields.push(field);
        return;
    };

    match (existing.is_abstract, field.is_abstract) {
        (true, false) if existing.ty.accepts(&field.ty) => *existing = field,
        (false, true) if field.ty.accepts(&existing.ty) => {}
        (true, true) if existing.ty.accepts(&field.ty) => *existing = field,
        (true, true) if field.ty.accepts(&existing.ty) => {}
        _ => {
            if !inheritance.conflicts.contains(&field.name) {
                inheritance.conflicts.push(field.name);
            }
        }
    }
}

/// Merges the object's own members over its inherited fields.
fn assemble(
    members: Vec<BlockMember>,
    inheritance: &Inheritance,
    span: Span,
) -> Result<AssembledObject> {
    let mut fields: Vec<(String, Type)> = inheritance
        .fields
        .iter()
        .map(|field| (field.name.clone(), field.ty.clone()))
        .collect();
    let mut abstract_fields: Vec<String> = inheritance
        .fields
        .iter()
        .filter(|field| field.is_abstract)
        .map(|field| field.name.clone())
        .collect();
    let mut impure = false;

    for member in &members {
        impure |= member.impure;
        if member.flags.is_private {
            continue;
        }

        match inheritance.field(&member.name) {
            Some(base) => {
                if !base.is_abstract && !member.flags.is_override {
                    return Err(Error::Override {
                        field: member.name.clone(),
                        reason: "replaces an inherited field without `override`".to_string(),
                        span: member.span,
                    });
                }
                if !base.ty.accepts(&member.ty) {
                    return Err(Error::Override {
                        field: member.name.clone(),
                        reason: format!(
                            "has type `{}`, which the inherited `{}` does not accept",
                            member.ty, base.ty
                        ),
                        span: member.span,
                    });
                }
                if let Some(slot) = fields.iter_mut().find(|(name, _)| *name == member.name) {
                    slot.1 = member.ty.clone();
                }
                abstract_fields.retain(|name| *name != member.name);
            }
            None => {
                if member.flags.is_override {
                    return Err(Error::Override {
                        field: member.name.clone(),
                        reason: "is marked `override` but overrides nothing".to_string(),
                        span: member.span,
                    });
                }
                fields.push((member.name.clone(), member.ty.clone()));
            }
        }
        if member.flags.is_abstract {
            abstract_fields.push(member.name.clone());
        }
    }

    for conflict in &inheritance.conflicts {
        let resolved = members
            .iter()
            .any(|member| member.name == *conflict && member.flags.is_override);
        if !resolved {
            return Err(Error::Override {
                field: conflict.clone(),
                reason: "is inherited from bases that disagree on it".to_string(),
                span,
            });
        }
    }

    Ok(AssembledObject {
        object: ObjectType::new(fields),
        abstract_fields,
        identities: inheritance.identities.clone(),
        impure,
    })
}
