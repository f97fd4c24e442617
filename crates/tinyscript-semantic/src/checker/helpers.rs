//! Helper methods shared by the analyzer passes.

use std::collections::HashSet;
use tinyscript_core::types::{Type, TypeIdentity};
use tinyscript_core::{Error, Result, Span};

use super::core::Analyzer;

impl Analyzer<'_> {
    /// Fails with `TypeMismatch` unless `expected` accepts `found`.
    pub(crate) fn check_accepts(
        &self,
        expected: &Type,
        found: &Type,
        span: Span,
        context: impl FnOnce() -> String,
    ) -> Result<()> {
        self.realize(expected)?;
        self.realize(found)?;
        if expected.accepts(found) {
            return Ok(());
        }
        Err(Error::TypeMismatch {
            context: context(),
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        })
    }

    /// Forces the bodies of every class reachable from `ty`, skipping those
    /// already being resolved.
    pub(crate) fn realize(&self, ty: &Type) -> Result<()> {
        let mut seen = HashSet::new();
        self.realize_from(ty, &mut seen)
    }

    fn realize_from(&self, ty: &Type, seen: &mut HashSet<TypeIdentity>) -> Result<()> {
        match ty {
            Type::Class(class) => {
                if !seen.insert(class.identity) {
                    return Ok(());
                }
                if class.body().is_none() {
                    let cell = self.class_bodies.borrow().get(&class.identity).cloned();
                    if let Some(cell) = cell
                        && !cell.is_resolving()
                    {
                        self.force(&cell, false)?;
                    }
                }
                if let Some(object) = class.object() {
                    for (_, field) in object.fields() {
                        self.realize_from(field, seen)?;
                    }
                }
                Ok(())
            }
            Type::Object(object) => {
                for (_, field) in object.fields() {
                    self.realize_from(field, seen)?;
                }
                Ok(())
            }
            Type::Function(function) => {
                if let Some(params) = &function.params {
                    for (_, param) in params.fields() {
                        self.realize_from(param, seen)?;
                    }
                }
                self.realize_from(&function.return_type, seen)
            }
            Type::Nullable(inner) => self.realize_from(inner, seen),
            Type::Any | Type::Atomic(_) | Type::Int(_) | Type::Float(_) => Ok(()),
        }
    }
}
