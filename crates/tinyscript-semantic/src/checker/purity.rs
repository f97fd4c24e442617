//! Impurity marker checks.
//!
//! A declaration carries `!` iff its signature is mutable, its result type
//! is mutable or its body has an effect.

use tinyscript_core::types::{FunctionType, Type};
use tinyscript_core::{Error, Result, Span};

use super::core::Analyzer;
use crate::results::Typed;
use crate::signature::Signature;

const UNMARKED: &str = "has effects but is not marked impure";
const NEEDLESSLY_MARKED: &str = "is marked impure but has no effects";

impl Analyzer<'_> {
    pub(crate) fn check_declaration_purity(
        &self,
        name: &str,
        marked: bool,
        signature: &Signature,
        result: &Typed,
        span: Span,
    ) -> Result<()> {
        let required = signature.is_mutable() || result.ty.is_mutable() || result.impure;
        match marker_problem(marked, required, result.provisional) {
            Some(problem) => Err(Error::FunctionImpure {
                name: name.to_string(),
                problem,
                span,
            }),
            None => Ok(()),
        }
    }

    /// Natives have no body, so only a missing marker can be detected.
    pub(crate) fn check_native_purity(
        &self,
        name: &str,
        marked: bool,
        signature: &Signature,
        ty: &Type,
        span: Span,
    ) -> Result<()> {
        if !marked && (signature.is_mutable() || ty.is_mutable()) {
            return Err(Error::FunctionImpure {
                name: name.to_string(),
                problem: UNMARKED,
                span,
            });
        }
        Ok(())
    }

    pub(crate) fn check_anonymous_purity(
        &self,
        function: &FunctionType,
        body: &Typed,
        span: Span,
    ) -> Result<()> {
        let required = function
            .params
            .as_ref()
            .is_some_and(|params| params.is_mutable())
            || function.return_type.is_mutable()
            || body.impure;
        match marker_problem(function.impure, required, body.provisional) {
            Some(problem) => Err(Error::AnonymousFunctionImpure { problem, span }),
            None => Ok(()),
        }
    }
}

fn marker_problem(marked: bool, required: bool, provisional: bool) -> Option<&'static str> {
    match (marked, required) {
        (false, true) => Some(UNMARKED),
        // A skipped recursive branch may still carry the effect.
        (true, false) if !provisional => Some(NEEDLESSLY_MARKED),
        _ => None,
    }
}
