//! Signatures and symbols.
//!
//! Lookup is by acceptance, not identity: a query matches a declared
//! signature when the declared receiver and parameters accept the query's
//! receiver and arguments.

use std::fmt;
use std::rc::Rc;
use tinyscript_ast::{NodeId, Operator};
use tinyscript_core::Span;
use tinyscript_core::types::{ObjectType, Type};

use crate::checker::Lazy;
use crate::intrinsics::Builtin;
use crate::results::Typed;

/// The queryable shape of a declaration.
#[derive(Debug, Clone)]
pub enum Signature {
    Name {
        receiver: Option<Type>,
        name: String,
        impure: bool,
        params: Option<Rc<ObjectType>>,
    },
    Operator {
        lhs: Option<Type>,
        operator: Operator,
        impure: bool,
        rhs: Type,
    },
}

impl Signature {
    pub fn name(name: impl Into<String>) -> Self {
        Signature::Name {
            receiver: None,
            name: name.into(),
            impure: false,
            params: None,
        }
    }

    /// The declared name, or the operator symbol.
    pub fn key(&self) -> &str {
        match self {
            Signature::Name { name, .. } => name,
            Signature::Operator { operator, .. } => operator.symbol(),
        }
    }

    /// True when the receiver, parameters or operands are mutable.
    pub fn is_mutable(&self) -> bool {
        match self {
            Signature::Name {
                receiver, params, ..
            } => {
                receiver.as_ref().is_some_and(Type::is_mutable)
                    || params.as_ref().is_some_and(|params| params.is_mutable())
            }
            Signature::Operator { lhs, rhs, .. } => {
                lhs.as_ref().is_some_and(Type::is_mutable) || rhs.is_mutable()
            }
        }
    }

    pub fn is_impure(&self) -> bool {
        match self {
            Signature::Name { impure, .. } | Signature::Operator { impure, .. } => *impure,
        }
    }

    pub fn receiver(&self) -> Option<&Type> {
        match self {
            Signature::Name { receiver, .. } => receiver.as_ref(),
            Signature::Operator { lhs, .. } => lhs.as_ref(),
        }
    }

    pub fn params(&self) -> Option<&Rc<ObjectType>> {
        match self {
            Signature::Name { params, .. } => params.as_ref(),
            Signature::Operator { .. } => None,
        }
    }

    /// Field-table entries: no receiver, no parameters, no impurity marker.
    pub fn is_field(&self) -> bool {
        matches!(
            self,
            Signature::Name {
                receiver: None,
                impure: false,
                params: None,
                ..
            }
        )
    }

    /// True when both signatures could answer the same query.
    pub fn overlaps(&self, other: &Signature) -> bool {
        match (self, other) {
            (
                Signature::Name {
                    receiver: r1,
                    name: n1,
                    impure: i1,
                    params: p1,
                },
                Signature::Name {
                    receiver: r2,
                    name: n2,
                    impure: i2,
                    params: p2,
                },
            ) => {
                let params = match (p1, p2) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.accepts(b) || b.accepts(a),
                    _ => false,
                };
                n1 == n2 && i1 == i2 && either_accepts(r1.as_ref(), r2.as_ref()) && params
            }
            (
                Signature::Operator {
                    lhs: l1,
                    operator: o1,
                    impure: i1,
                    rhs: r1,
                },
                Signature::Operator {
                    lhs: l2,
                    operator: o2,
                    impure: i2,
                    rhs: r2,
                },
            ) => {
                o1 == o2
                    && i1 == i2
                    && either_accepts(l1.as_ref(), l2.as_ref())
                    && (r1.accepts(r2) || r2.accepts(r1))
            }
            _ => false,
        }
    }
}

fn either_accepts(a: Option<&Type>, b: Option<&Type>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.accepts(b) || b.accepts(a),
        _ => false,
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Name {
                receiver,
                name,
                impure,
                params,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                write!(f, "{name}")?;
                if *impure {
                    write!(f, "!")?;
                }
                if let Some(params) = params {
                    write!(f, "{params}")?;
                }
                Ok(())
            }
            Signature::Operator {
                lhs,
                operator,
                impure,
                rhs,
            } => {
                if let Some(lhs) = lhs {
                    write!(f, "{lhs} ")?;
                }
                write!(f, "{operator}")?;
                if *impure {
                    write!(f, "!")?;
                }
                write!(f, " {rhs}")
            }
        }
    }
}

/// What a lookup asks for.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A binding declared without parameters.
    Value,
    /// A call with the given argument object.
    Call(Rc<ObjectType>),
    /// A parameterised declaration referenced without arguments.
    FunctionValue,
    /// An operator application.
    Operator {
        lhs: Option<Type>,
        operator: Operator,
        rhs: Type,
    },
}

/// A lookup request answered by the scope chain.
#[derive(Debug, Clone)]
pub struct Query {
    pub receiver: Option<Type>,
    pub name: String,
    pub impure: bool,
    pub shape: Shape,
}

impl Query {
    pub fn value(name: &str, impure: bool) -> Self {
        Self {
            receiver: None,
            name: name.to_string(),
            impure,
            shape: Shape::Value,
        }
    }

    pub fn operator(lhs: Option<Type>, operator: Operator, impure: bool, rhs: Type) -> Self {
        Self {
            receiver: None,
            name: operator.symbol().to_string(),
            impure,
            shape: Shape::Operator { lhs, operator, rhs },
        }
    }

    #[must_use]
    pub fn with_receiver(&self, receiver: Type) -> Self {
        Self {
            receiver: Some(receiver),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_shape(&self, shape: Shape) -> Self {
        Self {
            shape,
            ..self.clone()
        }
    }

    /// The same query with the impurity marker flipped.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            impure: !self.impure,
            ..self.clone()
        }
    }

    /// Types that must be realized before acceptance can be decided.
    pub fn types(&self) -> Vec<&Type> {
        let mut types: Vec<&Type> = self.receiver.iter().collect();
        if let Shape::Operator { lhs, rhs, .. } = &self.shape {
            types.extend(lhs.iter());
            types.push(rhs);
        }
        types
    }

    /// Returns true when the declared `signature` answers this query.
    pub fn matches(&self, signature: &Signature) -> bool {
        match (signature, &self.shape) {
            (
                Signature::Name {
                    receiver,
                    name,
                    impure,
                    params,
                },
                shape,
            ) => {
                if *name != self.name || *impure != self.impure {
                    return false;
                }
                let receiver = match (receiver, &self.receiver) {
                    (None, None) => true,
                    (Some(declared), Some(found)) => declared.accepts(found),
                    _ => false,
                };
                let params = match (params, shape) {
                    (None, Shape::Value) => true,
                    (Some(declared), Shape::Call(arguments)) => {
                        declared.accepts_arguments(arguments)
                    }
                    (Some(_), Shape::FunctionValue) => true,
                    _ => false,
                };
                receiver && params
            }
            (
                Signature::Operator {
                    lhs: declared_lhs,
                    operator: declared,
                    impure,
                    rhs: declared_rhs,
                },
                Shape::Operator { lhs, operator, rhs },
            ) => {
                let lhs = match (declared_lhs, lhs) {
                    (None, None) => true,
                    (Some(declared), Some(found)) => declared.accepts(found),
                    _ => false,
                };
                declared == operator && *impure == self.impure && lhs && declared_rhs.accepts(rhs)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Shape::Operator { lhs, operator, rhs } = &self.shape {
            if let Some(lhs) = lhs {
                write!(f, "`{lhs} {operator} {rhs}`")?;
            } else {
                write!(f, "`{operator}{rhs}`")?;
            }
            return Ok(());
        }
        write!(f, "`")?;
        if let Some(receiver) = &self.receiver {
            write!(f, "{receiver}.")?;
        }
        write!(f, "{}", self.name)?;
        if self.impure {
            write!(f, "!")?;
        }
        if let Shape::Call(arguments) = &self.shape {
            write!(f, "{arguments}")?;
        }
        write!(f, "`")
    }
}

/// Declaration modifiers carried by a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    pub is_abstract: bool,
    pub is_private: bool,
    pub is_override: bool,
}

/// How a symbol's type is obtained.
#[derive(Clone)]
pub enum SymbolValue<'a> {
    /// Known up front (intrinsics).
    Known(Type),
    /// A built-in operator whose result depends on the operand types.
    Builtin(Builtin),
    /// A hoisted declaration.
    Declared {
        annotation: Option<Lazy<'a, Type>>,
        body: Option<Lazy<'a, Typed>>,
    },
}

impl fmt::Debug for SymbolValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Known(ty) => write!(f, "Known({ty})"),
            SymbolValue::Builtin(builtin) => write!(f, "Builtin({builtin:?})"),
            SymbolValue::Declared { annotation, body } => f
                .debug_struct("Declared")
                .field("annotation", annotation)
                .field("body", body)
                .finish(),
        }
    }
}

/// A named, typed binding.
#[derive(Debug)]
pub struct Symbol<'a> {
    pub signature: Signature,
    pub declaration: Option<NodeId>,
    pub span: Span,
    pub flags: SymbolFlags,
    pub value: SymbolValue<'a>,
}

impl<'a> Symbol<'a> {
    pub fn intrinsic(signature: Signature, value: SymbolValue<'a>) -> Self {
        Self {
            signature,
            declaration: None,
            span: Span::default(),
            flags: SymbolFlags::default(),
            value,
        }
    }

    pub fn name(&self) -> String {
        match &self.signature {
            Signature::Name { name, .. } => name.clone(),
            Signature::Operator { operator, .. } => format!("({operator})"),
        }
    }

    /// A mutable binding must be referenced with an impurity marker.
    pub fn is_mutable(&self) -> bool {
        if self.signature.is_impure() {
            return true;
        }
        match &self.value {
            SymbolValue::Known(ty) => ty.is_mutable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyscript_core::types::IntRange;

    fn params(fields: Vec<(&str, Type)>) -> Rc<ObjectType> {
        Rc::new(ObjectType::new(
            fields
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        ))
    }

    fn declared(name: &str, impure: bool, fields: Option<Vec<(&str, Type)>>) -> Signature {
        Signature::Name {
            receiver: None,
            name: name.to_string(),
            impure,
            params: fields.map(params),
        }
    }

    #[test]
    fn test_call_matches_by_acceptance() {
        let max = declared("max", false, Some(vec![("a", Type::int()), ("b", Type::int())]));
        let call = Query::value("max", false).with_shape(Shape::Call(params(vec![
            ("0", Type::int_literal(1)),
            ("1", Type::int_literal(2)),
        ])));

        assert!(call.matches(&max));
        assert!(!call.flipped().matches(&max));
        assert!(!Query::value("max", false).matches(&max));
        assert!(
            Query::value("max", false)
                .with_shape(Shape::FunctionValue)
                .matches(&max)
        );
    }

    #[test]
    fn test_receiver_acceptance() {
        let double = Signature::Name {
            receiver: Some(Type::int()),
            name: "double".to_string(),
            impure: false,
            params: None,
        };
        let query = Query::value("double", false).with_receiver(Type::Int(IntRange::new(0, 3)));
        assert!(query.matches(&double));
        assert!(!query.with_receiver(Type::float()).matches(&double));
        assert!(!Query::value("double", false).matches(&double));
    }

    #[test]
    fn test_overlap() {
        let a = declared("f", false, Some(vec![("x", Type::int())]));
        let b = declared("f", false, Some(vec![("x", Type::int_literal(1))]));
        let c = declared("f", false, Some(vec![("x", Type::float())]));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&declared("f", true, Some(vec![("x", Type::int())]))));
        assert!(declared("v", false, None).is_field());
        assert!(!a.is_field());
    }

    #[test]
    fn test_display() {
        let sig = Signature::Operator {
            lhs: Some(Type::int()),
            operator: Operator::Add,
            impure: false,
            rhs: Type::int(),
        };
        insta::assert_snapshot!(sig.to_string(), @"Int + Int");
        insta::assert_snapshot!(
            declared("println", true, Some(vec![("value", Type::Any)])).to_string(),
            @"println![value: Any]"
        );
    }
}
