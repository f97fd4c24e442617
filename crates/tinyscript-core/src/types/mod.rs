/// Type lattice for TinyScript.
///
/// Types are immutable values and cheap to clone; composite variants share
/// their payload through `Rc`. Mutability is derived from structure, except
/// for classes whose declared mutability is known before their body is.
mod nominal;
mod numeric;
mod object;

pub use nominal::{AtomicType, ClassBody, ClassType, TypeIdentity};
pub use numeric::{FloatRange, IntRange};
pub use object::{FunctionType, ObjectType};

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Type {
    /// Accepts every value; nothing can be derived from it.
    Any,
    /// Opaque primitive identity.
    Atomic(Rc<AtomicType>),
    /// Structural object.
    Object(Rc<ObjectType>),
    Function(Rc<FunctionType>),
    Nullable(Rc<Type>),
    Int(IntRange),
    Float(FloatRange),
    /// Nominal object with an identity set.
    Class(Rc<ClassType>),
}

impl Type {
    #[must_use]
    pub fn int() -> Self {
        Type::Int(IntRange::FULL)
    }

    #[must_use]
    pub fn int_literal(value: i64) -> Self {
        Type::Int(IntRange::singleton(value))
    }

    #[must_use]
    pub fn float() -> Self {
        Type::Float(FloatRange::FULL)
    }

    #[must_use]
    pub fn float_literal(value: f64) -> Self {
        Type::Float(FloatRange::singleton(value))
    }

    #[must_use]
    pub fn object(fields: Vec<(String, Type)>) -> Self {
        Type::Object(Rc::new(ObjectType::new(fields)))
    }

    #[must_use]
    pub fn empty_object() -> Self {
        Type::Object(Rc::new(ObjectType::empty()))
    }

    #[must_use]
    pub fn function(impure: bool, params: Option<ObjectType>, return_type: Type) -> Self {
        Type::Function(Rc::new(FunctionType::new(
            impure,
            params.map(Rc::new),
            return_type,
        )))
    }

    /// Wraps in `Nullable`, leaving already-nullable types alone.
    #[must_use]
    pub fn nullable(inner: Type) -> Self {
        match inner {
            Type::Nullable(_) | Type::Any => inner,
            other => Type::Nullable(Rc::new(other)),
        }
    }

    /// Returns true when a value of type `other` may be used where `self`
    /// is expected. Total: unknown combinations are simply `false`.
    #[must_use]
    pub fn accepts(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) => true,
            (_, Type::Any) => false,

            (Type::Nullable(expected), Type::Nullable(found)) => expected.accepts(found),
            (Type::Nullable(expected), found) => expected.accepts(found),
            (_, Type::Nullable(_)) => false,

            (Type::Atomic(expected), Type::Atomic(found)) => expected.identity == found.identity,
            (Type::Int(expected), Type::Int(found)) => expected.contains(found),
            (Type::Float(expected), Type::Float(found)) => expected.contains(found),

            (Type::Object(expected), Type::Object(found)) => expected.accepts(found),
            (Type::Object(expected), Type::Class(found)) => found
                .object()
                .is_some_and(|object| expected.accepts(object)),
            (Type::Class(expected), Type::Class(found)) => expected.is_inherited_by(found),
            (Type::Class(expected), Type::Object(found)) => expected
                .body()
                .is_some_and(|body| body.accepts_instance(found)),

            (Type::Function(expected), Type::Function(found)) => expected.accepts(found),

            _ => false,
        }
    }

    /// Derived mutability. Impure function values count as mutable.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        match self {
            Type::Any | Type::Int(_) | Type::Float(_) => false,
            Type::Atomic(atomic) => atomic.mutable,
            Type::Object(object) => object.is_mutable(),
            Type::Function(function) => function.impure,
            Type::Nullable(inner) => inner.is_mutable(),
            Type::Class(class) => class.mutable,
        }
    }

    /// Field lookup on objects and resolved classes.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Type> {
        match self {
            Type::Object(object) => object.field(name).cloned(),
            Type::Class(class) => class.object().and_then(|object| object.field(name).cloned()),
            _ => None,
        }
    }

    /// The object shape behind an object or resolved class.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(object) => Some(object),
            Type::Class(class) => class.object(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Drops numeric ranges to the full `Int` or `Float`, looking through
    /// nullables. Every other type is returned unchanged.
    #[must_use]
    pub fn widen(&self) -> Type {
        match self {
            Type::Int(_) => Type::int(),
            Type::Float(_) => Type::float(),
            Type::Nullable(inner) => Type::nullable(inner.widen()),
            other => other.clone(),
        }
    }

    /// Least upper bound used for branch merging. Falls back to `Any`.
    #[must_use]
    pub fn join(&self, other: &Type) -> Type {
        match (self, other) {
            (Type::Int(a), Type::Int(b)) => Type::Int(a.hull(b)),
            (Type::Float(a), Type::Float(b)) => Type::Float(a.hull(b)),
            (Type::Nullable(a), Type::Nullable(b)) => Type::nullable(a.join(b)),
            (Type::Nullable(a), b) | (b, Type::Nullable(a)) => Type::nullable(a.join(b)),
            (a, b) if a.accepts(b) => a.clone(),
            (a, b) if b.accepts(a) => b.clone(),
            _ => Type::Any,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::Atomic(atomic) => write!(f, "{atomic}"),
            Type::Object(object) => write!(f, "{object}"),
            Type::Function(function) => write!(f, "{function}"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Int(range) => write!(f, "{range}"),
            Type::Float(range) => write!(f, "{range}"),
            Type::Class(class) => write!(f, "{class}"),
        }
    }
}
