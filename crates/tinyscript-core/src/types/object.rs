//! Structural object and function types.

use super::Type;
use std::fmt;
use std::rc::Rc;

/// A structural object type: an ordered list of named fields.
///
/// Unnamed (positional) fields use their index as the name, so `[1, 2]`
/// has fields `0` and `1`.
#[derive(Debug, Clone, Default)]
pub struct ObjectType {
    fields: Vec<(String, Type)>,
    mutable: bool,
}

impl ObjectType {
    #[must_use]
    pub fn new(fields: Vec<(String, Type)>) -> Self {
        let mutable = fields.iter().any(|(_, ty)| ty.is_mutable());
        Self { fields, mutable }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, Type)] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True iff any field is mutable.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Width subtyping: every field of `self` exists in `other` with an
    /// accepted type; `other` may carry extra fields.
    #[must_use]
    pub fn accepts(&self, other: &ObjectType) -> bool {
        self.fields.iter().all(|(name, expected)| {
            other
                .field(name)
                .is_some_and(|found| expected.accepts(found))
        })
    }

    /// Parameter matching for call sites.
    ///
    /// Each parameter is supplied by name or by position; nullable
    /// parameters may be omitted and no argument may be left over.
    #[must_use]
    pub fn accepts_arguments(&self, arguments: &ObjectType) -> bool {
        let mut consumed = 0;
        for (index, (name, expected)) in self.fields.iter().enumerate() {
            let supplied = arguments
                .field(name)
                .or_else(|| arguments.field(&index.to_string()));
            match supplied {
                Some(found) if expected.accepts(found) => consumed += 1,
                Some(_) => return false,
                None if matches!(expected, Type::Nullable(_)) => {}
                None => return false,
            }
        }
        consumed == arguments.fields.len()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, (name, ty)) in self.fields.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {ty}")?;
        }
        write!(f, "]")
    }
}

/// A function type: `fn[params] -> ret`, or `fn![params] -> ret` when impure.
#[derive(Debug, Clone)]
pub struct FunctionType {
    pub impure: bool,
    pub params: Option<Rc<ObjectType>>,
    pub return_type: Type,
}

impl FunctionType {
    #[must_use]
    pub fn new(impure: bool, params: Option<Rc<ObjectType>>, return_type: Type) -> Self {
        Self {
            impure,
            params,
            return_type,
        }
    }

    /// Contravariant parameters, covariant return type. A pure slot only
    /// accepts pure functions.
    #[must_use]
    pub fn accepts(&self, other: &FunctionType) -> bool {
        let params = match (&self.params, &other.params) {
            (None, None) => true,
            (Some(mine), Some(theirs)) => theirs.accepts(mine),
            _ => false,
        };
        params && (self.impure || !other.impure) && self.return_type.accepts(&other.return_type)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn")?;
        if self.impure {
            write!(f, "!")?;
        }
        if let Some(params) = &self.params {
            write!(f, "{params}")?;
        }
        write!(f, " -> {}", self.return_type)
    }
}
