//! Nominal types: native atomics and classes.

use super::ObjectType;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Identity of a nominal type. Two nominal types are the same type iff their
/// identities are equal, whatever their shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity(u32);

impl TypeIdentity {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// An opaque primitive such as `String` or a `native type` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicType {
    pub identity: TypeIdentity,
    pub name: String,
    pub mutable: bool,
}

impl AtomicType {
    #[must_use]
    pub fn new(identity: TypeIdentity, name: impl Into<String>, mutable: bool) -> Self {
        Self {
            identity,
            name: name.into(),
            mutable,
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.mutable {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// The field set of a class, known once its body has been analyzed.
#[derive(Debug, Clone)]
pub struct ClassBody {
    pub object: Rc<ObjectType>,
    /// Fields that are declared but carry no value.
    pub abstract_fields: Vec<String>,
}

impl ClassBody {
    pub fn is_abstract(&self, field: &str) -> bool {
        self.abstract_fields.iter().any(|name| name == field)
    }

    /// Structural instantiation: `found` must supply every abstract field,
    /// and any field it supplies must be accepted. Concrete fields it leaves
    /// out keep the class defaults.
    #[must_use]
    pub fn accepts_instance(&self, found: &ObjectType) -> bool {
        self.object
            .fields()
            .iter()
            .all(|(name, expected)| match found.field(name) {
                Some(actual) => expected.accepts(actual),
                None => !self.is_abstract(name),
            })
    }
}

/// A nominal object type declared by a type alias such as `Point = [x: Int]`.
///
/// The identity set is known as soon as the alias resolves; the body is
/// filled in later so that classes may refer to themselves.
#[derive(Debug)]
pub struct ClassType {
    pub identity: TypeIdentity,
    pub name: String,
    pub mutable: bool,
    /// Own identity plus the identities of every inherited class.
    pub identities: BTreeSet<TypeIdentity>,
    body: OnceCell<ClassBody>,
}

impl ClassType {
    #[must_use]
    pub fn new(
        identity: TypeIdentity,
        name: impl Into<String>,
        mutable: bool,
        inherited: impl IntoIterator<Item = TypeIdentity>,
    ) -> Self {
        let mut identities: BTreeSet<TypeIdentity> = inherited.into_iter().collect();
        identities.insert(identity);
        Self {
            identity,
            name: name.into(),
            mutable,
            identities,
            body: OnceCell::new(),
        }
    }

    /// Creates a class whose body is already known.
    #[must_use]
    pub fn with_body(
        identity: TypeIdentity,
        name: impl Into<String>,
        inherited: impl IntoIterator<Item = TypeIdentity>,
        body: ClassBody,
    ) -> Self {
        let class = Self::new(identity, name, body.object.is_mutable(), inherited);
        let _ = class.body.set(body);
        class
    }

    #[must_use]
    pub fn body(&self) -> Option<&ClassBody> {
        self.body.get()
    }

    #[must_use]
    pub fn object(&self) -> Option<&ObjectType> {
        self.body.get().map(|body| body.object.as_ref())
    }

    /// Records the body. Returns false if it was already set.
    pub fn set_body(&self, body: ClassBody) -> bool {
        self.body.set(body).is_ok()
    }

    /// True when `other` descends from this class.
    #[must_use]
    pub fn is_inherited_by(&self, other: &ClassType) -> bool {
        other.identities.contains(&self.identity)
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.mutable {
            write!(f, "!")?;
        }
        Ok(())
    }
}
