//! Scope arena.
//!
//! Scopes live in an arena and refer to their parent by id, so the chain can
//! be walked without reference cycles. Each scope owns a type table and two
//! signature tables: fields (plain pure names) and functions (everything
//! else).

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use tinyscript_core::types::{ObjectType, Type, TypeIdentity};
use tinyscript_core::{Error, Result, Span};

use crate::checker::Lazy;
use crate::results::Typed;
use crate::signature::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A field contributed to an object by an `&Base` statement.
#[derive(Debug, Clone)]
pub struct InheritedField {
    pub name: String,
    pub ty: Type,
    pub is_abstract: bool,
}

/// Everything an object inherits from its `&Base` statements.
#[derive(Debug, Clone, Default)]
pub struct Inheritance {
    pub fields: Vec<InheritedField>,
    /// Identities of every class base, transitively.
    pub identities: Vec<TypeIdentity>,
    /// Fields two bases disagree on.
    pub conflicts: Vec<String>,
}

impl Inheritance {
    pub fn field(&self, name: &str) -> Option<&InheritedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// What `this` denotes inside an object body.
#[derive(Clone)]
pub enum ThisSource<'a> {
    /// The object literal being built; forcing it assembles every field.
    Literal(Lazy<'a, Typed>),
    /// The class whose body is being analyzed.
    Class(Type),
}

/// State of an object scope, filled in while the object is set up.
#[derive(Default)]
pub struct ObjectFrame<'a> {
    pub this: OnceCell<ThisSource<'a>>,
    pub inheritance: OnceCell<Inheritance>,
    /// The declaration scope holding the object's own members.
    pub members: OnceCell<ScopeId>,
}

pub enum ScopeKind<'a> {
    /// Intrinsic types, values and operators. Has no parent.
    Global,
    /// A file, block or object body.
    Declaration {
        allows_impure_statements: bool,
        object: bool,
    },
    /// Wraps the object being built; answers for inherited fields and `this`.
    Object(ObjectFrame<'a>),
    /// A function's parameters; introduces no types.
    Parameters {
        params: Rc<ObjectType>,
        impure: bool,
    },
    /// The receiver of a declaration such as `Int.double`.
    This { receiver: Type, impure: bool },
}

impl ScopeKind<'_> {
    fn label(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Declaration { object: true, .. } => "object body",
            ScopeKind::Declaration { .. } => "declaration",
            ScopeKind::Object(_) => "object",
            ScopeKind::Parameters { .. } => "parameters",
            ScopeKind::This { .. } => "this",
        }
    }
}

struct TypeEntry<'a> {
    name: String,
    mutable: bool,
    cell: Lazy<'a, Type>,
}

pub struct Scope<'a> {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind<'a>,
    types: RefCell<Vec<TypeEntry<'a>>>,
    fields: RefCell<Vec<Rc<Symbol<'a>>>>,
    functions: RefCell<Vec<Rc<Symbol<'a>>>>,
    /// Signatures with a receiver or parameters, keyed by name. Each cell
    /// defines its symbol when forced.
    heads: RefCell<Vec<(String, Lazy<'a, Rc<Symbol<'a>>>)>>,
}

impl<'a> Scope<'a> {
    /// Registers a type. Mutable and immutable types with the same name are
    /// distinct entries.
    ///
    /// # Errors
    /// Returns `DuplicateDeclaration` if the name and mutability are taken.
    pub fn define_type(
        &self,
        name: &str,
        mutable: bool,
        cell: Lazy<'a, Type>,
        span: Span,
    ) -> Result<()> {
        let mut types = self.types.borrow_mut();
        if types
            .iter()
            .any(|entry| entry.name == name && entry.mutable == mutable)
        {
            return Err(Error::DuplicateDeclaration {
                name: name.to_string(),
                span,
            });
        }
        types.push(TypeEntry {
            name: name.to_string(),
            mutable,
            cell,
        });
        Ok(())
    }

    pub fn find_type(&self, name: &str, mutable: bool) -> Option<Lazy<'a, Type>> {
        self.types
            .borrow()
            .iter()
            .find(|entry| entry.name == name && entry.mutable == mutable)
            .map(|entry| Rc::clone(&entry.cell))
    }

    /// Registers a symbol in the field or function table.
    ///
    /// # Errors
    /// Returns `DuplicateDeclaration` if an overlapping signature exists in
    /// the same table.
    pub fn define(&self, symbol: Rc<Symbol<'a>>) -> Result<()> {
        let table = if symbol.signature.is_field() {
            &self.fields
        } else {
            &self.functions
        };
        let mut table = table.borrow_mut();
        if table
            .iter()
            .any(|existing| existing.signature.overlaps(&symbol.signature))
        {
            return Err(Error::DuplicateDeclaration {
                name: symbol.signature.to_string(),
                span: symbol.span,
            });
        }
        table.push(symbol);
        Ok(())
    }

    pub fn defer_head(&self, key: impl Into<String>, cell: Lazy<'a, Rc<Symbol<'a>>>) {
        self.heads.borrow_mut().push((key.into(), cell));
    }

    /// Heads named `key` whose symbol is not defined yet.
    pub fn pending_heads(&self, key: &str) -> Vec<Lazy<'a, Rc<Symbol<'a>>>> {
        self.heads
            .borrow()
            .iter()
            .filter(|(name, cell)| name == key && !cell.is_resolved())
            .map(|(_, cell)| Rc::clone(cell))
            .collect()
    }

    /// Every symbol of both tables, fields first.
    pub fn symbols(&self) -> Vec<Rc<Symbol<'a>>> {
        self.fields
            .borrow()
            .iter()
            .chain(self.functions.borrow().iter())
            .cloned()
            .collect()
    }

    /// A field-table symbol by name.
    pub fn field(&self, name: &str) -> Option<Rc<Symbol<'a>>> {
        self.fields
            .borrow()
            .iter()
            .find(|symbol| symbol.name() == name)
            .cloned()
    }

    pub fn object_frame(&self) -> Option<&ObjectFrame<'a>> {
        match &self.kind {
            ScopeKind::Object(frame) => Some(frame),
            _ => None,
        }
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("kind", &self.kind.label())
            .field("types", &self.types.borrow().len())
            .field("fields", &self.fields.borrow().len())
            .field("functions", &self.functions.borrow().len())
            .finish()
    }
}

/// Owns every scope created during one analyzer's lifetime.
#[derive(Default)]
pub struct ScopeArena<'a> {
    scopes: RefCell<Vec<Rc<Scope<'a>>>>,
}

impl<'a> ScopeArena<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, parent: Option<ScopeId>, kind: ScopeKind<'a>) -> ScopeId {
        let mut scopes = self.scopes.borrow_mut();
        let id = ScopeId(scopes.len() as u32);
        tracing::trace!(%id, kind = kind.label(), "new scope");
        scopes.push(Rc::new(Scope {
            id,
            parent,
            kind,
            types: RefCell::new(Vec::new()),
            fields: RefCell::new(Vec::new()),
            functions: RefCell::new(Vec::new()),
            heads: RefCell::new(Vec::new()),
        }));
        id
    }

    /// # Panics
    /// Panics if `id` was not issued by this arena.
    pub fn get(&self, id: ScopeId) -> Rc<Scope<'a>> {
        Rc::clone(&self.scopes.borrow()[id.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.scopes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.borrow().is_empty()
    }

    /// The chain from `id` outwards, innermost first.
    pub fn chain(&self, id: ScopeId) -> Vec<Rc<Scope<'a>>> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = self.get(id);
            current = scope.parent;
            chain.push(scope);
        }
        chain
    }
}
