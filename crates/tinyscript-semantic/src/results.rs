//! Analysis output handed to the code generator.

use std::collections::HashMap;
use tinyscript_ast::NodeId;
use tinyscript_core::types::Type;

use crate::scope::ScopeId;
use crate::signature::Signature;

/// The type of an analyzed expression or declaration body.
#[derive(Debug, Clone)]
pub struct Typed {
    pub ty: Type,
    /// Evaluating the expression may have an externally visible effect.
    pub impure: bool,
    /// A recursive branch was skipped; the type is re-checked in the post-pass.
    pub provisional: bool,
}

impl Typed {
    pub fn pure(ty: Type) -> Self {
        Self {
            ty,
            impure: false,
            provisional: false,
        }
    }

    pub fn new(ty: Type, impure: bool) -> Self {
        Self {
            ty,
            impure,
            provisional: false,
        }
    }
}

/// How a name reference is reached, which decides whether generated code
/// needs a `this.` qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// A declaration in a file or block scope.
    Local,
    Parameter,
    /// A field of the enclosing object or receiver.
    ThisField,
    /// A method applied to the enclosing receiver.
    ThisMethod,
    /// A field of an explicit target.
    Member,
    /// A receiver function applied to an explicit target.
    Method,
    Intrinsic,
    This,
}

/// What the analyzer computed for one expression node.
#[derive(Debug, Clone)]
pub struct ExpressionInfo {
    pub scope: ScopeId,
    pub ty: Type,
    pub impure: bool,
    pub access: Option<Access>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationCategory {
    TypeAlias,
    NativeType,
    Value,
    Function,
    Abstract,
    Native,
    Statement,
}

/// A fully typed declaration.
#[derive(Debug, Clone)]
pub struct ResolvedDeclaration {
    pub id: NodeId,
    pub name: String,
    pub category: DeclarationCategory,
    pub signature: Option<Signature>,
    pub ty: Type,
    pub impure: bool,
}

/// Result of analyzing one declaration sequence.
///
/// Scope ids are only meaningful to the analyzer that produced them; the
/// expression map is self-contained.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scope: ScopeId,
    /// Declarations in resolution order: dependencies come first.
    pub declarations: Vec<ResolvedDeclaration>,
    /// Every expression analyzed in this scope or below it.
    pub expressions: HashMap<NodeId, ExpressionInfo>,
}

impl Analysis {
    pub fn expression(&self, id: NodeId) -> Option<&ExpressionInfo> {
        self.expressions.get(&id)
    }

    pub fn declaration(&self, name: &str) -> Option<&ResolvedDeclaration> {
        self.declarations.iter().find(|declaration| declaration.name == name)
    }

    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.declaration(name).map(|declaration| &declaration.ty)
    }
}
