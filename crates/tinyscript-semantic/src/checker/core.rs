//! Core analyzer structure and entry points.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use tinyscript_ast::{Declaration, Expression, NodeId};
use tinyscript_core::types::{ClassBody, Type, TypeIdentity};
use tinyscript_core::{Error, Result};
use tinyscript_utils::{AnalysisConfig, Config};

use super::Lazy;
use super::declarations::BlockMode;
use crate::deferred::Deferred;
use crate::intrinsics::{FIRST_DECLARED_IDENTITY, Intrinsics};
use crate::prelude;
use crate::results::{Access, Analysis, ExpressionInfo, ResolvedDeclaration, Typed};
use crate::scope::{Scope, ScopeArena, ScopeId, ScopeKind};

/// The declaration whose body is being resolved.
#[derive(Debug, Clone)]
pub(crate) struct Owner {
    pub name: String,
    pub impure: bool,
}

/// A branch skipped because it re-entered a function body, re-analyzed once
/// every deferred has resolved.
pub(crate) struct PendingCheck<'a> {
    pub scope: ScopeId,
    pub branch: &'a Expression,
    pub expected: Type,
    pub owner: Option<Owner>,
}

/// Semantic analyzer for TinyScript declaration sequences.
///
/// Holds the scope arena, the result map and every deferred cell created
/// while analyzing. Syntax trees must outlive the analyzer, since deferred
/// producers keep references into them.
pub struct Analyzer<'a> {
    pub(crate) config: AnalysisConfig,
    pub(crate) scopes: ScopeArena<'a>,
    pub(crate) intrinsics: Intrinsics,
    global: ScopeId,
    prelude: Cell<Option<ScopeId>>,
    next_identity: Cell<u32>,
    depth: Cell<usize>,
    pub(crate) results: RefCell<HashMap<NodeId, ExpressionInfo>>,
    pub(crate) resolved: RefCell<HashMap<ScopeId, Vec<ResolvedDeclaration>>>,
    pub(crate) class_bodies: RefCell<HashMap<TypeIdentity, Lazy<'a, ClassBody>>>,
    pub(crate) pending: RefCell<Vec<PendingCheck<'a>>>,
    pub(crate) owners: RefCell<Vec<Owner>>,
}

impl<'a> Analyzer<'a> {
    /// Creates an analyzer whose global scope holds the intrinsics.
    ///
    /// # Errors
    /// Returns `DuplicateDeclaration` if two intrinsics overlap.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let scopes = ScopeArena::new();
        let global = scopes.push(None, ScopeKind::Global);
        let intrinsics = Intrinsics::new();
        intrinsics.install(&scopes.get(global))?;

        Ok(Self {
            config,
            scopes,
            intrinsics,
            global,
            prelude: Cell::new(None),
            next_identity: Cell::new(FIRST_DECLARED_IDENTITY),
            depth: Cell::new(0),
            results: RefCell::new(HashMap::new()),
            resolved: RefCell::new(HashMap::new()),
            class_bodies: RefCell::new(HashMap::new()),
            pending: RefCell::new(Vec::new()),
            owners: RefCell::new(Vec::new()),
        })
    }

    /// Creates an analyzer configured by the `[analysis]` table of the
    /// nearest `tinyscript.toml` in `dir` or one of its ancestors.
    ///
    /// # Errors
    /// Returns an error if no configuration file is found or it cannot be
    /// loaded.
    pub fn from_project(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let (config, root) = Config::find_from(dir)?;
        tracing::debug!(
            package = %config.package.name,
            root = %root.display(),
            "project configuration loaded"
        );
        Ok(Self::new(config.analysis)?)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The intrinsics scope. Has no parent.
    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn scope(&self, id: ScopeId) -> Rc<Scope<'a>> {
        self.scopes.get(id)
    }

    /// Analyzes `declarations` in a new scope under `parent`. Impure
    /// order-sensitive statements are permitted at the top level.
    ///
    /// # Errors
    /// Returns the first error encountered.
    #[tracing::instrument(skip(self, declarations), fields(count = declarations.len()))]
    pub fn analyze(&self, declarations: &'a [Declaration], parent: ScopeId) -> Result<Analysis> {
        self.analyze_root(declarations, parent, true)
    }

    /// Like [`Analyzer::analyze`], but rejects impure order-sensitive
    /// statements at the top level.
    ///
    /// # Errors
    /// Returns the first error encountered.
    #[tracing::instrument(skip(self, declarations), fields(count = declarations.len()))]
    pub fn analyze_pure(
        &self,
        declarations: &'a [Declaration],
        parent: ScopeId,
    ) -> Result<Analysis> {
        self.analyze_root(declarations, parent, false)
    }

    /// Analyzes a user file under the prelude, or directly under the
    /// intrinsics when the prelude is disabled.
    ///
    /// # Errors
    /// Returns the first error encountered, including prelude errors.
    pub fn analyze_file(&self, declarations: &'a [Declaration]) -> Result<Analysis> {
        let parent = if self.config.load_prelude {
            self.load_prelude()?
        } else {
            self.global
        };
        self.analyze(declarations, parent)
    }

    /// Analyzes the standard-library prelude once and returns its scope.
    ///
    /// # Errors
    /// Returns an error if the prelude fails to analyze.
    pub fn load_prelude(&self) -> Result<ScopeId> {
        if let Some(scope) = self.prelude.get() {
            return Ok(scope);
        }
        let analysis = self.analyze_pure(prelude::declarations(), self.global)?;
        self.prelude.set(Some(analysis.scope));
        Ok(analysis.scope)
    }

    /// Scope, type, impurity and access kind computed for an expression.
    pub fn expression_info(&self, id: NodeId) -> Option<ExpressionInfo> {
        self.results.borrow().get(&id).cloned()
    }

    /// Declarations resolved in `scope`, in resolution order.
    pub fn declarations(&self, scope: ScopeId) -> Vec<ResolvedDeclaration> {
        self.resolved
            .borrow()
            .get(&scope)
            .cloned()
            .unwrap_or_default()
    }

    fn analyze_root(
        &self,
        declarations: &'a [Declaration],
        parent: ScopeId,
        allows_impure_statements: bool,
    ) -> Result<Analysis> {
        let scope = self.scopes.push(
            Some(parent),
            ScopeKind::Declaration {
                allows_impure_statements,
                object: false,
            },
        );
        self.analyze_block(declarations, scope, BlockMode::File)?;
        self.run_pending_checks()?;
        tracing::debug!(%scope, "analysis complete");

        Ok(Analysis {
            scope,
            declarations: self.declarations(scope),
            expressions: self.expressions_within(scope),
        })
    }

    fn expressions_within(&self, scope: ScopeId) -> HashMap<NodeId, ExpressionInfo> {
        self.results
            .borrow()
            .iter()
            .filter(|(_, info)| {
                self.scopes
                    .chain(info.scope)
                    .iter()
                    .any(|ancestor| ancestor.id == scope)
            })
            .map(|(id, info)| (*id, info.clone()))
            .collect()
    }

    /// Forces a cell, bounding the nesting of resolution.
    pub(crate) fn force<T: Clone>(
        &self,
        cell: &Deferred<'a, Analyzer<'a>, T>,
        root: bool,
    ) -> Result<T> {
        if let Some(value) = cell.peek() {
            return Ok(value);
        }
        let depth = self.depth.get();
        if depth >= self.config.max_resolution_depth {
            return Err(Error::ResolutionDepth {
                limit: self.config.max_resolution_depth,
                span: cell.span(),
            });
        }
        self.depth.set(depth + 1);
        let result = cell.get(self, root);
        self.depth.set(depth);
        result
    }

    pub(crate) fn fresh_identity(&self) -> TypeIdentity {
        let id = self.next_identity.get();
        self.next_identity.set(id + 1);
        TypeIdentity::new(id)
    }

    pub(crate) fn record(
        &self,
        id: NodeId,
        scope: ScopeId,
        typed: &Typed,
        access: Option<Access>,
    ) {
        self.results.borrow_mut().insert(
            id,
            ExpressionInfo {
                scope,
                ty: typed.ty.clone(),
                impure: typed.impure,
                access,
            },
        );
    }

    pub(crate) fn record_declaration(&self, scope: ScopeId, declaration: ResolvedDeclaration) {
        tracing::trace!(name = %declaration.name, ty = %declaration.ty, "declaration resolved");
        self.resolved
            .borrow_mut()
            .entry(scope)
            .or_default()
            .push(declaration);
    }

    /// Runs the body of a declaration with `owner` on the owner stack.
    pub(crate) fn with_owner<T>(&self, owner: Owner, run: impl FnOnce() -> Result<T>) -> Result<T> {
        self.owners.borrow_mut().push(owner);
        let result = run();
        self.owners.borrow_mut().pop();
        result
    }

    /// Queues `branch` for the post-pass. A body retried after a cycle
    /// queues its branches again; the later check replaces the earlier one.
    pub(crate) fn defer_branch(&self, scope: ScopeId, branch: &'a Expression, expected: Type) {
        let owner = self.owners.borrow().last().cloned();
        tracing::debug!(owner = ?owner.as_ref().map(|owner| &owner.name), "recursive branch deferred");
        let check = PendingCheck {
            scope,
            branch,
            expected,
            owner,
        };
        let mut pending = self.pending.borrow_mut();
        match pending.iter_mut().find(|queued| queued.branch.id == branch.id) {
            Some(queued) => *queued = check,
            None => pending.push(check),
        }
    }

    fn run_pending_checks(&self) -> Result<()> {
        loop {
            let pending = std::mem::take(&mut *self.pending.borrow_mut());
            if pending.is_empty() {
                return Ok(());
            }
            tracing::debug!(count = pending.len(), "re-checking recursive branches");
            for check in pending {
                let typed = self.expression(check.branch, check.scope)?;
                let owner = check
                    .owner
                    .as_ref()
                    .map_or("anonymous function", |owner| owner.name.as_str());
                self.check_accepts(&check.expected, &typed.ty, check.branch.span, || {
                    format!("recursive branch of `{owner}`")
                })?;
                if let Some(owner) = &check.owner
                    && typed.impure
                    && !owner.impure
                {
                    return Err(Error::FunctionImpure {
                        name: owner.name.clone(),
                        problem: "has effects but is not marked impure",
                        span: check.branch.span,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyscript_ast::AstBuilder;

    #[test]
    fn test_requeued_branch_replaces_earlier_check() {
        let b = AstBuilder::new();
        let branch = b.int(1);
        let other = b.int(2);
        let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
        let scope = analyzer.global_scope();

        analyzer.defer_branch(scope, &branch, Type::int());
        analyzer.defer_branch(scope, &other, Type::int());
        analyzer.defer_branch(scope, &branch, Type::float());

        let pending = analyzer.pending.borrow();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].expected.to_string(), "Float");
    }
}
