//! Memoized, reentrancy-detecting computation cells.
//!
//! Every hoisted declaration owns a [`Deferred`] whose producer analyzes the
//! declaration body on first use. Re-entering a cell while its producer is
//! running means the value is defined in terms of itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tinyscript_core::{Error, Result, Span};

/// The closure that computes a cell's value, given the analysis context.
pub type Producer<'a, C, T> = Rc<dyn Fn(&C) -> Result<T> + 'a>;

enum State<'a, C: ?Sized, T> {
    Unresolved(Producer<'a, C, T>),
    Resolving(Producer<'a, C, T>),
    Resolved(T),
    Failed,
}

pub struct Deferred<'a, C: ?Sized, T> {
    name: String,
    span: Span,
    order_sensitive: bool,
    function_body: bool,
    state: RefCell<State<'a, C, T>>,
}

impl<'a, C: ?Sized, T: Clone> Deferred<'a, C, T> {
    pub fn new(
        name: impl Into<String>,
        span: Span,
        producer: impl Fn(&C) -> Result<T> + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            span,
            order_sensitive: false,
            function_body: false,
            state: RefCell::new(State::Unresolved(Rc::new(producer))),
        }
    }

    /// A cell that is resolved from the start.
    pub fn resolved(name: impl Into<String>, span: Span, value: T) -> Self {
        Self {
            name: name.into(),
            span,
            order_sensitive: false,
            function_body: false,
            state: RefCell::new(State::Resolved(value)),
        }
    }

    /// Marks the cell as order-sensitive: it may only be forced as root
    /// while unresolved.
    #[must_use]
    pub fn order_sensitive(mut self) -> Self {
        self.order_sensitive = true;
        self
    }

    /// Marks the cell as a function body. Cycles through function bodies are
    /// recoverable by a branch with a non-recursive alternative.
    #[must_use]
    pub fn function_body(mut self) -> Self {
        self.function_body = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_order_sensitive(&self) -> bool {
        self.order_sensitive
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), State::Resolved(_))
    }

    pub fn is_resolving(&self) -> bool {
        matches!(*self.state.borrow(), State::Resolving(_))
    }

    /// The cached value, without forcing.
    pub fn peek(&self) -> Option<T> {
        match &*self.state.borrow() {
            State::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the cached value, computing it on first use.
    ///
    /// `root` is set when the cell is forced directly by the finalize pass
    /// rather than pulled in by another cell's producer.
    ///
    /// # Errors
    /// - `Cycle` if the cell is re-entered while its producer runs
    /// - `OrderSensitiveForwardReference` if an order-sensitive cell is
    ///   forced out of order
    /// - `Poisoned` if the producer failed on an earlier call
    /// - any error returned by the producer
    pub fn get(&self, cx: &C, root: bool) -> Result<T> {
        let producer = {
            let mut state = self.state.borrow_mut();
            let producer = match &*state {
                State::Resolved(value) => return Ok(value.clone()),
                State::Resolving(_) => {
                    tracing::trace!(name = %self.name, "deferred re-entered");
                    return Err(Error::Cycle {
                        name: self.name.clone(),
                        recoverable: self.function_body,
                        span: self.span,
                    });
                }
                State::Failed => {
                    return Err(Error::Poisoned {
                        name: self.name.clone(),
                        span: self.span,
                    });
                }
                State::Unresolved(producer) => {
                    if self.order_sensitive && !root {
                        return Err(Error::OrderSensitiveForwardReference {
                            name: self.name.clone(),
                            span: self.span,
                        });
                    }
                    Rc::clone(producer)
                }
            };
            *state = State::Resolving(Rc::clone(&producer));
            producer
        };

        tracing::trace!(name = %self.name, root, "resolving deferred");
        let result = producer(cx);

        let mut state = self.state.borrow_mut();
        match result {
            Ok(value) => {
                *state = State::Resolved(value.clone());
                tracing::trace!(name = %self.name, "deferred resolved");
                Ok(value)
            }
            Err(error) if error.is_recoverable_cycle() => {
                // Another branch may still succeed; allow a later retry.
                *state = State::Unresolved(producer);
                Err(error)
            }
            Err(error) => {
                *state = State::Failed;
                Err(error)
            }
        }
    }
}

impl<C: ?Sized, T> fmt::Debug for Deferred<'_, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            State::Unresolved(_) => "unresolved",
            State::Resolving(_) => "resolving",
            State::Resolved(_) => "resolved",
            State::Failed => "failed",
        };
        f.debug_struct("Deferred")
            .field("name", &self.name)
            .field("state", &state)
            .finish()
    }
}
