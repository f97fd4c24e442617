//! The standard-library prelude, analyzed once per analyzer under the
//! intrinsics scope and used as the parent of user files.

use std::sync::LazyLock;
use tinyscript_ast::{AstBuilder, Declaration, Operator};

/// Prelude nodes are numbered from here so they never collide with ids
/// handed out by a parser for user files.
pub const PRELUDE_FIRST_NODE: u32 = 1 << 30;

static PRELUDE: LazyLock<Vec<Declaration>> = LazyLock::new(build);

/// The prelude declarations.
#[must_use]
pub fn declarations() -> &'static [Declaration] {
    &PRELUDE
}

fn build() -> Vec<Declaration> {
    let b = AstBuilder::starting_at(PRELUDE_FIRST_NODE);

    let abs = b.method(
        b.type_name("Int"),
        "abs",
        b.if_else(
            b.binary(Operator::Less, b.this(), b.int(0)),
            b.unary(Operator::Subtract, b.this()),
            Some(b.this()),
        ),
    );
    let double = b.method(
        b.type_name("Int"),
        "double",
        b.binary(Operator::Multiply, b.this(), b.int(2)),
    );
    let half = b.method(
        b.type_name("Float"),
        "half",
        b.binary(Operator::Divide, b.this(), b.float(2.0)),
    );

    let max = b.function(
        "max",
        vec![("a", b.type_name("Int")), ("b", b.type_name("Int"))],
        b.if_else(
            b.binary(Operator::Greater, b.name("a"), b.name("b")),
            b.name("a"),
            Some(b.name("b")),
        ),
    );
    let min = b.function(
        "min",
        vec![("a", b.type_name("Int")), ("b", b.type_name("Int"))],
        b.if_else(
            b.binary(Operator::Less, b.name("a"), b.name("b")),
            b.name("a"),
            Some(b.name("b")),
        ),
    );

    let pair = b.type_alias(
        "Pair",
        b.params(vec![("first", b.type_name("Any")), ("second", b.type_name("Any"))]),
    );

    vec![abs, double, half, max, min, pair]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_ids_start_high() {
        let declarations = declarations();
        assert_eq!(declarations.len(), 6);
        assert!(declarations.iter().all(|d| d.id.0 >= PRELUDE_FIRST_NODE));
    }
}
