//! Typing rules for Java expressions.
//!
//! Every expression gets a `type` attribute computed from the `type` of its
//! operands. An ill-typed expression is reported and its `type` stays
//! absent, so expressions built on top of it never run.

mod rules;

pub use rules::{
    BinaryArithRule, BitwiseRule, ComplementRule, EqualRule, InstanceofRule, LiteralRule,
    LogicalRule, NotRule, OrderingRule, ShiftRule, UnaryArithRule,
};

use crate::ast::Ast;
use crate::resolver::Resolver;
use crate::types::{Type, Value};
use kiln_core::{Attribute, Diagnostic, Result};
use kiln_reactor::{Cx, RuleSet, TreeBinding};

/// Attribute holding the [`Type`] of an expression.
pub const TYPE: &str = "type";

pub type JavaCx<'a> = Cx<'a, Value, Resolver>;

/// All typing rules.
pub fn rules() -> RuleSet<Ast, Value, Resolver> {
    RuleSet::new("typing")
        .with(LiteralRule)
        .with(NotRule)
        .with(ComplementRule)
        .with(UnaryArithRule)
        .with(BinaryArithRule)
        .with(ShiftRule)
        .with(OrderingRule)
        .with(InstanceofRule)
        .with(EqualRule)
        .with(BitwiseRule)
        .with(LogicalRule)
}

pub(crate) fn type_attr(tree: &TreeBinding<Ast>, index: usize) -> Attribute {
    tree.attr(index, TYPE)
}

/// The computed type of a syntax node. Consumed attributes are always
/// available, so `None` means the node was typed as nothing.
pub(crate) fn type_of(cx: &JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Option<Type> {
    cx.value(tree.node(index), TYPE).and_then(Value::as_type)
}

pub(crate) fn set_type(cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize, ty: Type) -> Result<()> {
    cx.set(type_attr(tree, index), Value::Type(ty))
}

pub(crate) fn type_error(cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize, message: String) {
    let node = tree.node(index);
    cx.report(Diagnostic::type_error(node, message));
}
