//! A tiny integer expression tree used to exercise the reactor.

use kiln_core::Result;
use kiln_reactor::{Attribute, Cx, Reactor, Rule, RuleSet, Tree, TreeBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Num,
    Add,
    Neg,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Num(i64),
    Add(usize, usize),
    Neg(usize),
}

#[derive(Debug, Default)]
pub struct Exprs {
    pub nodes: Vec<Expr>,
}

impl Exprs {
    pub fn push(&mut self, expr: Expr) -> usize {
        self.nodes.push(expr);
        self.nodes.len() - 1
    }
}

impl Tree for Exprs {
    type Kind = Kind;

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn kind(&self, index: usize) -> Kind {
        match self.nodes[index] {
            Expr::Num(_) => Kind::Num,
            Expr::Add(..) => Kind::Add,
            Expr::Neg(_) => Kind::Neg,
        }
    }
}

/// Counts trigger invocations, shared by every rule of a run.
#[derive(Debug, Default)]
pub struct Counter {
    pub runs: usize,
}

pub type TestReactor = Reactor<i64, Counter>;

pub struct NumRule;

impl Rule<Exprs, i64, Counter> for NumRule {
    fn name(&self) -> &'static str {
        "num"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Num]
    }

    fn provided(&self, tree: &TreeBinding<Exprs>, index: usize) -> Vec<Attribute> {
        vec![tree.attr(index, "value")]
    }

    fn compute(
        &self,
        cx: &mut Cx<'_, i64, Counter>,
        tree: &TreeBinding<Exprs>,
        index: usize,
    ) -> Result<()> {
        cx.context.runs += 1;
        let Expr::Num(n) = tree.tree().nodes[index] else {
            unreachable!()
        };
        cx.set(tree.attr(index, "value"), n)
    }
}

pub struct AddRule;

impl Rule<Exprs, i64, Counter> for AddRule {
    fn name(&self) -> &'static str {
        "add"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Add]
    }

    fn consumed(&self, tree: &TreeBinding<Exprs>, index: usize) -> Vec<Attribute> {
        let Expr::Add(l, r) = tree.tree().nodes[index] else {
            unreachable!()
        };
        vec![tree.attr(l, "value"), tree.attr(r, "value")]
    }

    fn provided(&self, tree: &TreeBinding<Exprs>, index: usize) -> Vec<Attribute> {
        vec![tree.attr(index, "value")]
    }

    fn compute(
        &self,
        cx: &mut Cx<'_, i64, Counter>,
        tree: &TreeBinding<Exprs>,
        index: usize,
    ) -> Result<()> {
        cx.context.runs += 1;
        let Expr::Add(l, r) = tree.tree().nodes[index] else {
            unreachable!()
        };
        let left = *cx.value(tree.node(l), "value").unwrap();
        let right = *cx.value(tree.node(r), "value").unwrap();
        cx.set(tree.attr(index, "value"), left + right)
    }
}

/// Negation that refuses to negate zero, reporting instead.
pub struct NegRule;

impl Rule<Exprs, i64, Counter> for NegRule {
    fn name(&self) -> &'static str {
        "neg"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Neg]
    }

    fn consumed(&self, tree: &TreeBinding<Exprs>, index: usize) -> Vec<Attribute> {
        let Expr::Neg(operand) = tree.tree().nodes[index] else {
            unreachable!()
        };
        vec![tree.attr(operand, "value")]
    }

    fn provided(&self, tree: &TreeBinding<Exprs>, index: usize) -> Vec<Attribute> {
        vec![tree.attr(index, "value")]
    }

    fn compute(
        &self,
        cx: &mut Cx<'_, i64, Counter>,
        tree: &TreeBinding<Exprs>,
        index: usize,
    ) -> Result<()> {
        cx.context.runs += 1;
        let Expr::Neg(operand) = tree.tree().nodes[index] else {
            unreachable!()
        };
        let value = *cx.value(tree.node(operand), "value").unwrap();
        if value == 0 {
            cx.report(kiln_core::Diagnostic::type_error(cx.node(), "cannot negate zero"));
            return Ok(());
        }
        cx.set(tree.attr(index, "value"), -value)
    }
}

pub fn arithmetic() -> RuleSet<Exprs, i64, Counter> {
    RuleSet::new("arithmetic")
        .with(NumRule)
        .with(AddRule)
        .with(NegRule)
}
