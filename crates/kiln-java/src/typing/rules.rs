use super::{JavaCx, set_type, type_attr, type_error, type_of};
use crate::ast::{Ast, BinaryOp, Kind, Literal, Syntax, UnaryOp};
use crate::resolution::RESOLVED;
use crate::resolver::Resolver;
use crate::types::{Primitive, Type, Value, binary_promotion, unary_promotion};
use kiln_core::{Attribute, Result};
use kiln_reactor::{Rule, TreeBinding};

fn unary(tree: &TreeBinding<Ast>, index: usize) -> Option<(UnaryOp, usize)> {
    match tree.tree().syntax(index) {
        Syntax::Unary { op, operand } => Some((*op, *operand)),
        _ => None,
    }
}

fn binary(tree: &TreeBinding<Ast>, index: usize) -> Option<(BinaryOp, usize, usize)> {
    match tree.tree().syntax(index) {
        Syntax::Binary { op, left, right } => Some((*op, *left, *right)),
        _ => None,
    }
}

fn unary_consumed(tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
    unary(tree, index)
        .map(|(_, operand)| vec![type_attr(tree, operand)])
        .unwrap_or_default()
}

fn binary_consumed(tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
    binary(tree, index)
        .map(|(_, left, right)| vec![type_attr(tree, left), type_attr(tree, right)])
        .unwrap_or_default()
}

fn describe(cx: &JavaCx<'_>, ty: Option<Type>) -> String {
    ty.map_or_else(|| "nothing".to_string(), |ty| cx.context.type_name(ty))
}

/// Operand types after unboxing.
fn unboxed_pair(
    cx: &JavaCx<'_>,
    tree: &TreeBinding<Ast>,
    left: usize,
    right: usize,
) -> (Option<Type>, Option<Type>, Option<Primitive>, Option<Primitive>) {
    let lt = type_of(cx, tree, left);
    let rt = type_of(cx, tree, right);
    let lu = lt.and_then(|ty| cx.context.unboxed(ty));
    let ru = rt.and_then(|ty| cx.context.unboxed(ty));
    (lt, rt, lu, ru)
}

fn binary_error(
    cx: &mut JavaCx<'_>,
    tree: &TreeBinding<Ast>,
    index: usize,
    what: &str,
    (lt, rt): (Option<Type>, Option<Type>),
) {
    let Some((op, ..)) = binary(tree, index) else {
        return;
    };
    let message = format!(
        "Operator '{}' expects {what}, found '{}' and '{}'",
        op.symbol(),
        describe(cx, lt),
        describe(cx, rt)
    );
    type_error(cx, tree, index, message);
}

pub struct LiteralRule;

impl Rule<Ast, Value, Resolver> for LiteralRule {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Literal]
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Syntax::Literal(literal) = tree.tree().syntax(index) else {
            return Ok(());
        };
        let ty = match literal {
            Literal::Int(_) => Type::INT,
            Literal::Long(_) => Type::Primitive(Primitive::Long),
            Literal::Float(_) => Type::Primitive(Primitive::Float),
            Literal::Double(_) => Type::Primitive(Primitive::Double),
            Literal::Char(_) => Type::Primitive(Primitive::Char),
            Literal::Boolean(_) => Type::BOOLEAN,
            Literal::String(_) => Type::String,
            Literal::Null => Type::Null,
        };
        set_type(cx, tree, index, ty)
    }
}

pub struct NotRule;

impl Rule<Ast, Value, Resolver> for NotRule {
    fn name(&self) -> &'static str {
        "not"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Unary(UnaryOp::Not)]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        unary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, operand)) = unary(tree, index) else {
            return Ok(());
        };
        let ty = type_of(cx, tree, operand);
        if ty.and_then(|ty| cx.context.unboxed(ty)) == Some(Primitive::Boolean) {
            return set_type(cx, tree, index, Type::BOOLEAN);
        }
        let message = format!(
            "Operator '!' expects a boolean operand, found '{}'",
            describe(cx, ty)
        );
        type_error(cx, tree, index, message);
        Ok(())
    }
}

pub struct ComplementRule;

impl Rule<Ast, Value, Resolver> for ComplementRule {
    fn name(&self) -> &'static str {
        "complement"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Unary(UnaryOp::Complement)]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        unary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, operand)) = unary(tree, index) else {
            return Ok(());
        };
        let ty = type_of(cx, tree, operand);
        match ty.and_then(|ty| cx.context.unboxed(ty)) {
            Some(p) if p.is_integral() => {
                set_type(cx, tree, index, Type::Primitive(unary_promotion(p)))
            }
            _ => {
                let message = format!(
                    "Operator '~' expects an integral operand, found '{}'",
                    describe(cx, ty)
                );
                type_error(cx, tree, index, message);
                Ok(())
            }
        }
    }
}

/// Unary `+` and `-`.
pub struct UnaryArithRule;

impl Rule<Ast, Value, Resolver> for UnaryArithRule {
    fn name(&self) -> &'static str {
        "unary arithmetic"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Unary(UnaryOp::Plus), Kind::Unary(UnaryOp::Minus)]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        unary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((op, operand)) = unary(tree, index) else {
            return Ok(());
        };
        let ty = type_of(cx, tree, operand);
        match ty.and_then(|ty| cx.context.unboxed(ty)) {
            Some(p) if p.is_numeric() => {
                set_type(cx, tree, index, Type::Primitive(unary_promotion(p)))
            }
            _ => {
                let message = format!(
                    "Operator '{}' expects a numeric operand, found '{}'",
                    op.symbol(),
                    describe(cx, ty)
                );
                type_error(cx, tree, index, message);
                Ok(())
            }
        }
    }
}

/// `*`, `/`, `%`, `+` and `-`. A sum with a string operand is a
/// concatenation.
pub struct BinaryArithRule;

impl Rule<Ast, Value, Resolver> for BinaryArithRule {
    fn name(&self) -> &'static str {
        "binary arithmetic"
    }

    fn domain(&self) -> Vec<Kind> {
        [
            BinaryOp::Product,
            BinaryOp::Division,
            BinaryOp::Remainder,
            BinaryOp::Sum,
            BinaryOp::Diff,
        ]
        .map(Kind::Binary)
        .to_vec()
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((op, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);

        if op == BinaryOp::Sum && (lt == Some(Type::String) || rt == Some(Type::String)) {
            return set_type(cx, tree, index, Type::String);
        }
        match (lu, ru) {
            (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
                set_type(cx, tree, index, Type::Primitive(binary_promotion(l, r)))
            }
            _ => {
                binary_error(cx, tree, index, "numeric operands", (lt, rt));
                Ok(())
            }
        }
    }
}

/// `<<`, `>>` and `>>>`.
pub struct ShiftRule;

impl Rule<Ast, Value, Resolver> for ShiftRule {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn domain(&self) -> Vec<Kind> {
        [
            BinaryOp::ShiftLeft,
            BinaryOp::ShiftRight,
            BinaryOp::BinaryShiftRight,
        ]
        .map(Kind::Binary)
        .to_vec()
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);
        match (lu, ru) {
            (Some(l), Some(r)) if l.is_integral() && r.is_integral() => {
                set_type(cx, tree, index, Type::Primitive(unary_promotion(l)))
            }
            _ => {
                binary_error(cx, tree, index, "integral operands", (lt, rt));
                Ok(())
            }
        }
    }
}

/// `<`, `<=`, `>` and `>=`.
pub struct OrderingRule;

impl Rule<Ast, Value, Resolver> for OrderingRule {
    fn name(&self) -> &'static str {
        "ordering"
    }

    fn domain(&self) -> Vec<Kind> {
        [
            BinaryOp::Greater,
            BinaryOp::GreaterEqual,
            BinaryOp::Lower,
            BinaryOp::LowerEqual,
        ]
        .map(Kind::Binary)
        .to_vec()
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);
        if lu.is_some_and(Primitive::is_numeric) && ru.is_some_and(Primitive::is_numeric) {
            return set_type(cx, tree, index, Type::BOOLEAN);
        }
        binary_error(cx, tree, index, "numeric operands", (lt, rt));
        Ok(())
    }
}

pub struct InstanceofRule;

impl Rule<Ast, Value, Resolver> for InstanceofRule {
    fn name(&self) -> &'static str {
        "instanceof"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Instanceof]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        match tree.tree().syntax(index) {
            Syntax::Instanceof { operand, target } => {
                vec![type_attr(tree, *operand), tree.attr(*target, RESOLVED)]
            }
            _ => Vec::new(),
        }
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Syntax::Instanceof { operand, target } = tree.tree().syntax(index) else {
            return Ok(());
        };
        let operand_type = type_of(cx, tree, *operand);
        let target = cx
            .value(tree.node(*target), RESOLVED)
            .and_then(Value::as_class)
            .map(Type::Class);

        let message = match (operand_type, target) {
            (Some(op), _) if !op.is_reference() => format!(
                "Operand of 'instanceof' must be a reference, found '{}'",
                describe(cx, Some(op))
            ),
            (_, None) => "Target of 'instanceof' is not a resolved class".to_string(),
            (Some(op), Some(ty)) if cx.context.cast_compatible(op, ty) => {
                return set_type(cx, tree, index, Type::BOOLEAN);
            }
            (op, Some(ty)) => format!(
                "'{}' can never be an instance of '{}'",
                describe(cx, op),
                describe(cx, Some(ty))
            ),
        };
        type_error(cx, tree, index, message);
        Ok(())
    }
}

/// `==` and `!=`.
pub struct EqualRule;

impl Rule<Ast, Value, Resolver> for EqualRule {
    fn name(&self) -> &'static str {
        "equality"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Binary(BinaryOp::Equal), Kind::Binary(BinaryOp::NotEqual)]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);

        let what = match (lt, rt, lu, ru) {
            (.., Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => None,
            (.., Some(Primitive::Boolean), Some(Primitive::Boolean)) => None,
            (Some(Type::Primitive(_)), Some(Type::Primitive(_)), ..) => {
                Some("two numeric or two boolean operands")
            }
            (Some(l), Some(r), ..) if l.is_reference() && r.is_reference() => {
                (!cx.context.cast_compatible(l, r)).then_some("comparable reference operands")
            }
            _ => Some("two primitive or two reference operands"),
        };

        match what {
            None => set_type(cx, tree, index, Type::BOOLEAN),
            Some(what) => {
                binary_error(cx, tree, index, what, (lt, rt));
                Ok(())
            }
        }
    }
}

/// `&`, `^` and `|`, on booleans or integers.
pub struct BitwiseRule;

impl Rule<Ast, Value, Resolver> for BitwiseRule {
    fn name(&self) -> &'static str {
        "bitwise"
    }

    fn domain(&self) -> Vec<Kind> {
        [BinaryOp::BinaryAnd, BinaryOp::Xor, BinaryOp::BinaryOr]
            .map(Kind::Binary)
            .to_vec()
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);
        match (lu, ru) {
            (Some(Primitive::Boolean), Some(Primitive::Boolean)) => {
                set_type(cx, tree, index, Type::BOOLEAN)
            }
            (Some(l), Some(r)) if l.is_integral() && r.is_integral() => {
                set_type(cx, tree, index, Type::Primitive(binary_promotion(l, r)))
            }
            (Some(Primitive::Boolean), _) | (_, Some(Primitive::Boolean)) => {
                binary_error(cx, tree, index, "operands that are both boolean", (lt, rt));
                Ok(())
            }
            _ => {
                binary_error(cx, tree, index, "integral or boolean operands", (lt, rt));
                Ok(())
            }
        }
    }
}

/// `&&` and `||`.
pub struct LogicalRule;

impl Rule<Ast, Value, Resolver> for LogicalRule {
    fn name(&self) -> &'static str {
        "logical"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::Binary(BinaryOp::And), Kind::Binary(BinaryOp::Or)]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        binary_consumed(tree, index)
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![type_attr(tree, index)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let Some((_, left, right)) = binary(tree, index) else {
            return Ok(());
        };
        let (lt, rt, lu, ru) = unboxed_pair(cx, tree, left, right);
        if lu == Some(Primitive::Boolean) && ru == Some(Primitive::Boolean) {
            return set_type(cx, tree, index, Type::BOOLEAN);
        }
        binary_error(cx, tree, index, "boolean operands", (lt, rt));
        Ok(())
    }
}
