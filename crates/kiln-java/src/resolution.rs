//! Rules declaring source classes and resolving type references.

use crate::ast::{Ast, ClassDecl, Kind, Syntax};
use crate::resolver::{ClassLookup, OBJECT, Resolver};
use crate::scope::{ClassInfo, ClassKind, JavaType};
use crate::typing::JavaCx;
use crate::types::Value;
use kiln_core::{Attribute, Diagnostic, Result};
use kiln_reactor::{Lookup, Rule, RuleSet, TreeBinding};

/// Attribute holding the class scope a declaration defines.
pub const SCOPE: &str = "scope";

/// Attribute holding the class a type reference resolves to.
pub const RESOLVED: &str = "resolved";

/// The declaration and resolution rules.
pub fn rules() -> RuleSet<Ast, Value, Resolver> {
    RuleSet::new("resolution").with(DeclareRule).with(ResolveRule)
}

fn default_super_type(kind: ClassKind) -> Option<&'static str> {
    match kind {
        ClassKind::Class => Some(OBJECT),
        ClassKind::Enum => Some("java.lang.Enum"),
        ClassKind::Interface | ClassKind::Annotation => None,
    }
}

/// Creates the class scope of a declaration. Nested declarations wait for
/// the scope of their outer class.
pub struct DeclareRule;

impl Rule<Ast, Value, Resolver> for DeclareRule {
    fn name(&self) -> &'static str {
        "declare"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::ClassDecl]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        tree.tree()
            .enclosing_class(index)
            .map(|outer| tree.attr(outer, SCOPE))
            .into_iter()
            .collect()
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![tree.attr(index, SCOPE)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let ast = tree.tree();
        let Syntax::ClassDecl(decl) = ast.syntax(index) else {
            return Ok(());
        };
        let outer = ast
            .enclosing_class(index)
            .and_then(|outer| cx.value(tree.node(outer), SCOPE))
            .and_then(Value::as_class);

        let canonical_name = match outer {
            Some(outer) => format!("{}${}", cx.context.class(outer).canonical_name(), decl.name),
            None => ast
                .package_of(index)
                .iter()
                .chain(std::iter::once(&decl.name))
                .cloned()
                .collect::<Vec<_>>()
                .join("."),
        };
        let info = class_info(canonical_name, decl);
        let id = cx.context.declare_source_class(cx.reactor, info, outer);
        cx.set(tree.attr(index, SCOPE), Value::Class(id))
    }
}

fn class_info(canonical_name: String, decl: &ClassDecl) -> ClassInfo {
    let mut info = ClassInfo::new(canonical_name, decl.kind);
    info.super_type = default_super_type(decl.kind).map(str::to_string);
    info.fields = decl.fields.clone();
    info.methods = decl.methods.clone();
    info.type_params = decl.type_params.clone();
    info
}

/// Resolves a type reference as seen from the class it appears in.
///
/// Every class declared in the same top-level class is declared first, so
/// that member classes can be referred to before their declaration. A
/// reference whose class is not known yet is re-run once it is.
pub struct ResolveRule;

impl Rule<Ast, Value, Resolver> for ResolveRule {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn domain(&self) -> Vec<Kind> {
        vec![Kind::ClassType]
    }

    fn consumed(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        let ast = tree.tree();
        let Some(top) = ast.top_level_class(index) else {
            return Vec::new();
        };
        ast.descendants(top)
            .into_iter()
            .filter(|&i| matches!(ast.syntax(i), Syntax::ClassDecl(_)))
            .map(|i| tree.attr(i, SCOPE))
            .collect()
    }

    fn provided(&self, tree: &TreeBinding<Ast>, index: usize) -> Vec<Attribute> {
        vec![tree.attr(index, RESOLVED)]
    }

    fn compute(&self, cx: &mut JavaCx<'_>, tree: &TreeBinding<Ast>, index: usize) -> Result<()> {
        let ast = tree.tree();
        let Syntax::ClassType { chain } = ast.syntax(index) else {
            return Ok(());
        };
        let decl = ast.enclosing_class(index);
        let scope = decl
            .and_then(|decl| cx.value(tree.node(decl), SCOPE))
            .and_then(Value::as_class);

        let lookup = match scope {
            Some(scope) => cx.context.klass_chain(cx.reactor, scope, chain),
            None => cx.context.full_chain(cx.reactor, chain),
        };

        let resolved = tree.attr(index, RESOLVED);
        match lookup {
            ClassLookup::Found(id) => {
                cx.set(resolved, Value::Class(id))?;
                let extends = decl.is_some_and(|decl| {
                    matches!(ast.syntax(decl), Syntax::ClassDecl(d) if d.super_type == Some(index))
                });
                if let (true, Some(scope)) = (extends, scope) {
                    cx.context.set_super_type(scope, id);
                }
            }
            ClassLookup::NotFound => {
                // Watchers may re-run this reaction without a new answer.
                let first = matches!(cx.get(resolved.node, RESOLVED), Lookup::Absent);
                cx.set_none(resolved)?;
                if first {
                    cx.report(Diagnostic::UnresolvedClass {
                        node: tree.node(index),
                        name: chain.join("."),
                    });
                }
            }
            ClassLookup::Pending => {}
        }
        Ok(())
    }
}
