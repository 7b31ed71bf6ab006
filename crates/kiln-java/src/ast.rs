//! Syntax tree consumed by the Java rules.
//!
//! The tree is produced by an external parser; this module only defines its
//! shape and a builder. Nodes live in an arena and refer to their children by
//! index. Children must be pushed before their parent.

use kiln_reactor::Tree;

use crate::scope::ClassKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Complement,
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Complement => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Product,
    Division,
    Remainder,
    Sum,
    Diff,
    ShiftLeft,
    ShiftRight,
    BinaryShiftRight,
    Greater,
    GreaterEqual,
    Lower,
    LowerEqual,
    Equal,
    NotEqual,
    BinaryAnd,
    Xor,
    BinaryOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Product => "*",
            BinaryOp::Division => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Sum => "+",
            BinaryOp::Diff => "-",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BinaryShiftRight => ">>>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Lower => "<",
            BinaryOp::LowerEqual => "<=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::BinaryAnd => "&",
            BinaryOp::Xor => "^",
            BinaryOp::BinaryOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// A class, interface, enum or annotation declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    /// A `ClassType` node.
    pub super_type: Option<usize>,
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub type_params: Vec<String>,
    /// Nested declarations and member expressions.
    pub members: Vec<usize>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            super_type: None,
            fields: Vec::new(),
            methods: Vec::new(),
            type_params: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Literal(Literal),
    Unary {
        op: UnaryOp,
        operand: usize,
    },
    Binary {
        op: BinaryOp,
        left: usize,
        right: usize,
    },
    Instanceof {
        operand: usize,
        /// A `ClassType` node.
        target: usize,
    },
    /// A reference to a class by a dotted chain of identifiers, as written.
    ClassType {
        chain: Vec<String>,
    },
    ClassDecl(ClassDecl),
    CompilationUnit {
        package: Vec<String>,
        types: Vec<usize>,
    },
}

impl Syntax {
    pub fn kind(&self) -> Kind {
        match self {
            Syntax::Literal(_) => Kind::Literal,
            Syntax::Unary { op, .. } => Kind::Unary(*op),
            Syntax::Binary { op, .. } => Kind::Binary(*op),
            Syntax::Instanceof { .. } => Kind::Instanceof,
            Syntax::ClassType { .. } => Kind::ClassType,
            Syntax::ClassDecl(_) => Kind::ClassDecl,
            Syntax::CompilationUnit { .. } => Kind::CompilationUnit,
        }
    }

    pub fn children(&self) -> Vec<usize> {
        match self {
            Syntax::Literal(_) | Syntax::ClassType { .. } => Vec::new(),
            Syntax::Unary { operand, .. } => vec![*operand],
            Syntax::Binary { left, right, .. } => vec![*left, *right],
            Syntax::Instanceof { operand, target } => vec![*operand, *target],
            Syntax::ClassDecl(decl) => decl.super_type.iter().chain(&decl.members).copied().collect(),
            Syntax::CompilationUnit { types, .. } => types.clone(),
        }
    }
}

/// Variant tag of a syntax node; rule domains are lists of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Literal,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Instanceof,
    ClassType,
    ClassDecl,
    CompilationUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub syntax: Syntax,
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<SyntaxNode>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and adopts its children.
    ///
    /// # Panics
    /// Panics if a child index does not refer to an existing node.
    pub fn push(&mut self, syntax: Syntax) -> usize {
        let index = self.nodes.len();
        for child in syntax.children() {
            self.nodes[child].parent = Some(index);
        }
        self.nodes.push(SyntaxNode {
            syntax,
            parent: None,
        });
        index
    }

    pub fn literal(&mut self, literal: Literal) -> usize {
        self.push(Syntax::Literal(literal))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: usize) -> usize {
        self.push(Syntax::Unary { op, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, left: usize, right: usize) -> usize {
        self.push(Syntax::Binary { op, left, right })
    }

    pub fn instanceof(&mut self, operand: usize, target: usize) -> usize {
        self.push(Syntax::Instanceof { operand, target })
    }

    pub fn class_type<S: Into<String>>(&mut self, chain: impl IntoIterator<Item = S>) -> usize {
        self.push(Syntax::ClassType {
            chain: chain.into_iter().map(Into::into).collect(),
        })
    }

    pub fn class_decl(&mut self, decl: ClassDecl) -> usize {
        self.push(Syntax::ClassDecl(decl))
    }

    pub fn compilation_unit<S: Into<String>>(
        &mut self,
        package: impl IntoIterator<Item = S>,
        types: Vec<usize>,
    ) -> usize {
        self.push(Syntax::CompilationUnit {
            package: package.into_iter().map(Into::into).collect(),
            types,
        })
    }

    pub fn get(&self, index: usize) -> &SyntaxNode {
        &self.nodes[index]
    }

    pub fn syntax(&self, index: usize) -> &Syntax {
        &self.nodes[index].syntax
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes[index].parent
    }

    /// Strict ancestors of a node, innermost first.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parent(index), |&i| self.parent(i))
    }

    /// The closest class declaration strictly enclosing `index`.
    pub fn enclosing_class(&self, index: usize) -> Option<usize> {
        self.ancestors(index)
            .find(|&i| matches!(self.syntax(i), Syntax::ClassDecl(_)))
    }

    /// The outermost class declaration enclosing `index`, or `index` itself
    /// if it is a top-level one.
    pub fn top_level_class(&self, index: usize) -> Option<usize> {
        std::iter::once(index)
            .chain(self.ancestors(index))
            .filter(|&i| matches!(self.syntax(i), Syntax::ClassDecl(_)))
            .last()
    }

    /// `index` and every node below it, parents before children.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.syntax(i).children().into_iter().rev());
        }
        out
    }

    /// Package of the compilation unit containing `index`, empty if none.
    pub fn package_of(&self, index: usize) -> &[String] {
        std::iter::once(index)
            .chain(self.ancestors(index))
            .find_map(|i| match self.syntax(i) {
                Syntax::CompilationUnit { package, .. } => Some(package.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

impl Tree for Ast {
    type Kind = Kind;

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn kind(&self, index: usize) -> Kind {
        self.nodes[index].syntax.kind()
    }
}
