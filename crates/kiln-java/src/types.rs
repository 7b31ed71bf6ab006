//! Java types and attribute values.

use crate::scope::ClassId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != Primitive::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Char | Primitive::Int | Primitive::Long
        )
    }

    /// Canonical name of the wrapper class boxing this primitive.
    pub fn boxed(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Char => "java.lang.Character",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }

    /// The primitive a wrapper class unboxes to.
    pub fn unboxing(canonical_name: &str) -> Option<Self> {
        const ALL: [Primitive; 8] = [
            Primitive::Boolean,
            Primitive::Byte,
            Primitive::Short,
            Primitive::Char,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ];
        ALL.into_iter().find(|p| p.boxed() == canonical_name)
    }
}

/// Unary numeric promotion (JLS 5.6.1).
pub fn unary_promotion(p: Primitive) -> Primitive {
    match p {
        Primitive::Byte | Primitive::Short | Primitive::Char => Primitive::Int,
        other => other,
    }
}

/// Binary numeric promotion (JLS 5.6.2).
pub fn binary_promotion(a: Primitive, b: Primitive) -> Primitive {
    if a == Primitive::Double || b == Primitive::Double {
        Primitive::Double
    } else if a == Primitive::Float || b == Primitive::Float {
        Primitive::Float
    } else if a == Primitive::Long || b == Primitive::Long {
        Primitive::Long
    } else {
        Primitive::Int
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    /// The type of the `null` literal.
    Null,
    /// `java.lang.String`, which the typing rules treat specially.
    String,
    Class(ClassId),
}

impl Type {
    pub const BOOLEAN: Type = Type::Primitive(Primitive::Boolean);
    pub const INT: Type = Type::Primitive(Primitive::Int);

    pub fn primitive(self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_reference(self) -> bool {
        !matches!(self, Type::Primitive(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Null => f.write_str("null"),
            Type::String => f.write_str("String"),
            Type::Class(id) => write!(f, "{id}"),
        }
    }
}

/// Value of an attribute in the Java attribute graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// The `type` of an expression.
    Type(Type),
    /// A class: the `scope` of a declaration, the `resolved` class of a
    /// type reference, or a loaded class.
    Class(ClassId),
}

impl Value {
    pub fn as_type(&self) -> Option<Type> {
        match self {
            Value::Type(ty) => Some(*ty),
            Value::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Value::Class(id) => Some(*id),
            Value::Type(_) => None,
        }
    }
}
