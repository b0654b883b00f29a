//! Typed property values produced by coercion

use std::fmt;

/// A member of an enumeration known to the object system
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Name of the enumeration type, e.g. `Orientation`
    pub enum_name: String,
    /// Canonical member name, e.g. `VERTICAL`
    pub member: String,
    /// Numeric value of the member
    pub value: i64,
}

impl EnumValue {
    pub fn new(enum_name: impl Into<String>, member: impl Into<String>, value: i64) -> Self {
        Self {
            enum_name: enum_name.into(),
            member: member.into(),
            value,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.enum_name, self.member)
    }
}

/// A value that needs no live object to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(String),
    Enum(EnumValue),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Enum(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<EnumValue> for Literal {
    fn from(e: EnumValue) -> Self {
        Literal::Enum(e)
    }
}

/// A coerced property value: a literal, or a reference to another object
/// of the same instantiation
#[derive(Debug, Clone, PartialEq)]
pub enum Value<O> {
    Literal(Literal),
    Object(O),
}

impl<O> Value<O> {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(l) => Some(l),
            Value::Object(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_literal()? {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.as_literal()? {
            Literal::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_literal()? {
            Literal::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self.as_literal()? {
            Literal::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&O> {
        match self {
            Value::Object(o) => Some(o),
            Value::Literal(_) => None,
        }
    }
}

impl<O> From<Literal> for Value<O> {
    fn from(l: Literal) -> Self {
        Value::Literal(l)
    }
}
