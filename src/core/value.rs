//! Runtime values and error kinds for the subject language.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A runtime value produced by executing subject-language code.
///
/// Test-case arguments and expected outputs deserialize directly into this
/// type, so the JSON corpus format maps onto it one-to-one (`null`, booleans,
/// integers, floats, strings, arrays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value (`none`).
    None,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Immutable string.
    Str(String),
    /// List of values.
    List(Vec<Value>),
}

impl Value {
    /// Truthiness: `none`, `false`, `0`, `0.0`, `""` and `[]` are falsy,
    /// everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Semantic equality: ints and floats compare numerically, lists
    /// element-wise, everything else structurally.
    pub fn eq_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_value(y))
            }
            (a, b) => a == b,
        }
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Classification of a raised runtime error.
///
/// A closed set so that `Raised` outcomes can be compared structurally when
/// checking behavioral equivalence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Division or remainder by zero.
    DivisionByZero,
    /// Integer arithmetic overflowed.
    IntegerOverflow,
    /// Operation applied to incompatible types.
    TypeError,
    /// Reference to a name with no binding.
    NameError,
    /// Index outside the bounds of a string or list.
    IndexError,
    /// Call with the wrong number of arguments.
    ArityError,
    /// Operation applied to a right-typed but unusable value, e.g. `min([])`.
    ValueError,
    /// Self-recursion exceeded the depth cap.
    RecursionLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::IntegerOverflow => "integer overflow",
            ErrorKind::TypeError => "type error",
            ErrorKind::NameError => "name error",
            ErrorKind::IndexError => "index error",
            ErrorKind::ArityError => "arity error",
            ErrorKind::ValueError => "value error",
            ErrorKind::RecursionLimit => "recursion limit",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Float(0.0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(!Value::List(vec![]).truthy());

        assert!(Value::Bool(true).truthy());
        assert!(Value::Int(-3).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(Value::List(vec![Value::None]).truthy());
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert!(Value::Int(2).eq_value(&Value::Float(2.0)));
        assert!(!Value::Int(2).eq_value(&Value::Float(2.5)));
        // Structural equality stays strict.
        assert_ne!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn test_list_equality_elementwise() {
        let a = Value::List(vec![Value::Int(1), Value::Float(2.0)]);
        let b = Value::List(vec![Value::Float(1.0), Value::Int(2)]);
        assert!(a.eq_value(&b));
        let c = Value::List(vec![Value::Int(1)]);
        assert!(!a.eq_value(&c));
    }

    #[test]
    fn test_value_json_roundtrip() {
        let v: Value = serde_json::from_str("[1, 2.5, \"x\", true, null]").unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Str("x".into()),
                Value::Bool(true),
                Value::None,
            ])
        );
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[1,2.5,\"x\",true,null]");
    }

    #[test]
    fn test_error_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::DivisionByZero).unwrap(),
            "\"division_by_zero\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::TypeError).unwrap(),
            "\"type_error\""
        );
    }
}
