//! Test-case corpus types.

use serde::{Deserialize, Serialize};

use super::Value;

/// One input tuple for the function under test, consumed from an external
/// corpus. The engine borrows test cases; it never generates or owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Ordered argument values, matched positionally to the function's
    /// parameter list.
    pub args: Vec<Value>,
    /// Expected output, when the corpus provides one. The mutation engine
    /// itself does not consult it; it is carried for downstream consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl TestCase {
    /// Create a test case from argument values.
    pub fn new(args: Vec<Value>) -> Self {
        Self {
            args,
            expected: None,
        }
    }

    /// Attach an expected output.
    pub fn with_expected(mut self, expected: Value) -> Self {
        self.expected = Some(expected);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_json_shape() {
        let tc: TestCase = serde_json::from_str(r#"{"args": [2, 3], "expected": 5}"#).unwrap();
        assert_eq!(tc.args, vec![Value::Int(2), Value::Int(3)]);
        assert_eq!(tc.expected, Some(Value::Int(5)));

        let tc: TestCase = serde_json::from_str(r#"{"args": [[1, 2]]}"#).unwrap();
        assert_eq!(tc.args.len(), 1);
        assert!(tc.expected.is_none());
        // `expected` is omitted on the wire when absent.
        let json = serde_json::to_string(&tc).unwrap();
        assert_eq!(json, r#"{"args":[[1,2]]}"#);
    }
}
