//! A small `expect` style assertion library.
//!
//! Every predicate returns `Result<(), AssertionError>`, so a failed
//! assertion propagates out of a test body with `?` and the runner records
//! the test as failed. No predicate reports failure through a plain `bool`.
//!
//! Values are compared through their [`serde_json::Value`] structure. Any
//! [`Serialize`] type can be asserted on, records included, and two values
//! are equal when their serialized shapes are.
//!
//! ```
//! use synctest::expect::expect;
//!
//! # fn main() -> Result<(), synctest::expect::AssertionError> {
//! expect(vec![1, 2, 3]).to_equal([1, 2, 3])?;
//! expect(Some("id")).to_be_defined()?;
//! expect(None::<u32>).to_be_falsy()?;
//! # Ok(())
//! # }
//! ```

use std::{collections::BTreeSet, future::Future};

use serde::Serialize;
use serde_json::{Number, Value};

const ROOT: &str = "value";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum AssertionError {
    #[error("expected {path} to equal {expected}, got {actual}")]
    NotEqual {
        path: String,
        expected: Value,
        actual: Value,
    },

    #[error("expected {path} to have length {expected}, got {actual}")]
    LengthMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected {path} to have keys {expected:?}, got {actual:?}")]
    KeysMismatch {
        path: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("expected value to be defined")]
    Undefined,

    #[error("expected {actual} to be falsy")]
    NotFalsy { actual: Value },

    #[error("expected {actual} to be truthy")]
    NotTruthy { actual: Value },

    #[error("expected {actual} to be greater than or equal to {expected}")]
    NotGreaterOrEqual { actual: Value, expected: Value },

    #[error("expected an error")]
    DidNotThrow,

    #[error("could not serialize value: {0}")]
    Serialize(String),
}

/// Wrap a value for assertions.
pub fn expect<T>(value: T) -> Expect<T> {
    Expect(value)
}

#[derive(Debug, Clone)]
pub struct Expect<T>(T);

impl<T: Serialize> Expect<T> {
    /// Recursive structural equality.
    ///
    /// Sequences compare by length first, then element by element. Mappings
    /// compare their key sets first, then every value. Everything else
    /// compares as a primitive, numbers by numeric value.
    pub fn to_equal(&self, expected: impl Serialize) -> Result<(), AssertionError> {
        compare(&mut ROOT.to_string(), &to_value(&self.0)?, &to_value(&expected)?)
    }

    /// Same as [`to_equal`](Self::to_equal), reads better for primitives.
    pub fn to_be(&self, expected: impl Serialize) -> Result<(), AssertionError> {
        self.to_equal(expected)
    }

    /// Fails for values that serialize to `null`, like `None`.
    pub fn to_be_defined(&self) -> Result<(), AssertionError> {
        match to_value(&self.0)? {
            Value::Null => Err(AssertionError::Undefined),
            _ => Ok(()),
        }
    }

    /// Passes for `null`, `false`, zero and the empty string.
    pub fn to_be_falsy(&self) -> Result<(), AssertionError> {
        let actual = to_value(&self.0)?;
        match is_truthy(&actual) {
            false => Ok(()),
            true => Err(AssertionError::NotFalsy { actual }),
        }
    }

    pub fn to_be_truthy(&self) -> Result<(), AssertionError> {
        let actual = to_value(&self.0)?;
        match is_truthy(&actual) {
            true => Ok(()),
            false => Err(AssertionError::NotTruthy { actual }),
        }
    }

    /// Numeric comparison for numbers, lexicographic for strings.
    pub fn to_be_greater_than_or_equal(&self, expected: impl Serialize) -> Result<(), AssertionError> {
        let actual = to_value(&self.0)?;
        let expected = to_value(&expected)?;
        let ge = match (&actual, &expected) {
            (Value::Number(a), Value::Number(e)) => {
                matches!((a.as_f64(), e.as_f64()), (Some(a), Some(e)) if a >= e)
            }
            (Value::String(a), Value::String(e)) => a >= e,
            _ => false,
        };
        match ge {
            true => Ok(()),
            false => Err(AssertionError::NotGreaterOrEqual { actual, expected }),
        }
    }

    /// Length of a sequence, or the number of characters of a string.
    pub fn to_have_length(&self, expected: usize) -> Result<(), AssertionError> {
        let actual = match to_value(&self.0)? {
            Value::Array(items) => items.len(),
            Value::String(s) => s.chars().count(),
            other => {
                return Err(AssertionError::NotEqual {
                    path: format!("{ROOT}.length"),
                    expected: Value::from(expected),
                    actual: other,
                });
            }
        };
        match actual == expected {
            true => Ok(()),
            false => Err(AssertionError::LengthMismatch {
                path: ROOT.to_string(),
                expected,
                actual,
            }),
        }
    }
}

impl<F, Fut, T, E> Expect<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Assert on the failure of an async closure, see [`Rejects::to_throw`].
    pub fn rejects(self) -> Rejects<F> {
        Rejects(self.0)
    }
}

#[derive(Debug)]
pub struct Rejects<F>(F);

impl<F, Fut, T, E> Rejects<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Await the closure, pass if it resolved to an error.
    pub async fn to_throw(self) -> Result<(), AssertionError> {
        match (self.0)().await {
            Ok(_) => Err(AssertionError::DidNotThrow),
            Err(_) => Ok(()),
        }
    }
}

fn to_value(value: &impl Serialize) -> Result<Value, AssertionError> {
    serde_json::to_value(value).map_err(|err| AssertionError::Serialize(err.to_string()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn compare(path: &mut String, actual: &Value, expected: &Value) -> Result<(), AssertionError> {
    match (actual, expected) {
        (Value::Array(actual), Value::Array(expected)) => {
            if actual.len() != expected.len() {
                return Err(AssertionError::LengthMismatch {
                    path: path.clone(),
                    expected: expected.len(),
                    actual: actual.len(),
                });
            }
            for (idx, (actual, expected)) in actual.iter().zip(expected).enumerate() {
                nested(path, &format!("[{idx}]"), |path| compare(path, actual, expected))?;
            }
            Ok(())
        }
        (Value::Object(actual), Value::Object(expected)) => {
            let actual_keys: BTreeSet<_> = actual.keys().collect();
            let expected_keys: BTreeSet<_> = expected.keys().collect();
            if actual_keys != expected_keys {
                return Err(AssertionError::KeysMismatch {
                    path: path.clone(),
                    expected: expected_keys.into_iter().cloned().collect(),
                    actual: actual_keys.into_iter().cloned().collect(),
                });
            }
            for (key, expected) in expected {
                nested(path, &format!(".{key}"), |path| {
                    compare(path, &actual[key.as_str()], expected)
                })?;
            }
            Ok(())
        }
        (Value::Number(a), Value::Number(e)) if numbers_equal(a, e) => Ok(()),
        (actual, expected) if actual == expected => Ok(()),
        (actual, expected) => Err(AssertionError::NotEqual {
            path: path.clone(),
            expected: expected.clone(),
            actual: actual.clone(),
        }),
    }
}

/// Integers compare exactly, floats only when either side is one.
fn numbers_equal(a: &Number, e: &Number) -> bool {
    if a.is_f64() || e.is_f64() {
        return a.as_f64() == e.as_f64();
    }
    match (a.as_i64(), e.as_i64()) {
        (Some(a), Some(e)) => a == e,
        _ => a.as_u64().is_some() && a.as_u64() == e.as_u64(),
    }
}

fn nested<R>(path: &mut String, segment: &str, f: impl FnOnce(&mut String) -> R) -> R {
    let len = path.len();
    path.push_str(segment);
    let res = f(path);
    path.truncate(len);
    res
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Post {
        post_id: String,
        title: String,
        tags: Vec<&'static str>,
    }

    fn post() -> Post {
        Post {
            post_id: "p1".into(),
            title: "hello".into(),
            tags: vec!["a", "b"],
        }
    }

    #[test]
    fn identical_copies_are_equal() {
        let original = post();
        expect(&original).to_equal(original.clone()).unwrap();
    }

    #[test]
    fn mutated_field_fails_with_path() {
        let mut changed = post();
        changed.tags[1] = "c";

        let err = expect(post()).to_equal(&changed).unwrap_err();
        assert_eq!(
            err,
            AssertionError::NotEqual {
                path: "value.tags[1]".into(),
                expected: json!("c"),
                actual: json!("b"),
            }
        );
        assert_eq!(err.to_string(), r#"expected value.tags[1] to equal "c", got "b""#);
    }

    #[test]
    fn sequences_compare_length_first() {
        let err = expect(vec![1, 2]).to_equal([1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            AssertionError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
        expect(Vec::<u8>::new()).to_equal(Vec::<u8>::new()).unwrap();
    }

    #[test]
    fn mappings_compare_key_sets() {
        let err = expect(json!({"a": 1, "b": 2}))
            .to_equal(json!({"a": 1, "c": 2}))
            .unwrap_err();
        assert!(matches!(err, AssertionError::KeysMismatch { .. }));
    }

    #[test]
    fn numbers_compare_by_value() {
        expect(1).to_equal(1.0).unwrap();
        assert!(expect(1).to_equal("1").is_err());
    }

    #[test]
    fn large_integers_compare_exactly() {
        assert!(
            expect(9_007_199_254_740_993u64)
                .to_equal(9_007_199_254_740_992u64)
                .is_err()
        );
        assert!(expect(i64::MIN + 1).to_equal(i64::MIN).is_err());
        expect(u64::MAX).to_equal(u64::MAX).unwrap();
        assert!(expect(-1).to_equal(u64::MAX).is_err());
    }

    #[test]
    fn definedness_and_falsiness() {
        expect(Some(1)).to_be_defined().unwrap();
        assert_eq!(expect(None::<u8>).to_be_defined(), Err(AssertionError::Undefined));

        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            expect(&falsy).to_be_falsy().unwrap();
        }
        for truthy in [json!([]), json!({}), json!("x"), json!(-1)] {
            expect(&truthy).to_be_truthy().unwrap();
            assert!(expect(&truthy).to_be_falsy().is_err());
        }
    }

    #[test]
    fn ordering_and_length() {
        expect(3).to_be_greater_than_or_equal(1).unwrap();
        expect(1).to_be_greater_than_or_equal(1).unwrap();
        assert!(expect(0).to_be_greater_than_or_equal(1).is_err());

        expect(["a", "b"]).to_have_length(2).unwrap();
        assert!(expect("abc").to_have_length(2).is_err());
    }

    #[tokio::test]
    async fn rejects_requires_an_error() {
        expect(|| async { Err::<(), _>("nope") })
            .rejects()
            .to_throw()
            .await
            .unwrap();

        let res = expect(|| async { Ok::<_, ()>(1) }).rejects().to_throw().await;
        assert_eq!(res, Err(AssertionError::DidNotThrow));
    }
}
