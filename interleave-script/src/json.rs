//! Canonical serialization of snippet results.
//!
//! The format is JSON as produced by `JSON.stringify`, with two deliberate
//! differences so that distinct results never collapse into the same string:
//!
//! - `undefined`, `NaN`, `Infinity`, and `-Infinity` are written as those bare
//!   words, both at the top level and nested, instead of being dropped or
//!   written as `null`. Native functions are written as `function`, and
//!   errors as their kind applied to the quoted message, e.g.
//!   `TypeError("bad")`.
//! - Object keys keep their insertion order, so `{a: 1, b: 2}` and
//!   `{b: 2, a: 1}` are different outcomes.
//!
//! Values nested deeper than [`MAX_NESTING`] are refused with a RangeError.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Error;
use crate::MAX_NESTING;
use crate::number::format_number;
use crate::vm::Value;

impl Value {
    pub fn to_json(&self) -> Result<String, Error> {
        let mut out = String::new();
        Serializer::default().write(self, &mut out)?;
        Ok(out)
    }
}

#[derive(Debug, Default)]
struct Serializer {
    /// Arrays and objects currently being written.
    stack: Vec<*const ()>,
}

impl Serializer {
    fn write(&mut self, value: &Value, out: &mut String) -> Result<(), Error> {
        match value {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::String(s) => write_string(s, out)?,
            Value::Array(arr) => {
                self.enter(arr)?;
                out.push('[');
                for (i, item) in arr.borrow().iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    self.write(item, out)?;
                }
                out.push(']');
                self.stack.pop();
            }
            Value::Object(obj) => {
                self.enter(obj)?;
                out.push('{');
                for (i, (key, item)) in obj.borrow().iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    write_string(key, out)?;
                    out.push(':');
                    self.write(item, out)?;
                }
                out.push('}');
                self.stack.pop();
            }
            Value::Native(_) => out.push_str("function"),
            Value::Error(err) => {
                out.push_str(&err.kind.to_string());
                out.push('(');
                write_string(&err.message, out)?;
                out.push(')');
            }
        }
        Ok(())
    }

    fn enter<T>(&mut self, cell: &Rc<RefCell<T>>) -> Result<(), Error> {
        let ptr = Rc::as_ptr(cell).cast::<()>();
        if self.stack.contains(&ptr) {
            return Err(Error::Type(
                "Converting circular structure to JSON".to_owned(),
            ));
        }
        if self.stack.len() >= MAX_NESTING {
            return Err(Error::too_deep());
        }
        self.stack.push(ptr);
        Ok(())
    }
}

fn write_string(s: &str, out: &mut String) -> Result<(), Error> {
    let quoted = serde_json::to_string(s).map_err(|err| Error::Type(err.to_string()))?;
    out.push_str(&quoted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(Value::Number(4.0).to_json().unwrap(), "4");
        assert_eq!(Value::Number(-0.5).to_json().unwrap(), "-0.5");
        assert_eq!(Value::from("a\"b\n").to_json().unwrap(), r#""a\"b\n""#);
        assert_eq!(Value::Null.to_json().unwrap(), "null");
        assert_eq!(Value::Bool(true).to_json().unwrap(), "true");
    }

    #[test]
    fn sentinels_are_distinct() {
        let outcomes = [
            Value::Undefined,
            Value::Null,
            Value::Number(f64::NAN),
            Value::from("NaN"),
            Value::Number(f64::INFINITY),
            Value::Number(f64::NEG_INFINITY),
        ]
        .iter()
        .map(|v| v.to_json().unwrap())
        .collect::<Vec<_>>();
        assert_eq!(
            outcomes,
            ["undefined", "null", "NaN", "\"NaN\"", "Infinity", "-Infinity"],
        );
        let nested = Value::array(vec![Value::Undefined, Value::Number(f64::NAN)]);
        assert_eq!(nested.to_json().unwrap(), "[undefined,NaN]");
    }

    #[test]
    fn insertion_order() {
        let mut props = IndexMap::new();
        props.insert("b".into(), Value::Number(2.0));
        props.insert("a".into(), Value::array(vec![Value::Number(1.0)]));
        assert_eq!(Value::object(props).to_json().unwrap(), r#"{"b":2,"a":[1]}"#);
    }

    #[test]
    fn cycle() {
        let arr = Value::array(Vec::new());
        if let Value::Array(inner) = &arr {
            inner.borrow_mut().push(arr.clone());
        }
        assert_eq!(
            arr.to_json(),
            Err(Error::Type("Converting circular structure to JSON".to_owned())),
        );
    }

    #[test]
    fn nesting_limit() {
        let nest = |depth: usize| {
            (0..depth).fold(Value::Null, |inner, _| Value::array(vec![inner]))
        };
        let at_limit = nest(MAX_NESTING).to_json().unwrap();
        assert!(at_limit.starts_with("[[[") && at_limit.ends_with("null]]]"));
        assert_eq!(nest(MAX_NESTING + 1).to_json(), Err(Error::too_deep()));
        assert_eq!(nest(100_000).to_json(), Err(Error::too_deep()));
    }

    #[test]
    fn errors() {
        use crate::vm::ErrorKind;
        let outcomes = [
            Value::error(ErrorKind::Error, "boom"),
            Value::error(ErrorKind::RangeError, ""),
            Value::array(vec![Value::error(ErrorKind::TypeError, "a\"b")]),
        ]
        .iter()
        .map(|v| v.to_json().unwrap())
        .collect::<Vec<_>>();
        assert_eq!(
            outcomes,
            [r#"Error("boom")"#, r#"RangeError("")"#, r#"[TypeError("a\"b")]"#],
        );
    }

    #[test]
    fn shared_but_acyclic() {
        let shared = Value::array(vec![Value::Number(1.0)]);
        let outer = Value::array(vec![shared.clone(), shared]);
        assert_eq!(outer.to_json().unwrap(), "[[1],[1]]");
    }
}
