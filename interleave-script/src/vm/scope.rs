use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::DeclKind;
use crate::error::Error;
use crate::vm::{ErrorKind, MathFn, Native, Value};

#[derive(Clone, Debug)]
struct Binding {
    value: Value,
    mutable: bool,
}

/// Lexical environment: a stack of block frames over a frame of globals.
///
/// A scope is built fresh for every run, so nothing a snippet binds or mutates
/// can be observed by a later run.
#[derive(Clone, Debug)]
pub struct Scope {
    frames: Vec<HashMap<Rc<str>, Binding>>,
}

impl Scope {
    pub fn new() -> Self {
        let mut globals = HashMap::new();
        let mut define = |name: &str, value: Value| {
            globals.insert(
                name.into(),
                Binding {
                    value,
                    mutable: false,
                },
            );
        };
        define("NaN", Value::Number(f64::NAN));
        define("Infinity", Value::Number(f64::INFINITY));
        define("String", Value::Native(Native::String));
        define("Number", Value::Native(Native::Number));
        define("Boolean", Value::Native(Native::Boolean));
        define("Math", math());
        for kind in [
            ErrorKind::Error,
            ErrorKind::TypeError,
            ErrorKind::RangeError,
            ErrorKind::ReferenceError,
        ] {
            define(&kind.to_string(), Value::Native(Native::Error(kind)));
        }
        Scope {
            frames: vec![globals, HashMap::new()],
        }
    }

    #[inline]
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    #[inline]
    pub fn pop(&mut self) {
        // The globals and top-level frames are never popped.
        if self.frames.len() > 2 {
            self.frames.pop();
        }
    }

    pub fn declare(&mut self, kind: DeclKind, name: &Rc<str>, value: Value) {
        let binding = Binding {
            value,
            mutable: kind != DeclKind::Const,
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.clone(), binding);
        }
    }

    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .map(|binding| binding.value.clone())
            .ok_or_else(|| Error::not_defined(name))
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let binding = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
            .ok_or_else(|| Error::not_defined(name))?;
        if !binding.mutable {
            return Err(Error::Type("Assignment to constant variable.".to_owned()));
        }
        binding.value = value;
        Ok(())
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

fn math() -> Value {
    let funcs = [
        MathFn::Floor,
        MathFn::Ceil,
        MathFn::Round,
        MathFn::Trunc,
        MathFn::Abs,
        MathFn::Min,
        MathFn::Max,
        MathFn::Sqrt,
        MathFn::Pow,
    ];
    let props = funcs
        .into_iter()
        .map(|func| (func.to_string().into(), Value::Native(Native::Math(func))))
        .collect::<IndexMap<_, _>>();
    Value::object(props)
}
