use crate::error::Error;
use crate::vm::value::join;
use crate::vm::{ArrayMethod, MathFn, Native, Value, MAX_ARRAY_LENGTH};

impl Native {
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        let value = match self {
            Native::Math(func) => Value::Number(func.apply(args)),
            Native::String => match args.first() {
                Some(v) => Value::string(v.to_js_string()),
                None => Value::string(""),
            },
            Native::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
            Native::Boolean => Value::Bool(arg(0).is_truthy()),
            Native::Error(kind) => match arg(0) {
                Value::Undefined => Value::error(*kind, ""),
                message => Value::error(*kind, message.to_js_string()),
            },
            Native::Array(arr, method) => match method {
                ArrayMethod::Push => {
                    let mut arr = arr.borrow_mut();
                    if arr.len() + args.len() > MAX_ARRAY_LENGTH {
                        return Err(Error::Range("Invalid array length".to_owned()));
                    }
                    arr.extend(args.iter().cloned());
                    Value::Number(arr.len() as f64)
                }
                ArrayMethod::Pop => arr.borrow_mut().pop().unwrap_or_default(),
                ArrayMethod::Includes => {
                    let needle = arg(0);
                    Value::Bool(arr.borrow().iter().any(|v| v.same_value_zero(&needle)))
                }
                ArrayMethod::IndexOf => {
                    let needle = arg(0);
                    let i = arr.borrow().iter().position(|v| v.strict_eq(&needle));
                    Value::Number(i.map_or(-1.0, |i| i as f64))
                }
                ArrayMethod::Join => {
                    let sep = match arg(0) {
                        Value::Undefined => ",".to_owned(),
                        sep => sep.to_js_string(),
                    };
                    Value::string(join(arr, &sep))
                }
            },
        };
        Ok(value)
    }
}

impl MathFn {
    fn apply(self, args: &[Value]) -> f64 {
        let x = args.first().map_or(f64::NAN, Value::to_number);
        match self {
            MathFn::Floor => x.floor(),
            MathFn::Ceil => x.ceil(),
            // JavaScript rounds halves toward positive infinity and keeps the
            // sign of zero.
            MathFn::Round => {
                let floor = x.floor();
                let r = if x - floor >= 0.5 { floor + 1.0 } else { floor };
                if r == 0.0 {
                    r.copysign(x)
                } else {
                    r
                }
            }
            MathFn::Trunc => x.trunc(),
            MathFn::Abs => x.abs(),
            MathFn::Sqrt => x.sqrt(),
            MathFn::Pow => {
                let y = args.get(1).map_or(f64::NAN, Value::to_number);
                x.powf(y)
            }
            MathFn::Min | MathFn::Max => {
                let init = if self == MathFn::Min {
                    f64::INFINITY
                } else {
                    f64::NEG_INFINITY
                };
                args.iter().map(Value::to_number).fold(init, |acc, n| {
                    if acc.is_nan() || n.is_nan() {
                        f64::NAN
                    } else if self == MathFn::Min {
                        acc.min(n)
                    } else {
                        acc.max(n)
                    }
                })
            }
        }
    }
}
