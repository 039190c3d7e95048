use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::ast::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::error::Error;
use crate::vm::value::compare_strings;
use crate::vm::{ArrayMethod, Native, Scope, Value};

/// Completion of a statement.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
}

/// Resolved assignment target.
#[derive(Debug)]
enum Place {
    Binding(Rc<str>),
    Property(Value, Rc<str>),
    Index(Value, Value),
}

/// Tree-walking evaluator for one run of a program.
#[derive(Debug)]
pub struct Interp {
    scope: Scope,
    steps: u64,
    max_steps: Option<u64>,
}

impl Interp {
    #[inline]
    pub fn new(max_steps: Option<u64>) -> Self {
        Interp {
            scope: Scope::new(),
            steps: 0,
            max_steps,
        }
    }

    /// Runs the program to completion and returns the value of the first
    /// executed `return`, or `undefined`.
    pub fn run(mut self, prog: &Program) -> Result<Value, Error> {
        let value = match self.exec_block(&prog.body)? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Undefined,
        };
        trace!(steps = self.steps, "snippet finished");
        Ok(value)
    }

    fn tick(&mut self) -> Result<(), Error> {
        self.steps += 1;
        match self.max_steps {
            Some(max) if self.steps > max => Err(Error::StepLimit(max)),
            _ => Ok(()),
        }
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, Error> {
        for stmt in body {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, Error> {
        self.tick()?;
        match stmt {
            Stmt::Decl(kind, bindings) => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(init) => self.eval(init)?,
                        None => Value::Undefined,
                    };
                    self.scope.declare(*kind, name, value);
                }
            }
            Stmt::Expr(e) => {
                self.eval(e)?;
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(e) => self.eval(e)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Throw(e) => {
                let value = self.eval(e)?;
                let msg = match &value {
                    Value::String(s) => s.to_string(),
                    Value::Error(err) => err.to_string(),
                    _ => value.to_json().unwrap_or_else(|_| value.to_js_string()),
                };
                return Err(Error::Thrown(msg));
            }
            Stmt::If(cond, then, otherwise) => {
                if self.eval(cond)?.is_truthy() {
                    return self.exec_scoped(then);
                } else if let Some(otherwise) = otherwise {
                    return self.exec_scoped(otherwise);
                }
            }
            Stmt::While(cond, body) => {
                while self.eval(cond)?.is_truthy() {
                    self.tick()?;
                    if let Flow::Return(value) = self.exec_scoped(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scope.push();
                let flow = self.exec_for(init.as_deref(), cond.as_ref(), update.as_ref(), body);
                self.scope.pop();
                return flow;
            }
            Stmt::Block(body) => {
                self.scope.push();
                let flow = self.exec_block(body);
                self.scope.pop();
                return flow;
            }
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    /// Runs a `for` loop inside the frame that holds its initializer.
    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<Flow, Error> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        loop {
            if let Some(cond) = cond {
                if !self.eval(cond)?.is_truthy() {
                    return Ok(Flow::Normal);
                }
            }
            self.tick()?;
            if let Flow::Return(value) = self.exec_scoped(body)? {
                return Ok(Flow::Return(value));
            }
            if let Some(update) = update {
                self.eval(update)?;
            }
        }
    }

    /// Executes the body of `if`, `while` or `for`, which gets its own frame even
    /// when it is not a block.
    fn exec_scoped(&mut self, stmt: &Stmt) -> Result<Flow, Error> {
        self.scope.push();
        let flow = self.exec(stmt);
        self.scope.pop();
        flow
    }

    fn eval(&mut self, e: &Expr) -> Result<Value, Error> {
        let value = match e {
            Expr::Number(n) => Value::Number(*n),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined => Value::Undefined,
            Expr::Ident(name) => self.scope.get(name)?,
            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::array(items)
            }
            Expr::Object(props) => {
                let mut map = IndexMap::with_capacity(props.len());
                for (key, value) in props {
                    let value = self.eval(value)?;
                    map.insert(key.clone(), value);
                }
                Value::object(map)
            }
            Expr::Member(object, name) => {
                let object = self.eval(object)?;
                get_property(&object, name)?
            }
            Expr::Index(object, index) => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                get_index(&object, &index)?
            }
            Expr::Call(callee, args) => {
                let func = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match func {
                    Value::Native(native) => native.call(&args)?,
                    _ => {
                        return Err(Error::Type(format!(
                            "{} is not a function",
                            describe(callee)
                        )))
                    }
                }
            }
            Expr::New(callee, args) => {
                let func = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match func {
                    Value::Native(native @ Native::Error(_)) => native.call(&args)?,
                    _ => {
                        return Err(Error::Type(format!(
                            "{} is not a constructor",
                            describe(callee)
                        )))
                    }
                }
            }
            Expr::Unary(op, operand) => {
                let operand = match (op, operand.as_ref()) {
                    // `typeof` tolerates undeclared names.
                    (UnaryOp::Typeof, Expr::Ident(name)) => {
                        self.scope.get(name).unwrap_or(Value::Undefined)
                    }
                    _ => self.eval(operand)?,
                };
                match op {
                    UnaryOp::Neg => Value::Number(-operand.to_number()),
                    UnaryOp::Plus => Value::Number(operand.to_number()),
                    UnaryOp::Not => Value::Bool(!operand.is_truthy()),
                    UnaryOp::Typeof => Value::string(operand.type_of()),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, &lhs, &rhs)
            }
            Expr::Logical(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let short_circuit = match op {
                    LogicalOp::And => !lhs.is_truthy(),
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::Nullish => !lhs.is_nullish(),
                };
                if short_circuit {
                    lhs
                } else {
                    self.eval(rhs)?
                }
            }
            Expr::Conditional(cond, then, otherwise) => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)?
                } else {
                    self.eval(otherwise)?
                }
            }
            Expr::Assign(op, target, value) => {
                let place = self.place(target)?;
                let value = match op {
                    Some(op) => {
                        let old = self.load(&place)?;
                        let rhs = self.eval(value)?;
                        binary(*op, &old, &rhs)
                    }
                    None => self.eval(value)?,
                };
                self.store(&place, value.clone())?;
                value
            }
            Expr::Update(target, delta, prefix) => {
                let place = self.place(target)?;
                let old = self.load(&place)?.to_number();
                let new = old + delta;
                self.store(&place, Value::Number(new))?;
                Value::Number(if *prefix { new } else { old })
            }
        };
        Ok(value)
    }

    /// Evaluates the object and key of an assignment target once, so
    /// compound assignment does not repeat their side effects.
    fn place(&mut self, target: &Expr) -> Result<Place, Error> {
        match target {
            Expr::Ident(name) => Ok(Place::Binding(name.clone())),
            Expr::Member(object, name) => Ok(Place::Property(self.eval(object)?, name.clone())),
            Expr::Index(object, index) => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                Ok(Place::Index(object, index))
            }
            _ => Err(Error::Reference("invalid assignment target".to_owned())),
        }
    }

    fn load(&self, place: &Place) -> Result<Value, Error> {
        match place {
            Place::Binding(name) => self.scope.get(name),
            Place::Property(object, name) => get_property(object, name),
            Place::Index(object, index) => get_index(object, index),
        }
    }

    fn store(&mut self, place: &Place, value: Value) -> Result<(), Error> {
        match place {
            Place::Binding(name) => self.scope.set(name, value),
            Place::Property(object, name) => set_property(object, name, value),
            Place::Index(object, index) => match (object, array_index(index)) {
                (Value::Array(arr), Some(i)) => {
                    let mut arr = arr.borrow_mut();
                    if i >= arr.len() {
                        arr.set_length(i + 1)?;
                    }
                    arr[i] = value;
                    Ok(())
                }
                _ => set_property(object, &index.to_js_string(), value),
            },
        }
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (lhs, rhs) = (lhs.to_primitive(), rhs.to_primitive());
            match (&lhs, &rhs) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    let mut s = lhs.to_js_string();
                    s.push_str(&rhs.to_js_string());
                    Value::string(s)
                }
                _ => Value::Number(lhs.to_number() + rhs.to_number()),
            }
        }
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::LooseEq => Value::Bool(lhs.loose_eq(rhs)),
        BinaryOp::LooseNe => Value::Bool(!lhs.loose_eq(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_eq(rhs)),
        BinaryOp::StrictNe => Value::Bool(!lhs.strict_eq(rhs)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = compare(&lhs.to_primitive(), &rhs.to_primitive());
            Value::Bool(match (op, ord) {
                (_, None) => false,
                (BinaryOp::Lt, Some(ord)) => ord == Ordering::Less,
                (BinaryOp::Le, Some(ord)) => ord != Ordering::Greater,
                (BinaryOp::Gt, Some(ord)) => ord == Ordering::Greater,
                (_, Some(ord)) => ord != Ordering::Less,
            })
        }
    }
}

/// Orders two primitives; `None` when either side is `NaN`.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(compare_strings(a, b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

fn array_index(index: &Value) -> Option<usize> {
    match index {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < u32::MAX as f64 => {
            Some(*n as usize)
        }
        _ => None,
    }
}

fn get_index(object: &Value, index: &Value) -> Result<Value, Error> {
    match (object, array_index(index)) {
        (Value::Array(arr), Some(i)) => Ok(arr.borrow().get(i).cloned().unwrap_or_default()),
        // Strings index by UTF-16 code unit. Half of a surrogate pair reads
        // as U+FFFD.
        (Value::String(s), Some(i)) => Ok(s.encode_utf16().nth(i).map_or(Value::Undefined, |unit| {
            Value::string(String::from_utf16_lossy(&[unit]))
        })),
        _ => get_property(object, &index.to_js_string()),
    }
}

fn get_property(object: &Value, name: &str) -> Result<Value, Error> {
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(Error::Type(format!(
                "Cannot read properties of {} (reading '{name}')",
                object.to_js_string()
            )))
        }
        Value::Object(obj) => obj.borrow().get(name).cloned().unwrap_or_default(),
        Value::Array(arr) => match name {
            "length" => Value::Number(arr.borrow().len() as f64),
            "push" => Value::Native(Native::Array(arr.clone(), ArrayMethod::Push)),
            "pop" => Value::Native(Native::Array(arr.clone(), ArrayMethod::Pop)),
            "includes" => Value::Native(Native::Array(arr.clone(), ArrayMethod::Includes)),
            "indexOf" => Value::Native(Native::Array(arr.clone(), ArrayMethod::IndexOf)),
            "join" => Value::Native(Native::Array(arr.clone(), ArrayMethod::Join)),
            _ => Value::Undefined,
        },
        Value::String(s) if name == "length" => Value::Number(s.encode_utf16().count() as f64),
        Value::Error(err) => match name {
            "name" => Value::string(err.kind.to_string()),
            "message" => Value::String(err.message.clone()),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    };
    Ok(value)
}

fn set_property(object: &Value, name: &str, value: Value) -> Result<(), Error> {
    match object {
        Value::Undefined | Value::Null => Err(Error::Type(format!(
            "Cannot set properties of {} (setting '{name}')",
            object.to_js_string()
        ))),
        Value::Object(obj) => {
            obj.borrow_mut().insert(Rc::from(name), value);
            Ok(())
        }
        Value::Array(arr) if name == "length" => {
            let len = value.to_number();
            if len < 0.0 || len.fract() != 0.0 || len >= u32::MAX as f64 {
                return Err(Error::Range("Invalid array length".to_owned()));
            }
            arr.borrow_mut().set_length(len as usize)
        }
        Value::Array(_) => Err(Error::Type(format!(
            "Cannot set non-index property '{name}' on an array"
        ))),
        // Writes to primitives are silently discarded.
        _ => Ok(()),
    }
}

fn describe(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.to_string(),
        Expr::Member(object, name) => format!("{}.{name}", describe(object)),
        _ => "expression".to_owned(),
    }
}
