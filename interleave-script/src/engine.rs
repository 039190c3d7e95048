use tracing::trace;

use crate::ast::Program;
use crate::error::Error;
use crate::parse::parse;
use crate::vm::{Interp, Value};

/// Compiles and runs snippets in isolation.
///
/// No run may observe bindings or values left behind by an earlier run.
pub trait Engine {
    type Program;

    fn compile(&self, src: &str) -> Result<Self::Program, Error>;

    fn run(&self, prog: &Self::Program) -> Result<Value, Error>;

    /// Compiles and runs `src`, then serializes its result canonically.
    fn evaluate(&self, src: &str) -> Result<String, Error> {
        let prog = self.compile(src)?;
        self.run(&prog)?.to_json()
    }
}

/// Evaluation budget for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Limits {
    /// Statements and loop iterations a run may execute before it fails.
    pub max_steps: Option<u64>,
}

/// The snippet interpreter. Each run gets a fresh scope.
#[derive(Clone, Debug, Default)]
pub struct Sandbox {
    limits: Limits,
}

impl Sandbox {
    #[inline]
    pub fn new() -> Self {
        Sandbox::default()
    }

    #[inline]
    pub fn with_limits(limits: Limits) -> Self {
        Sandbox { limits }
    }

    #[inline]
    pub fn limits(&self) -> Limits {
        self.limits
    }
}

impl Engine for Sandbox {
    type Program = Program;

    fn compile(&self, src: &str) -> Result<Program, Error> {
        let prog = parse(src)?;
        trace!(statements = prog.body.len(), "compiled snippet");
        Ok(prog)
    }

    fn run(&self, prog: &Program) -> Result<Value, Error> {
        Interp::new(self.limits.max_steps).run(prog)
    }
}
