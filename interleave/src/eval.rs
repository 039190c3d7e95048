//! Running one interleaving as a complete program.

use interleave_script::{Engine, Error, Limits, Sandbox};
use tracing::trace;

/// Joins the prelude, the instructions one per line, and the epilogue into the
/// text of one program.
pub fn assemble<'a, I>(prelude: &str, instructions: I, epilogue: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut text = String::with_capacity(prelude.len() + epilogue.len() + 2);
    text.push_str(prelude);
    text.push('\n');
    for (i, inst) in instructions.into_iter().enumerate() {
        if i != 0 {
            text.push('\n');
        }
        text.push_str(inst);
    }
    text.push('\n');
    text.push_str(epilogue);
    text
}

/// Executes assembled programs in isolation and serializes their results.
#[derive(Clone, Debug, Default)]
pub struct Evaluator<E = Sandbox> {
    engine: E,
}

impl Evaluator {
    #[inline]
    pub fn new(limits: Limits) -> Self {
        Evaluator {
            engine: Sandbox::with_limits(limits),
        }
    }
}

impl<E: Engine> Evaluator<E> {
    #[inline]
    pub fn with_engine(engine: E) -> Self {
        Evaluator { engine }
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs `prelude`, then `instructions` in order, then `epilogue`, and
    /// returns the canonical form of the value the program returns.
    pub fn evaluate<'a, I>(
        &self,
        prelude: &str,
        instructions: I,
        epilogue: &str,
    ) -> Result<String, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let text = assemble(prelude, instructions, epilogue);
        let outcome = self.engine.evaluate(&text)?;
        trace!(%outcome, "evaluated interleaving");
        Ok(outcome)
    }
}
