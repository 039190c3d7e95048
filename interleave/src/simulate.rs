use interleave_script::{Engine, Limits, Sandbox};
use tracing::{debug, warn};

use crate::error::{Error, LimitError};
use crate::eval::Evaluator;
use crate::schedule::{multinomial, Schedules};
use crate::source::ThreadProgram;
use crate::tally::OutcomeTally;

/// Bounds on a simulation. Everything is unbounded by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimulationConfig {
    /// Refuse to run when the threads have more interleavings than this.
    pub max_interleavings: Option<u128>,
    /// Evaluation budget for each interleaving's program.
    pub max_steps: Option<u64>,
}

/// Runs every interleaving of a set of threads and tallies the outcomes.
#[derive(Clone, Debug, Default)]
pub struct Simulator<E = Sandbox> {
    config: SimulationConfig,
    evaluator: Evaluator<E>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        let limits = Limits {
            max_steps: config.max_steps,
        };
        Simulator {
            config,
            evaluator: Evaluator::new(limits),
        }
    }
}

impl<E: Engine> Simulator<E> {
    /// Uses `engine` to run programs. The step budget of `config` is left to
    /// the engine.
    pub fn with_engine(config: SimulationConfig, engine: E) -> Self {
        Simulator {
            config,
            evaluator: Evaluator::with_engine(engine),
        }
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Parses each thread's source, then runs every interleaving.
    pub fn run<S: AsRef<str>>(
        &self,
        prelude: &str,
        threads: &[S],
        epilogue: &str,
    ) -> Result<OutcomeTally, Error> {
        let threads = threads
            .iter()
            .map(|src| ThreadProgram::parse(src.as_ref()))
            .collect::<Vec<_>>();
        self.run_programs(prelude, &threads, epilogue)
    }

    /// Runs every interleaving of already parsed threads.
    ///
    /// The first program that fails to compile or run aborts the batch and its
    /// error is returned. No partial tally is produced.
    pub fn run_programs(
        &self,
        prelude: &str,
        threads: &[ThreadProgram],
        epilogue: &str,
    ) -> Result<OutcomeTally, Error> {
        let count = multinomial(threads.iter().map(ThreadProgram::len));
        if let Some(max) = self.config.max_interleavings {
            let err = match count {
                Some(count) if count <= max => None,
                Some(count) => Some(LimitError::TooManyInterleavings { count, max }),
                None => Some(LimitError::Uncountable { max }),
            };
            if let Some(err) = err {
                warn!(%err, "refusing to simulate");
                return Err(err.into());
            }
        }
        debug!(
            threads = threads.len(),
            interleavings = ?count,
            "simulating"
        );

        let mut tally = OutcomeTally::new();
        for interleaving in Schedules::for_threads(threads) {
            let outcome =
                self.evaluator
                    .evaluate(prelude, interleaving.instructions(threads), epilogue)?;
            tally.record(outcome);
        }

        debug!(
            total = tally.total(),
            outcomes = tally.len(),
            "simulation finished"
        );
        Ok(tally)
    }
}

/// Runs every interleaving of `threads` between `prelude` and `epilogue` with
/// no bounds, and tallies the serialized outcomes.
pub fn simulate<S: AsRef<str>>(
    prelude: &str,
    threads: &[S],
    epilogue: &str,
) -> Result<OutcomeTally, Error> {
    Simulator::new(SimulationConfig::default()).run(prelude, threads, epilogue)
}
