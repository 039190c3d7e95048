//! Exhaustive simulation of thread interleavings.
//!
//! Each thread is a short list of instructions, one per line. Every
//! order-preserving merge of the threads is run as one program, between a
//! shared prelude and epilogue, and the value returned by the epilogue is
//! tallied. The tally shows which outcomes a race can produce and how often.
//!
//! ```
//! let tally = interleave::simulate("let x = 1;", &["x = x + 1;", "x = x * 2;"], "return x;")?;
//! assert_eq!(tally.get("4"), Some(1));
//! assert_eq!(tally.get("3"), Some(1));
//! # Ok::<(), interleave::Error>(())
//! ```

pub mod demo;
pub mod error;
pub mod eval;
pub mod schedule;
pub mod simulate;
pub mod source;
pub mod tally;

pub use error::{Error, LimitError, UsageError};
pub use schedule::{interleavings, multinomial, Interleaving, Schedules, Step};
pub use simulate::{simulate, SimulationConfig, Simulator};
pub use source::ThreadProgram;
pub use tally::{OutcomeTally, Report};

/// Fewest threads the command line accepts.
pub const MIN_THREADS: usize = 1;
/// Most threads the command line accepts.
pub const MAX_THREADS: usize = 10;

/// Checks that `count` threads is within what the command line accepts.
pub fn check_thread_count(count: usize) -> Result<(), UsageError> {
    if (MIN_THREADS..=MAX_THREADS).contains(&count) {
        Ok(())
    } else {
        Err(UsageError::ThreadCount {
            got: count,
            min: MIN_THREADS,
            max: MAX_THREADS,
        })
    }
}
