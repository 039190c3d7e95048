//! Enumeration of interleavings.
//!
//! An interleaving of threads with instruction counts n₁,…,n_k is a merge of
//! all their instructions that preserves each thread's own order. It is fully
//! determined by its schedule, the thread chosen at each step, so the
//! interleavings are exactly the distinct arrangements of the multiset with
//! nᵢ copies of thread i. There are (n₁+…+n_k)! / (n₁!·…·n_k!) of them.

use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::source::ThreadProgram;

/// Origin of one step of an interleaving: the `index`th instruction of
/// `thread`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Step {
    pub thread: usize,
    pub index: usize,
}

/// One order-preserving merge of all threads, as origin-tagged steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interleaving {
    steps: Vec<Step>,
}

impl Interleaving {
    /// Builds the interleaving that runs the thread given at each position.
    pub fn from_schedule(schedule: &[usize]) -> Self {
        let mut cursors = SmallVec::<[usize; 8]>::new();
        let steps = schedule
            .iter()
            .map(|&thread| {
                if cursors.len() <= thread {
                    cursors.resize(thread + 1, 0);
                }
                let index = cursors[thread];
                cursors[thread] += 1;
                Step { thread, index }
            })
            .collect();
        Interleaving { steps }
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The thread chosen at each step.
    pub fn schedule(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().map(|step| step.thread)
    }

    /// Indexes of `thread`'s instructions in the order they run.
    pub fn project(&self, thread: usize) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .filter(move |step| step.thread == thread)
            .map(|step| step.index)
    }

    /// Resolves each step to its item in `threads`.
    ///
    /// # Panics
    ///
    /// Panics if a step refers outside of `threads`, i.e., when the
    /// interleaving was enumerated for other threads.
    pub fn merge<'a, T: 'a, S: AsRef<[T]>>(
        &'a self,
        threads: &'a [S],
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.steps
            .iter()
            .map(move |step| &threads[step.thread].as_ref()[step.index])
    }

    /// The instruction text of each step.
    pub fn instructions<'a>(
        &'a self,
        threads: &'a [ThreadProgram],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.merge(threads).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum State {
    Fresh,
    Exploring,
    Exhausted,
}

/// Lazily enumerates every interleaving of threads with the given instruction
/// counts.
///
/// The search is depth-first over scheduling choices and keeps its branches on
/// an explicit stack, so the depth of the search is bounded only by memory.
/// Interleavings are produced in lexicographic order of their schedules.
#[derive(Clone, Debug)]
pub struct Schedules {
    /// Instructions of each thread not yet placed on the current branch.
    remaining: SmallVec<[usize; 8]>,
    /// The thread chosen at each depth of the current branch.
    branches: Vec<usize>,
    state: State,
}

impl Schedules {
    pub fn new<I: IntoIterator<Item = usize>>(lengths: I) -> Self {
        let remaining: SmallVec<[usize; 8]> = lengths.into_iter().collect();
        let depth = remaining.iter().sum();
        Schedules {
            remaining,
            branches: Vec::with_capacity(depth),
            state: State::Fresh,
        }
    }

    pub fn for_threads(threads: &[ThreadProgram]) -> Self {
        Schedules::new(threads.iter().map(ThreadProgram::len))
    }

    /// Extends the current branch to a complete schedule, taking the lowest
    /// eligible thread at each depth.
    fn descend(&mut self) {
        while let Some(thread) = self.remaining.iter().position(|&n| n != 0) {
            self.remaining[thread] -= 1;
            self.branches.push(thread);
        }
    }

    /// Backtracks to the deepest branch that can switch to a higher eligible
    /// thread and switches it. Returns false when no branch can.
    fn advance(&mut self) -> bool {
        while let Some(thread) = self.branches.pop() {
            self.remaining[thread] += 1;
            let next = (thread + 1..self.remaining.len()).find(|&t| self.remaining[t] != 0);
            if let Some(next) = next {
                self.remaining[next] -= 1;
                self.branches.push(next);
                return true;
            }
        }
        false
    }
}

impl Iterator for Schedules {
    type Item = Interleaving;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Fresh => self.state = State::Exploring,
            State::Exploring => {
                if !self.advance() {
                    self.state = State::Exhausted;
                    return None;
                }
            }
            State::Exhausted => return None,
        }
        self.descend();
        Some(Interleaving::from_schedule(&self.branches))
    }
}

impl FusedIterator for Schedules {}

/// Collects every interleaving of `threads`.
pub fn interleavings(threads: &[ThreadProgram]) -> Vec<Interleaving> {
    Schedules::for_threads(threads).collect()
}

/// Computes the number of interleavings of threads with the given instruction
/// counts, the multinomial coefficient (n₁+…+n_k)! / (n₁!·…·n_k!). Returns
/// `None` if it does not fit in a `u128`.
pub fn multinomial<I: IntoIterator<Item = usize>>(lengths: I) -> Option<u128> {
    let mut total: u128 = 1;
    let mut placed: u128 = 0;
    for len in lengths {
        // Multiply by C(placed + len, len) one factor at a time. Each partial
        // product is itself a binomial multiple, so the division is exact.
        for i in 1..=len as u128 {
            placed += 1;
            total = total.checked_mul(placed)? / i;
        }
    }
    Some(total)
}
