//! Planner directives.
//!
//! [`Flags`] mirrors the classic FFTW planner flag word: exactly one effort
//! level, an optional wisdom-only restriction, and a handful of memory and
//! alignment hints. Conflicting combinations are rejected at build time so
//! a constructed `Flags` value is always coherent, and the canonical struct
//! representation makes equality and hashing independent of the order in
//! which directives were composed.

use crate::kernel::FftError;

/// How much time the planner may spend searching for a fast algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Effort {
    /// Cheapest: pick an algorithm by heuristic without measuring.
    #[default]
    Estimate,
    /// Time a few candidate algorithms.
    Measure,
    /// Like `Measure` with a wider search.
    Patient,
    /// Search the full algorithm space.
    Exhaustive,
}

impl Effort {
    /// Whether this effort level implies fresh measurement work.
    pub fn measures(self) -> bool {
        !matches!(self, Effort::Estimate)
    }
}

/// Canonical, order-independent set of planner directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags {
    effort: Effort,
    wisdom_only: bool,
    preserve_input: bool,
    destroy_input: bool,
    unaligned: bool,
    conserve_memory: bool,
}

impl Flags {
    pub fn builder() -> FlagsBuilder {
        FlagsBuilder::default()
    }

    /// Default planning flags: `Estimate` effort, no hints.
    pub fn estimate() -> Self {
        Self::default()
    }

    pub fn effort(&self) -> Effort {
        self.effort
    }
    pub fn wisdom_only(&self) -> bool {
        self.wisdom_only
    }
    pub fn preserve_input(&self) -> bool {
        self.preserve_input
    }
    pub fn destroy_input(&self) -> bool {
        self.destroy_input
    }
    pub fn unaligned(&self) -> bool {
        self.unaligned
    }
    pub fn conserve_memory(&self) -> bool {
        self.conserve_memory
    }
}

/// Composes directives one at a time; conflicts surface at [`build`].
///
/// [`build`]: FlagsBuilder::build
#[derive(Debug, Clone, Default)]
pub struct FlagsBuilder {
    effort: Option<Effort>,
    effort_conflict: bool,
    wisdom_only: bool,
    preserve_input: bool,
    destroy_input: bool,
    unaligned: bool,
    conserve_memory: bool,
}

impl FlagsBuilder {
    fn set_effort(mut self, effort: Effort) -> Self {
        match self.effort {
            None => self.effort = Some(effort),
            Some(prev) if prev == effort => {}
            Some(_) => self.effort_conflict = true,
        }
        self
    }

    pub fn estimate(self) -> Self {
        self.set_effort(Effort::Estimate)
    }
    pub fn measure(self) -> Self {
        self.set_effort(Effort::Measure)
    }
    pub fn patient(self) -> Self {
        self.set_effort(Effort::Patient)
    }
    pub fn exhaustive(self) -> Self {
        self.set_effort(Effort::Exhaustive)
    }

    /// Only plan from previously accumulated wisdom; never measure.
    pub fn wisdom_only(mut self) -> Self {
        self.wisdom_only = true;
        self
    }
    /// Out-of-place plans must leave the input untouched.
    pub fn preserve_input(mut self) -> Self {
        self.preserve_input = true;
        self
    }
    /// The planner may clobber the input buffer during execution.
    pub fn destroy_input(mut self) -> Self {
        self.destroy_input = true;
        self
    }
    /// Do not assume the alignment observed at planning time.
    pub fn unaligned(mut self) -> Self {
        self.unaligned = true;
        self
    }
    /// Prefer smaller scratch usage over speed.
    pub fn conserve_memory(mut self) -> Self {
        self.conserve_memory = true;
        self
    }

    /// Validate and freeze the directive set.
    ///
    /// Fails with [`FftError::ConflictingFlags`] when more than one effort
    /// level was requested, when `wisdom_only` is combined with a measuring
    /// effort, or when `preserve_input` and `destroy_input` are both set.
    pub fn build(self) -> Result<Flags, FftError> {
        if self.effort_conflict {
            return Err(FftError::ConflictingFlags);
        }
        let effort = self.effort.unwrap_or_default();
        if self.wisdom_only && effort.measures() {
            return Err(FftError::ConflictingFlags);
        }
        if self.preserve_input && self.destroy_input {
            return Err(FftError::ConflictingFlags);
        }
        Ok(Flags {
            effort,
            wisdom_only: self.wisdom_only,
            preserve_input: self.preserve_input,
            destroy_input: self.destroy_input,
            unaligned: self.unaligned,
            conserve_memory: self.conserve_memory,
        })
    }
}
