//! The pass capability interface and the compound-pass runner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vesper_ir::IrError;

/// The result type for pass execution.
pub type PassResult<T> = Result<T, PassError>;

/// Errors raised by pass execution.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// A pass detected a broken compiler invariant. Fatal; the pipeline
    /// aborts its remaining schedule.
    #[error("pass invariant violated: {0}")]
    InvariantViolation(String),

    /// An invariant checker rejected the unit after a pass ran. Fatal.
    #[error("invariant checker '{checker}' failed: {message}")]
    CheckerFailure {
        /// The short name of the failing checker.
        checker: String,
        /// The checker's diagnostic.
        message: String,
    },

    /// An IR-level error surfaced during transformation.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// A cooperative shutdown signal shared between a driver and running passes.
///
/// Passes poll the signal between top-level iterations and return early with
/// the accumulated changed flag. Partial mutations may persist; the invariant
/// checkers enforce well-formedness at the next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Creates a new, unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Options shared by every pass in a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PassOptions {
    /// The cooperative shutdown signal.
    pub cancel: CancelSignal,
}

/// One recorded pass execution.
#[derive(Debug, Clone)]
pub struct PassInvocation {
    /// The short name of the pass that ran.
    pub pass_name: String,
    /// Whether the pass reported a change.
    pub changed: bool,
}

/// Accumulated bookkeeping for a pipeline run.
#[derive(Debug, Default)]
pub struct PassResults {
    /// Executions in the order they happened.
    pub invocations: Vec<PassInvocation>,
}

impl PassResults {
    /// Creates an empty results record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one pass execution.
    pub fn record(&mut self, pass_name: &str, changed: bool) {
        self.invocations.push(PassInvocation {
            pass_name: pass_name.to_string(),
            changed,
        });
    }
}

/// A deterministic transformation over a unit of IR.
///
/// For identical input unit and options a pass must produce identical output
/// and an identical changed flag. The unit type distinguishes the plain
/// domain (a package) from the scheduling domain (a package paired with its
/// schedules).
pub trait Pass<U> {
    /// A short, identifier-like name, e.g. `dce`.
    fn short_name(&self) -> &str;

    /// A human-readable name, e.g. `Dead Code Elimination`.
    fn long_name(&self) -> &str;

    /// Runs the pass, returning whether it changed the unit.
    fn run(
        &self,
        unit: &mut U,
        options: &PassOptions,
        results: &mut PassResults,
    ) -> PassResult<bool>;
}

/// An ordered sequence of passes with invariant checkers.
///
/// Children run in declaration order; after each child, every checker runs.
/// A checker is a pass constrained to never mutate the unit — a checker
/// returning an error is fatal and surfaces as
/// [`PassError::CheckerFailure`].
pub struct CompoundPass<U> {
    short_name: String,
    long_name: String,
    passes: Vec<Box<dyn Pass<U>>>,
    checkers: Vec<Box<dyn Pass<U>>>,
}

impl<U> CompoundPass<U> {
    /// Creates an empty compound pass.
    pub fn new(short_name: impl Into<String>, long_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            long_name: long_name.into(),
            passes: Vec::new(),
            checkers: Vec::new(),
        }
    }

    /// Appends a child pass.
    pub fn add_pass(&mut self, pass: Box<dyn Pass<U>>) {
        self.passes.push(pass);
    }

    /// Appends an invariant checker, run after every child pass.
    pub fn add_invariant_checker(&mut self, checker: Box<dyn Pass<U>>) {
        self.checkers.push(checker);
    }

    /// Returns the number of child passes.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

impl<U> Pass<U> for CompoundPass<U> {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn long_name(&self) -> &str {
        &self.long_name
    }

    fn run(
        &self,
        unit: &mut U,
        options: &PassOptions,
        results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut changed = false;
        for pass in &self.passes {
            if options.cancel.is_requested() {
                log::debug!("{}: cancelled before {}", self.short_name, pass.short_name());
                return Ok(changed);
            }
            log::debug!("{}: running {}", self.short_name, pass.short_name());
            let pass_changed = pass.run(unit, options, results)?;
            results.record(pass.short_name(), pass_changed);
            changed |= pass_changed;
            for checker in &self.checkers {
                if let Err(err) = checker.run(unit, options, results) {
                    return Err(PassError::CheckerFailure {
                        checker: checker.short_name().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A unit that counts how often it was touched.
    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    struct Increment;

    impl Pass<Counter> for Increment {
        fn short_name(&self) -> &str {
            "inc"
        }

        fn long_name(&self) -> &str {
            "Increment"
        }

        fn run(
            &self,
            unit: &mut Counter,
            _options: &PassOptions,
            _results: &mut PassResults,
        ) -> PassResult<bool> {
            unit.value += 1;
            Ok(true)
        }
    }

    struct Nop;

    impl Pass<Counter> for Nop {
        fn short_name(&self) -> &str {
            "nop"
        }

        fn long_name(&self) -> &str {
            "No-op"
        }

        fn run(
            &self,
            _unit: &mut Counter,
            _options: &PassOptions,
            _results: &mut PassResults,
        ) -> PassResult<bool> {
            Ok(false)
        }
    }

    /// Fails once the unit value exceeds a limit.
    struct Limit(u32);

    impl Pass<Counter> for Limit {
        fn short_name(&self) -> &str {
            "limit"
        }

        fn long_name(&self) -> &str {
            "Value limit checker"
        }

        fn run(
            &self,
            unit: &mut Counter,
            _options: &PassOptions,
            _results: &mut PassResults,
        ) -> PassResult<bool> {
            if unit.value > self.0 {
                return Err(PassError::InvariantViolation(format!(
                    "value {} exceeds limit {}",
                    unit.value, self.0
                )));
            }
            Ok(false)
        }
    }

    #[test]
    fn children_run_in_order_and_aggregate_changed() {
        let mut compound = CompoundPass::new("top", "Top");
        compound.add_pass(Box::new(Nop));
        compound.add_pass(Box::new(Increment));
        compound.add_pass(Box::new(Nop));

        let mut unit = Counter::default();
        let mut results = PassResults::new();
        let changed = compound
            .run(&mut unit, &PassOptions::default(), &mut results)
            .unwrap();
        assert!(changed);
        assert_eq!(unit.value, 1);
        let names: Vec<&str> = results
            .invocations
            .iter()
            .map(|i| i.pass_name.as_str())
            .collect();
        assert_eq!(names, vec!["nop", "inc", "nop"]);
    }

    #[test]
    fn unchanged_pipeline_reports_unchanged() {
        let mut compound = CompoundPass::new("top", "Top");
        compound.add_pass(Box::new(Nop));
        let mut unit = Counter::default();
        let mut results = PassResults::new();
        let changed = compound
            .run(&mut unit, &PassOptions::default(), &mut results)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn checker_runs_after_every_child() {
        let mut compound = CompoundPass::new("top", "Top");
        compound.add_invariant_checker(Box::new(Limit(1)));
        compound.add_pass(Box::new(Increment));
        compound.add_pass(Box::new(Increment));

        let mut unit = Counter::default();
        let mut results = PassResults::new();
        let err = compound
            .run(&mut unit, &PassOptions::default(), &mut results)
            .unwrap_err();
        match err {
            PassError::CheckerFailure { checker, message } => {
                assert_eq!(checker, "limit");
                assert!(message.contains("exceeds limit"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The second increment ran, the checker stopped the pipeline there.
        assert_eq!(unit.value, 2);
    }

    #[test]
    fn cancel_stops_before_next_child() {
        let mut compound = CompoundPass::new("top", "Top");
        compound.add_pass(Box::new(Increment));
        compound.add_pass(Box::new(Increment));

        let options = PassOptions::default();
        options.cancel.request();
        let mut unit = Counter::default();
        let mut results = PassResults::new();
        let changed = compound.run(&mut unit, &options, &mut results).unwrap();
        assert!(!changed);
        assert_eq!(unit.value, 0);
    }

    #[test]
    fn cancel_signal_is_shared_between_clones() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_requested());
        signal.request();
        assert!(clone.is_requested());
    }
}
