/// Whether `run` should execute the candidate alongside the control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Run only the control. This is the default.
    Disabled,

    /// Run both methods and compare the results
    Enabled,
}

impl Default for Gate {
    fn default() -> Self {
        Gate::Disabled
    }
}

/// A method for choosing if the candidate should run. Evaluated exactly once
/// per call to `run`; `run_only` ignores it.
///
/// Any sampling or rollout policy belongs here, in the caller's implementation.
pub trait Enablement {
    fn is_enabled(&self) -> bool;
}

impl Enablement for Gate {
    fn is_enabled(&self) -> bool {
        *self == Gate::Enabled
    }
}

impl<F> Enablement for F
where
    F: Fn() -> bool,
{
    fn is_enabled(&self) -> bool {
        self()
    }
}
