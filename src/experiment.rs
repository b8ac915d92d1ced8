use crate::enabled::{Enablement, Gate};
use crate::error::{ConfigError, RunError};
use crate::executor::execute;
use crate::hooks::{discard, equal, Hooks};
use crate::observation::{Observation, Variant};
use crate::shuffle::{Shuffle, ThreadRngShuffle};

type Function<'a, T, E> = Box<dyn Fn() -> Result<T, E> + 'a>;

/// An experiment whose control and candidate run sequentially on the calling
/// thread. See [`AsyncExperiment`](crate::AsyncExperiment) for the suspending
/// version.
///
/// Nothing registered here has to be `Send`, `Sync` or `'static`: functions
/// may borrow anything that outlives the experiment.
///
/// Registrations can be changed between runs; each call to `run` or
/// `run_only` reads them afresh.
pub struct Experiment<'a, T, E, C = T> {
    name: String,
    control: Option<Function<'a, T, E>>,
    candidate: Option<Function<'a, T, E>>,
    compare: Box<dyn Fn(&T, &T) -> bool + 'a>,
    enabled: Box<dyn Enablement + 'a>,
    clean: Option<Box<dyn Fn(&T) -> C + 'a>>,
    publish: Box<dyn Fn(&Observation<T, E, C>) + 'a>,
    shuffler: Box<dyn Shuffle + 'a>,
}

impl<'a, T, E, C> Experiment<'a, T, E, C>
where
    T: PartialEq + 'a,
    E: 'a,
    C: 'a,
{
    /// Create a new experiment. Fails if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::MissingName);
        }

        Ok(Self {
            name,
            control: None,
            candidate: None,
            compare: Box::new(equal::<T>),
            enabled: Box::new(Gate::Disabled),
            clean: None,
            publish: Box::new(discard::<T, E, C>),
            shuffler: Box::new(ThreadRngShuffle),
        })
    }
}

impl<'a, T, E, C> Experiment<'a, T, E, C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the control function, replacing any earlier one. Its outcome is
    /// what `run` returns.
    pub fn control<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Result<T, E> + 'a,
    {
        self.control = Some(Box::new(f));
        self
    }

    /// Set the candidate function, replacing any earlier one
    pub fn candidate<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Result<T, E> + 'a,
    {
        self.candidate = Some(Box::new(f));
        self
    }

    /// Override how raw control and candidate values are compared. Only
    /// called when both produced a value.
    ///
    /// The default is `PartialEq`, so a float `NaN` never matches itself;
    /// register a comparator that treats two `NaN`s as equal if that matters.
    pub fn compare<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T, &T) -> bool + 'a,
    {
        self.compare = Box::new(f);
        self
    }

    /// Decide whether `run` includes the candidate. Defaults to
    /// [`Gate::Disabled`](crate::Gate::Disabled).
    pub fn enabled<G>(&mut self, gate: G) -> &mut Self
    where
        G: Enablement + 'a,
    {
        self.enabled = Box::new(gate);
        self
    }

    /// Normalise values for reporting. The result lands in
    /// [`Outcome::cleaned_value`](crate::Outcome::cleaned_value) and has no
    /// bearing on `matched`.
    ///
    /// Only results that carry a value are cleaned: a control or candidate
    /// that failed keeps `cleaned_value` as `None`.
    pub fn clean<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T) -> C + 'a,
    {
        self.clean = Some(Box::new(f));
        self
    }

    /// Receive the observation from every run, whether or not it fails
    pub fn publish<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Observation<T, E, C>) + 'a,
    {
        self.publish = Box::new(f);
        self
    }

    /// Replace the strategy used to order control and candidate
    pub fn shuffler<S>(&mut self, shuffler: S) -> &mut Self
    where
        S: Shuffle + 'a,
    {
        self.shuffler = Box::new(shuffler);
        self
    }

    /// Run the control, and the candidate if it is enabled, in random order.
    /// The observation is published and then the control's outcome is
    /// returned: its value, or the exact error it produced. A panicking control
    /// panics again here. Nothing the candidate does reaches the caller.
    ///
    /// Returns `Ok(None)` if only a candidate was registered and enabled.
    pub fn run(&self) -> Result<Option<T>, RunError<E>> {
        let span = tracing::info_span!("scientist_experiment", experiment = %self.name, mode = "blocking");
        let _enter = span.enter();

        let hooks = self.hooks();
        let selected = hooks.select(self.control.is_some(), self.candidate.is_some())?;
        let order = hooks.shuffle(&selected);

        let results = order
            .iter()
            .filter_map(|&variant| {
                let f = self.function(variant)?;
                Some(execute(variant, || f()))
            })
            .collect();

        hooks.conclude(&self.name, order, results, Variant::Control)
    }

    /// Run exactly one path, ignoring the enablement gate and shuffling, and
    /// return that path's outcome after publishing.
    pub fn run_only(&self, which: Variant) -> Result<T, RunError<E>> {
        let span = tracing::info_span!(
            "scientist_experiment",
            experiment = %self.name,
            mode = "blocking",
            only = %which
        );
        let _enter = span.enter();

        let f = self.function(which).ok_or(ConfigError::NoExperiments)?;
        let results = vec![execute(which, || f())];

        self.hooks()
            .conclude(&self.name, vec![which], results, which)?
            .ok_or_else(|| ConfigError::NoExperiments.into())
    }

    fn function(&self, variant: Variant) -> Option<&Function<'a, T, E>> {
        match variant {
            Variant::Control => self.control.as_ref(),
            Variant::Candidate => self.candidate.as_ref(),
        }
    }

    fn hooks(&self) -> Hooks<'_, T, E, C> {
        Hooks {
            compare: &*self.compare,
            enabled: &*self.enabled,
            clean: self.clean.as_deref().map(|clean| clean as &dyn Fn(&T) -> C),
            publish: &*self.publish,
            shuffler: &*self.shuffler,
        }
    }
}
