use std::future::Future;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing_futures::Instrument;

use crate::enabled::{Enablement, Gate};
use crate::error::{ConfigError, RunError};
use crate::executor::{execute_async, Execution};
use crate::hooks::{discard, equal, Hooks};
use crate::observation::{Observation, Variant};
use crate::shuffle::{Shuffle, ThreadRngShuffle};

type Function<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// An experiment whose control and candidate are futures. When both are
/// selected they are started together and awaited concurrently, so their side
/// effects may interleave; use [`Experiment`](crate::Experiment) if they must
/// not.
///
/// Everything registered must be `Send + Sync + 'static` so that the futures
/// returned from `run` and `run_only` can be spawned onto a multi-threaded
/// runtime.
///
/// There is no timeout: a future that never resolves stalls the run.
pub struct AsyncExperiment<T, E, C = T> {
    name: String,
    control: Option<Function<T, E>>,
    candidate: Option<Function<T, E>>,
    compare: Box<dyn Fn(&T, &T) -> bool + Send + Sync>,
    enabled: Box<dyn Enablement + Send + Sync>,
    clean: Option<Box<dyn Fn(&T) -> C + Send + Sync>>,
    publish: Box<dyn Fn(&Observation<T, E, C>) + Send + Sync>,
    shuffler: Box<dyn Shuffle + Send + Sync>,
}

impl<T, E, C> AsyncExperiment<T, E, C>
where
    T: PartialEq + 'static,
    E: 'static,
    C: 'static,
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

impl<T, E, C> AsyncExperiment<T, E, C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the control, a function returning the future to await on each run
    pub fn control<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.control = Some(Box::new(move || f().boxed()));
        self
    }

    /// Set the candidate, a function returning the future to await on each run
    pub fn candidate<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.candidate = Some(Box::new(move || f().boxed()));
        self
    }

    /// See [`Experiment::compare`](crate::Experiment::compare). The default
    /// is `PartialEq`, under which `NaN` never matches itself.
    pub fn compare<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.compare = Box::new(f);
        self
    }

    /// See [`Experiment::enabled`](crate::Experiment::enabled)
    pub fn enabled<G>(&mut self, gate: G) -> &mut Self
    where
        G: Enablement + Send + Sync + 'static,
    {
        self.enabled = Box::new(gate);
        self
    }

    /// See [`Experiment::clean`](crate::Experiment::clean). Failed results
    /// are never cleaned.
    pub fn clean<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T) -> C + Send + Sync + 'static,
    {
        self.clean = Some(Box::new(f));
        self
    }

    /// See [`Experiment::publish`](crate::Experiment::publish)
    pub fn publish<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Observation<T, E, C>) + Send + Sync + 'static,
    {
        self.publish = Box::new(f);
        self
    }

    /// See [`Experiment::shuffler`](crate::Experiment::shuffler)
    pub fn shuffler<S>(&mut self, shuffler: S) -> &mut Self
    where
        S: Shuffle + Send + Sync + 'static,
    {
        self.shuffler = Box::new(shuffler);
        self
    }

    /// The suspending form of [`Experiment::run`](crate::Experiment::run).
    /// Selected experiments are invoked in shuffled order and then awaited
    /// together; the observation is published once all of them settle.
    ///
    /// Selection happens when `run` is called: the enablement check, the
    /// shuffle and the configuration errors are settled before the future is
    /// returned, and a future carrying a configuration error resolves on its
    /// first poll without running anything.
    pub fn run(&self) -> impl Future<Output = Result<Option<T>, RunError<E>>> + '_ {
        let span = tracing::info_span!("scientist_experiment", experiment = %self.name, mode = "async");
        let order = span.in_scope(|| {
            let hooks = self.hooks();
            hooks
                .select(self.control.is_some(), self.candidate.is_some())
                .map(|selected| hooks.shuffle(&selected))
        });

        self.run_ordered(order).instrument(span)
    }

    /// The suspending form of [`Experiment::run_only`](crate::Experiment::run_only).
    /// A missing path is reported the same way as in [`run`](Self::run): the
    /// returned future resolves to the error on its first poll.
    pub fn run_only(&self, which: Variant) -> impl Future<Output = Result<T, RunError<E>>> + '_ {
        let span = tracing::info_span!(
            "scientist_experiment",
            experiment = %self.name,
            mode = "async",
            only = %which
        );
        let execution = self.execute(which).ok_or(ConfigError::NoExperiments);

        self.run_one(which, execution).instrument(span)
    }

    async fn run_ordered(
        &self,
        order: Result<Vec<Variant>, ConfigError>,
    ) -> Result<Option<T>, RunError<E>> {
        let order = order?;
        let results = join_all(order.iter().filter_map(|&variant| self.execute(variant))).await;

        self.hooks().conclude(&self.name, order, results, Variant::Control)
    }

    async fn run_one<F>(
        &self,
        which: Variant,
        execution: Result<F, ConfigError>,
    ) -> Result<T, RunError<E>>
    where
        F: Future<Output = Execution<T, E>>,
    {
        let results = vec![execution?.await];

        self.hooks()
            .conclude(&self.name, vec![which], results, which)?
            .ok_or_else(|| ConfigError::NoExperiments.into())
    }

    fn execute(
        &self,
        variant: Variant,
    ) -> Option<impl Future<Output = Execution<T, E>> + '_> {
        let f = match variant {
            Variant::Control => self.control.as_ref(),
            Variant::Candidate => self.candidate.as_ref(),
        }?;

        Some(
            execute_async(variant, move || f())
                .instrument(tracing::debug_span!("scientist_variant", %variant)),
        )
    }

    // borrowed per call and dropped before any await, so run futures stay Send
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
