use crate::enabled::Enablement;
use crate::error::{ConfigError, RunError};
use crate::executor::Execution;
use crate::format::{format, Formatted};
use crate::observation::{Observation, Outcome, Variant};
use crate::shuffle::Shuffle;

/// The overridable behaviour shared by the blocking and suspending runners,
/// borrowed from whichever runner owns it. A fresh view is taken for every
/// run, so registrations made between runs are always honoured.
pub(crate) struct Hooks<'h, T, E, C> {
    pub(crate) compare: &'h dyn Fn(&T, &T) -> bool,
    pub(crate) enabled: &'h dyn Enablement,
    pub(crate) clean: Option<&'h dyn Fn(&T) -> C>,
    pub(crate) publish: &'h dyn Fn(&Observation<T, E, C>),
    pub(crate) shuffler: &'h dyn Shuffle,
}

/// The default comparator
pub(crate) fn equal<T: PartialEq>(control: &T, candidate: &T) -> bool {
    control == candidate
}

/// The default publisher
pub(crate) fn discard<T, E, C>(_: &Observation<T, E, C>) {}

impl<T, E, C> Hooks<'_, T, E, C> {
    /// The experiments `run` should execute, before shuffling. The enablement
    /// check happens exactly once here.
    pub(crate) fn select(
        &self,
        has_control: bool,
        has_candidate: bool,
    ) -> Result<Vec<Variant>, ConfigError> {
        let enabled = self.enabled.is_enabled();

        let mut selected = Vec::with_capacity(2);
        if has_control {
            selected.push(Variant::Control);
        }
        if has_candidate && enabled {
            selected.push(Variant::Candidate);
        }

        if selected.is_empty() {
            return Err(ConfigError::NoExperiments);
        }

        tracing::trace!(enabled, ?selected, "selected experiments");
        Ok(selected)
    }

    pub(crate) fn shuffle(&self, selected: &[Variant]) -> Vec<Variant> {
        self.shuffler.shuffle(selected)
    }

    /// Builds the observation for one call, publishes it, and hands back the
    /// outcome of the `observed` path.
    pub(crate) fn conclude(
        &self,
        name: &str,
        execution_order: Vec<Variant>,
        results: Vec<Execution<T, E>>,
        observed: Variant,
    ) -> Result<Option<T>, RunError<E>> {
        let observation = self.observe(name, execution_order, results);
        (self.publish)(&observation);

        for variant in &observation.execution_order {
            if *variant == observed {
                continue;
            }
            if let Some(failure) = observation.outcome(*variant).and_then(Outcome::error) {
                tracing::warn!(
                    %variant,
                    panicked = failure.is_panic(),
                    "unobserved experiment failed, result discarded"
                );
            }
        }

        observation
            .into_result(observed)
            .transpose()
            .map_err(RunError::Experiment)
    }

    fn observe(
        &self,
        name: &str,
        execution_order: Vec<Variant>,
        results: Vec<Execution<T, E>>,
    ) -> Observation<T, E, C> {
        let Formatted {
            error,
            mut control,
            mut candidate,
        } = format(results);

        // equality is judged on raw values, before any cleaning
        let matched = match (
            control.as_ref().and_then(Outcome::value),
            candidate.as_ref().and_then(Outcome::value),
        ) {
            (Some(control), Some(candidate)) => (self.compare)(control, candidate),
            _ => false,
        };

        if let Some(clean) = &self.clean {
            for outcome in control.iter_mut().chain(candidate.iter_mut()) {
                outcome.cleaned_value = outcome.value().map(|value| clean(value));
            }
        }

        record_metrics(name, Variant::Control, control.as_ref());
        record_metrics(name, Variant::Candidate, candidate.as_ref());

        if control.is_some() && candidate.is_some() && !matched {
            metrics::counter!("scientist_experiment_mismatch", "name" => name.to_owned())
                .increment(1);
            tracing::debug!("control and candidate did not match");
        }

        Observation {
            name: name.to_owned(),
            execution_order,
            control,
            candidate,
            error,
            matched,
        }
    }
}

fn record_metrics<T, E, C>(name: &str, variant: Variant, outcome: Option<&Outcome<T, E, C>>) {
    let outcome = match outcome {
        Some(outcome) => outcome,
        None => return,
    };

    metrics::counter!(
        "scientist_experiment_run_variant",
        "name" => name.to_owned(),
        "variant" => variant.as_str()
    )
    .increment(1);
    metrics::histogram!(
        "scientist_experiment_duration_seconds",
        "name" => name.to_owned(),
        "variant" => variant.as_str()
    )
    .record(outcome.duration.as_secs_f64());

    if outcome.is_err() {
        metrics::counter!(
            "scientist_experiment_error",
            "name" => name.to_owned(),
            "variant" => variant.as_str()
        )
        .increment(1);
    }
}
