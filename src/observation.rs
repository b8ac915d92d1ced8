use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, Failure};

/// Which of the two code paths an execution belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The trusted, currently-live code path. Its outcome is what callers see.
    Control,

    /// The new code path being evaluated. Its outcome is only ever recorded.
    Candidate,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Control => "control",
            Variant::Candidate => "candidate",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control" => Ok(Variant::Control),
            "candidate" => Ok(Variant::Candidate),
            other => Err(ConfigError::InvalidRunType(other.to_owned())),
        }
    }
}

/// One path's result as it appears in an [`Observation`]
#[derive(Debug)]
pub struct Outcome<T, E, C = T> {
    /// The value the function produced, or how it failed
    pub result: Result<T, Failure<E>>,

    /// The output of the cleaner, if one is registered and the function
    /// produced a value
    pub cleaned_value: Option<C>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

impl<T, E, C> Outcome<T, E, C> {
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Failure<E>> {
        self.result.as_ref().err()
    }

    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }
}

/// The record handed to the publish callback, built fresh for every call to
/// `run` or `run_only`.
#[derive(Debug)]
pub struct Observation<T, E, C = T> {
    /// The experiment's name
    pub name: String,

    /// The order the experiment functions were invoked in. Under the
    /// suspending runner this can differ from the order they finished in.
    pub execution_order: Vec<Variant>,

    pub control: Option<Outcome<T, E, C>>,
    pub candidate: Option<Outcome<T, E, C>>,

    /// Whether either the control or candidate failed
    pub error: bool,

    /// Whether control and candidate produced equivalent raw values. Always
    /// `false` unless both ran and both produced a value.
    pub matched: bool,
}

impl<T, E, C> Observation<T, E, C> {
    pub fn outcome(&self, variant: Variant) -> Option<&Outcome<T, E, C>> {
        match variant {
            Variant::Control => self.control.as_ref(),
            Variant::Candidate => self.candidate.as_ref(),
        }
    }

    /// Takes the observed path's result out of the record so it can be given
    /// back to the caller.
    pub(crate) fn into_result(self, variant: Variant) -> Option<Result<T, E>> {
        let outcome = match variant {
            Variant::Control => self.control,
            Variant::Candidate => self.candidate,
        };

        outcome.map(|outcome| outcome.result.map_err(Failure::surface))
    }
}
