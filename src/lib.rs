//! Scientist provides the `Experiment` and `AsyncExperiment` structs, which run
//! a trusted "control" code path beside an experimental "candidate", compare
//! what they return, and publish the comparison, while the caller only ever
//! sees the control's result.
//!
//! Say an account lookup is served from Postgres today and a new
//! implementation reads it from a redis cache instead. The redis version
//! should see real traffic before anyone relies on it, every disagreement
//! with Postgres should be reported, and callers should keep getting the
//! Postgres answer whatever redis returns. An `AsyncExperiment` covers this:
//!
//! ```
//! use scientist::{AsyncExperiment, Gate};
//!
//! async fn account_from_postgres(id: i32) -> Result<i32, String> { Ok(id) }
//! async fn account_from_redis(_id: i32) -> Result<i32, String> { Err("cache miss".into()) }
//!
//! # tokio_test::block_on(async {
//! let id = 4;
//! let mut experiment: AsyncExperiment<i32, String> =
//!     AsyncExperiment::new("account-cache").unwrap();
//! experiment
//!     .control(move || account_from_postgres(id))
//!     .candidate(move || account_from_redis(id))
//!     .enabled(Gate::Enabled)
//!     .publish(|observation| {
//!         if !observation.matched {
//!             eprintln!(
//!                 "account lookups disagree: postgres={:?} redis={:?}",
//!                 observation.control.as_ref().and_then(|o| o.value()),
//!                 observation.candidate.as_ref().and_then(|o| o.value()),
//!             );
//!         }
//!     });
//!
//! // the redis failure is published, the postgres value is returned
//! let result = experiment.run().await;
//! assert_eq!(result.unwrap(), Some(4));
//! # });
//! ```
//!
//! The blocking `Experiment` has the same surface for plain functions. Which
//! path runs first is randomised on every call; `run_only` skips that and the
//! enablement check to run one named path. Blocking functions may borrow from
//! the caller and need not be `Send`:
//!
//! ```
//! use scientist::{Experiment, Variant};
//!
//! let input = String::from("42");
//! let mut experiment: Experiment<u64, String> = Experiment::new("parser rewrite").unwrap();
//! experiment
//!     .control(|| input.parse().map_err(|e: std::num::ParseIntError| e.to_string()))
//!     .candidate(|| Err("not implemented".to_owned()));
//!
//! assert_eq!(experiment.run().unwrap(), Some(42));
//!
//! let err = experiment.run_only(Variant::Candidate).unwrap_err();
//! assert_eq!(err.into_experiment().as_deref(), Some("not implemented"));
//! ```

pub mod async_experiment;
pub mod enabled;
pub mod error;
pub mod executor;
pub mod experiment;
pub mod format;
mod hooks;
pub mod observation;
pub mod shuffle;

pub use async_experiment::AsyncExperiment;
pub use enabled::{Enablement, Gate};
pub use error::{ConfigError, Failure, RunError};
pub use experiment::Experiment;
pub use observation::{Observation, Outcome, Variant};
pub use shuffle::{SeededShuffle, Shuffle, ThreadRngShuffle};
