//! Running a single experiment function, timing it, and catching whatever it
//! throws so that nothing escapes into the caller's control flow.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::error::Failure;
use crate::observation::Variant;

/// The timed result of running one experiment function
#[derive(Debug)]
pub struct Execution<T, E> {
    pub variant: Variant,
    pub result: Result<T, Failure<E>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `finished_at - started_at`
    pub duration: Duration,
}

impl<T, E> Execution<T, E> {
    fn finish(variant: Variant, result: Result<T, Failure<E>>, started_at: DateTime<Utc>) -> Self {
        let finished_at = Utc::now();
        // the wall clock may step backwards between the two reads
        let duration = (finished_at - started_at).to_std().unwrap_or_default();

        tracing::debug!(
            %variant,
            ?duration,
            failed = result.is_err(),
            "experiment executed"
        );

        Self {
            variant,
            result,
            started_at,
            finished_at,
            duration,
        }
    }
}

/// Runs `f` to completion on the current thread.
pub fn execute<T, E, F>(variant: Variant, f: F) -> Execution<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let started_at = Utc::now();
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(Failure::Error),
        Err(payload) => Err(Failure::Panic(payload)),
    };

    Execution::finish(variant, result, started_at)
}

/// Invokes `f` and awaits the future it returns. A panic while building the
/// future or while polling it is captured the same way.
pub async fn execute_async<T, E, F, Fut>(variant: Variant, f: F) -> Execution<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(future) => match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result.map_err(Failure::Error),
            Err(payload) => Err(Failure::Panic(payload)),
        },
        Err(payload) => Err(Failure::Panic(payload)),
    };

    Execution::finish(variant, result, started_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::thread;

    #[test]
    fn captures_the_value_and_timing() {
        let calls = Cell::new(0);
        let execution = execute::<_, (), _>(Variant::Control, || {
            calls.set(calls.get() + 1);
            thread::sleep(Duration::from_millis(5));
            Ok(12)
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(execution.variant, Variant::Control);
        assert_eq!(execution.result.ok(), Some(12));
        assert!(execution.finished_at >= execution.started_at);
        assert_eq!(
            execution.duration,
            (execution.finished_at - execution.started_at)
                .to_std()
                .unwrap()
        );
        assert!(execution.duration >= Duration::from_millis(5));
    }

    #[test]
    fn captures_returned_errors() {
        let execution = execute::<(), _, _>(Variant::Candidate, || Err("error"));

        assert_eq!(execution.variant, Variant::Candidate);
        match execution.result {
            Err(Failure::Error(error)) => assert_eq!(error, "error"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn captures_panics() {
        let execution = execute::<(), (), _>(Variant::Control, || panic!("exploded"));

        let failure = execution.result.unwrap_err();
        assert!(failure.is_panic());
        assert_eq!(failure.panic_message(), Some("exploded"));
    }

    #[tokio::test]
    async fn awaits_the_value() {
        let execution =
            execute_async::<_, (), _, _>(Variant::Control, || async { Ok(20) }).await;

        assert_eq!(execution.result.ok(), Some(20));
        assert!(execution.finished_at >= execution.started_at);
    }

    #[tokio::test]
    async fn captures_rejected_futures() {
        let execution =
            execute_async::<(), _, _, _>(Variant::Candidate, || async { Err("error") }).await;

        assert_eq!(execution.result.unwrap_err().error(), Some(&"error"));
    }

    async fn explode() -> Result<(), ()> {
        panic!("polled")
    }

    #[tokio::test]
    async fn captures_panics_while_polling() {
        let execution = execute_async(Variant::Control, explode).await;

        assert_eq!(execution.result.unwrap_err().panic_message(), Some("polled"));
    }

    #[test]
    fn captures_panics_while_invoking() {
        let execution = tokio_test::block_on(execute_async::<(), (), _, _>(
            Variant::Control,
            || -> futures::future::Ready<Result<(), ()>> { panic!("invoked") },
        ));

        assert_eq!(execution.result.unwrap_err().panic_message(), Some("invoked"));
    }
}
