use crate::executor::Execution;
use crate::observation::{Outcome, Variant};

/// Executions sorted into control and candidate, ready to be published
#[derive(Debug)]
pub struct Formatted<T, E, C = T> {
    /// Whether the control or candidate failed
    pub error: bool,
    pub control: Option<Outcome<T, E, C>>,
    pub candidate: Option<Outcome<T, E, C>>,
}

/// Picks out the first execution of each variant, in whatever order they
/// arrive, and drops the variant tag. Later duplicates are discarded.
pub fn format<T, E, C>(results: Vec<Execution<T, E>>) -> Formatted<T, E, C> {
    let mut control = None;
    let mut candidate = None;

    for execution in results {
        let slot = match execution.variant {
            Variant::Control => &mut control,
            Variant::Candidate => &mut candidate,
        };

        if slot.is_none() {
            *slot = Some(Outcome {
                result: execution.result,
                cleaned_value: None,
                started_at: execution.started_at,
                finished_at: execution.finished_at,
                duration: execution.duration,
            });
        }
    }

    let error = control.as_ref().map_or(false, Outcome::is_err)
        || candidate.as_ref().map_or(false, Outcome::is_err);

    Formatted {
        error,
        control,
        candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute;

    fn ok(variant: Variant, value: i32) -> Execution<i32, &'static str> {
        execute(variant, || Ok(value))
    }

    fn err(variant: Variant) -> Execution<i32, &'static str> {
        execute(variant, || Err("yes"))
    }

    #[test]
    fn empty_input_has_no_outcomes() {
        let output: Formatted<i32, &str> = format(Vec::new());

        assert!(!output.error);
        assert!(output.control.is_none());
        assert!(output.candidate.is_none());
    }

    #[test]
    fn extracts_control() {
        let output: Formatted<_, _> = format(vec![ok(Variant::Control, 10)]);

        assert!(!output.error);
        assert_eq!(output.control.unwrap().value(), Some(&10));
        assert!(output.candidate.is_none());
    }

    #[test]
    fn extracts_candidate() {
        let output: Formatted<_, _> = format(vec![ok(Variant::Candidate, 10)]);

        assert!(!output.error);
        assert!(output.control.is_none());
        assert_eq!(output.candidate.unwrap().value(), Some(&10));
    }

    #[test]
    fn flags_a_control_error() {
        let output: Formatted<_, _> = format(vec![err(Variant::Control)]);

        assert!(output.error);
        assert!(output.control.unwrap().is_err());
    }

    #[test]
    fn flags_a_candidate_error() {
        let output: Formatted<_, _> =
            format(vec![ok(Variant::Control, 1), err(Variant::Candidate)]);

        assert!(output.error);
        assert_eq!(output.control.unwrap().value(), Some(&1));
        assert!(output.candidate.unwrap().is_err());
    }

    #[test]
    fn lookup_is_by_variant_not_position() {
        let output: Formatted<_, _> = format(vec![
            ok(Variant::Candidate, 2),
            ok(Variant::Control, 1),
            ok(Variant::Control, 3),
        ]);

        assert_eq!(output.control.unwrap().value(), Some(&1));
        assert_eq!(output.candidate.unwrap().value(), Some(&2));
    }

    #[test]
    fn keeps_timing() {
        let execution = ok(Variant::Control, 1);
        let (started_at, duration) = (execution.started_at, execution.duration);
        let output: Formatted<_, _> = format(vec![execution]);

        let control = output.control.unwrap();
        assert_eq!(control.started_at, started_at);
        assert_eq!(control.duration, duration);
        assert!(control.cleaned_value.is_none());
    }
}
