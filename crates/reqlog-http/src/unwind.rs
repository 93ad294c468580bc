//! Full traces across cause chains.

use std::error::Error;

use crate::error::RequestError;

/// Separator placed between the trace of an error and the trace of its cause.
pub const CAUSE_SEPARATOR: &str = "\nCaused by: ";

/// Maximum number of levels (the error itself included) rendered into one trace.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// Render the trace of `err` followed by the traces of its causes, outermost first.
///
/// Each level contributes its captured trace when it is a [`RequestError`] that still has one,
/// and its `Display` output otherwise. Chains longer than [`MAX_CAUSE_DEPTH`] are cut off.
#[must_use]
pub fn full_stack(err: &(dyn Error + 'static)) -> String {
    let mut trace = level_trace(err);
    let mut cause = err.source();
    let mut depth = 1;
    while let Some(next) = cause {
        if depth >= MAX_CAUSE_DEPTH {
            break;
        }
        trace.push_str(CAUSE_SEPARATOR);
        trace.push_str(&level_trace(next));
        cause = next.source();
        depth += 1;
    }
    trace
}

fn level_trace(err: &(dyn Error + 'static)) -> String {
    err.downcast_ref::<RequestError>()
        .and_then(RequestError::stack)
        .map_or_else(|| err.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::{self, Display, Formatter};

    #[derive(Debug)]
    struct Looping;

    impl Display for Looping {
        fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
            formatter.write_str("looping")
        }
    }

    impl Error for Looping {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&Looping)
        }
    }

    #[test]
    fn single_level_uses_own_trace() {
        let err = RequestError::new("Error", "alone");
        assert_eq!(full_stack(&err), err.stack().unwrap_or_default());
    }

    #[test]
    fn two_level_chain_is_joined_outer_then_inner() {
        let inner = RequestError::new("Error", "inner failure");
        let outer = RequestError::new("Error", "outer failure").with_cause(inner);
        let trace = full_stack(&outer);

        let (head, tail) = trace
            .split_once(CAUSE_SEPARATOR)
            .unwrap_or((trace.as_str(), ""));
        assert!(head.starts_with("Error: outer failure"));
        assert!(tail.starts_with("Error: inner failure"));
        assert_eq!(trace.matches("Caused by: ").count(), 1);
    }

    #[test]
    fn foreign_errors_fall_back_to_display() {
        let err = std::io::Error::other("plain io");
        assert_eq!(full_stack(&err), "plain io");
    }

    #[test]
    fn cyclic_chain_is_capped() {
        let trace = full_stack(&Looping);
        assert_eq!(trace.matches("Caused by: ").count(), MAX_CAUSE_DEPTH - 1);
    }
}
