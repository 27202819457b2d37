//! Catch-and-convert adapter around calls into user code.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::Fault;

/// Run `f`, turning both a returned error and a panic into a [`Fault`].
///
/// This is the only place the runtime catches unwinding. Each call site
/// (command body, `init`, `update`, `view`) goes through it once.
pub fn isolate<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<T, Fault>
where
    E: Into<Fault>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into()),
        Err(payload) => Err(Fault::from_panic(payload.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn passes_values_through() {
        let out = isolate(|| Ok::<_, ModelError>(5));
        assert_eq!(out.ok(), Some(5));
    }

    #[test]
    fn converts_errors() {
        let out = isolate(|| Err::<(), _>(ModelError::new("nope")));
        let fault = out.unwrap_err();
        assert!(!fault.is_panic());
        assert_eq!(fault.to_string(), "nope");
    }

    #[test]
    fn catches_panics() {
        let out = isolate(|| -> Result<(), ModelError> { panic!("kaboom {}", 1) });
        assert_eq!(out.unwrap_err().to_string(), "panicked: kaboom 1");
    }
}
