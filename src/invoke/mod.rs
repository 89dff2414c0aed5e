//! Invocable units of work
//!
//! An [`Invoker`] wraps the test logic that gets executed repeatedly. It must
//! be callable over and over again, concurrently from several workers.

use std::fmt;

/// Boxed error returned by a failing invocation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A unit of work that a runner executes once per invocation
pub trait Invoker: Send + Sync {
    /// Identifier used in logs and error messages
    fn id(&self) -> &str;

    /// Execute the unit of work once
    fn invoke(&self) -> Result<(), BoxError>;
}

/// Invoker backed by a closure
pub struct FnInvoker<F> {
    id: String,
    f: F,
}

impl<F, E> FnInvoker<F>
where
    F: Fn() -> Result<(), E> + Send + Sync,
    E: Into<BoxError>,
{
    /// Wrap `f` under the given id
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<F, E> Invoker for FnInvoker<F>
where
    F: Fn() -> Result<(), E> + Send + Sync,
    E: Into<BoxError>,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self) -> Result<(), BoxError> {
        (self.f)().map_err(Into::into)
    }
}

impl<F> fmt::Debug for FnInvoker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInvoker").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fn_invoker_calls_closure() {
        let calls = AtomicUsize::new(0);
        let invoker = FnInvoker::new("count", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });

        invoker.invoke().unwrap();
        invoker.invoke().unwrap();
        assert_eq!(invoker.id(), "count");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fn_invoker_converts_error() {
        let invoker = FnInvoker::new("io", || {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
        });
        let err = invoker.invoke().unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
    }
}
