use std::future::Future;
use std::pin::Pin;

/// A long-running poller that observes remote services and publishes events
///
/// `run` loops until the collector's shutdown signal fires; `close` releases
/// remote connections and is called once after `run` has returned.
pub trait Collector: Send {
    /// Poll on a fixed period until shutdown
    fn run<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Release held connections; safe to call once `run` is done
    fn close<'a>(&'a mut self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}
