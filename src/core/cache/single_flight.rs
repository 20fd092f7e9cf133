// ─── Single Flight ───
// Run-or-join: at most one refresh per cache is in flight. Callers arriving
// while it runs await the same shared future and observe the same outcome.

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

type Flight<E> = Shared<BoxFuture<'static, Result<(), E>>>;

pub struct SingleFlight<E> {
    current: Mutex<Option<Flight<E>>>,
}

impl<E> Default for SingleFlight<E> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl<E> SingleFlight<E>
where
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the running flight, or start one with `start` if none is running.
    ///
    /// `start` is only called when this caller begins a new flight.
    pub async fn run_or_join<F, Fut>(&self, start: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let flight = {
            let mut current = self.current.lock().await;
            match current.as_ref() {
                Some(running) if running.peek().is_none() => running.clone(),
                _ => {
                    let flight = start().boxed().shared();
                    *current = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }
}
