//! Named rendezvous points ("cues").
//!
//! A signal is a counter behind a `watch` channel. Emitting bumps the counter
//! and wakes everyone currently listening on that name. A listener remembers
//! the last count it saw, so an emit that lands between "check my condition"
//! and "go to sleep" still wakes it; several emits in a row collapse into a
//! single wake, which is why waiters re-check their condition in a loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::trace;

#[derive(Clone, Default)]
pub struct Signals {
    names: Arc<Mutex<HashMap<String, watch::Sender<u64>>>>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_sender<R>(&self, name: &str, f: impl FnOnce(&watch::Sender<u64>) -> R) -> R {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = names
            .entry(name.to_string())
            .or_insert_with(|| watch::Sender::new(0));
        f(tx)
    }

    pub fn emit(&self, name: &str) {
        trace!(signal = name, "emit");
        self.with_sender(name, |tx| tx.send_modify(|count| *count += 1));
    }

    /// Arms a listener now; it fires on the next emit of `name`.
    pub fn listen(&self, name: &str) -> SignalListener {
        let rx = self.with_sender(name, |tx| tx.subscribe());
        SignalListener { rx }
    }

    /// Waits for the next emit of `name`. The listener is armed when this is
    /// called, not when the future is first polled, so an emit in between
    /// still counts.
    pub fn wait(&self, name: &str) -> impl Future<Output = ()> + Send + use<> {
        let mut listener = self.listen(name);
        async move { listener.wait().await }
    }

    /// How many times `name` has fired so far.
    pub fn emitted(&self, name: &str) -> u64 {
        self.with_sender(name, |tx| *tx.borrow())
    }
}

pub struct SignalListener {
    rx: watch::Receiver<u64>,
}

impl SignalListener {
    pub async fn wait(&mut self) {
        // the bus keeps every sender alive, so this only errs if the bus is
        // gone, and then nobody is left to emit anyway
        if self.rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emit_wakes_current_waiters() {
        let signals = Signals::new();
        let mut a = signals.listen("intro_played");
        let mut b = signals.listen("intro_played");

        let bus = signals.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            bus.emit("intro_played");
        });

        a.wait().await;
        b.wait().await;
        assert_eq!(signals.emitted("intro_played"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn emit_before_await_is_not_lost() {
        let signals = Signals::new();
        let mut listener = signals.listen("verse");
        signals.emit("verse");
        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .expect("armed listener missed an emit");
    }

    #[tokio::test(start_paused = true)]
    async fn emits_before_listening_are_not_replayed() {
        let signals = Signals::new();
        signals.emit("verse");
        let mut listener = signals.listen("verse");
        let woke = tokio::time::timeout(Duration::from_secs(5), listener.wait()).await;
        assert!(woke.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_emits_coalesce() {
        let signals = Signals::new();
        let mut listener = signals.listen("p");
        signals.emit("p");
        signals.emit("p");
        listener.wait().await;
        let again = tokio::time::timeout(Duration::from_secs(5), listener.wait()).await;
        assert!(again.is_err());
        assert_eq!(signals.emitted("p"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_armed_before_it_is_awaited() {
        let signals = Signals::new();
        let done = signals.wait("outro_played");
        signals.emit("outro_played");
        tokio::time::timeout(Duration::from_secs(1), done)
            .await
            .expect("wait missed an emit made after it was called");
    }

    #[test]
    fn names_are_independent() {
        let signals = Signals::new();
        signals.emit("a");
        assert_eq!(signals.emitted("a"), 1);
        assert_eq!(signals.emitted("b"), 0);
    }
}
