//! "Ontology ready" signal.
//!
//! Loading happens once, outside the query core. Consumers either see the
//! signal already raised or park until it is.

use tokio::sync::watch;

use crate::error::{QueryError, QueryResult};

/// Sender half, held by whoever loads the ontology.
#[derive(Debug)]
pub struct OntologyReady {
    tx: watch::Sender<bool>,
}

/// Receiver half, cloned into every session.
#[derive(Debug, Clone)]
pub struct ReadyListener {
    rx: watch::Receiver<bool>,
}

impl OntologyReady {
    pub fn new() -> (Self, ReadyListener) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ReadyListener { rx })
    }

    /// Raise the signal. Idempotent.
    pub fn mark_loaded(&self) {
        self.tx.send_replace(true);
        tracing::info!("ontology ready");
    }

    pub fn listener(&self) -> ReadyListener {
        ReadyListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl ReadyListener {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the ontology is loaded.
    ///
    /// Fails with [`QueryError::NotReady`] if the loader goes away without
    /// ever raising the signal.
    pub async fn wait(&mut self) -> QueryResult<()> {
        self.rx
            .wait_for(|loaded| *loaded)
            .await
            .map(|_| ())
            .map_err(|_| QueryError::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_once_marked() {
        let (ready, mut listener) = OntologyReady::new();
        assert!(!listener.is_ready());
        ready.mark_loaded();
        listener.wait().await.unwrap();
        assert!(listener.is_ready());
    }

    #[tokio::test]
    async fn late_listener_sees_signal() {
        let (ready, _first) = OntologyReady::new();
        ready.mark_loaded();
        let mut late = ready.listener();
        late.wait().await.unwrap();
    }

    #[tokio::test]
    async fn dropped_loader_reports_not_ready() {
        let (ready, mut listener) = OntologyReady::new();
        drop(ready);
        assert!(matches!(listener.wait().await, Err(QueryError::NotReady)));
    }
}
