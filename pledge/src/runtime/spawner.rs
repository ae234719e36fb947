use super::dispatch::{ContextId, Spawner, WorkerJob};
use crate::error::{ErrorKind, Result};

use std::cell::Cell;
use std::thread;

/// Spawner that gives every worker context its own OS thread.
///
/// Threads are detached and named `<prefix>-<n>`; the relay protocol,
/// not a join handle, is what carries the result back.
pub struct ThreadSpawner {
    prefix: String,
    stack_size: Option<usize>,
    spawned: Cell<usize>,
}

impl ThreadSpawner {
    pub fn new(prefix: impl Into<String>, stack_size: Option<usize>) -> Self {
        Self {
            prefix: prefix.into(),
            stack_size,
            spawned: Cell::new(0),
        }
    }

    /// Number of workers started so far.
    pub fn spawned(&self) -> usize {
        self.spawned.get()
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: WorkerJob) -> Result<ContextId> {
        let id = ContextId::next();
        let n = self.spawned.get();

        let mut builder = thread::Builder::new().name(format!("{}-{}", self.prefix, n));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        builder
            .spawn(move || {
                tracing::trace!(worker = %id, "worker context started");
                job();
            })
            .map_err(|err| ErrorKind::Spawn(err.to_string()))?;

        self.spawned.set(n + 1);
        tracing::debug!(worker = %id, thread = n, "spawned worker context");

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadSpawner;
    use crate::runtime::Spawner;

    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn counts_and_names_workers() {
        let spawner = ThreadSpawner::new("unit", None);
        let (tx, rx) = mpsc::channel();
        assert_eq!(spawner.spawned(), 0);

        for _ in 0..2 {
            let tx = tx.clone();
            spawner
                .spawn(Box::new(move || {
                    let _ = tx.send(thread::current().name().map(str::to_owned));
                }))
                .unwrap();
        }

        assert_eq!(spawner.spawned(), 2);

        let mut names: Vec<_> = rx.iter().take(2).flatten().collect();
        names.sort();
        assert_eq!(names, vec!["unit-0", "unit-1"]);
    }
}
