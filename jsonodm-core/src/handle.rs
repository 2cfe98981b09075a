//! One-time asynchronous initialization of shared handles.
//!
//! [`SharedCell`] holds a value that is created on first use and then handed out
//! to every caller for the life of the cell. Store backends use it for the
//! process-wide client connection.

use std::{fmt, future::Future, sync::Arc};

use mea::rwlock::RwLock;

use crate::error::DocumentStoreResult;

/// A lazily initialized, shared value.
///
/// Initialization runs under an exclusive lock: when several tasks race to use
/// an empty cell, exactly one initializer runs and all of them observe the same
/// [`Arc`]. A failed initializer leaves the cell empty for the next caller.
pub struct SharedCell<T> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T> SharedCell<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// Returns the value if it has been initialized.
    pub async fn get(&self) -> Option<Arc<T>> {
        self.value.read().await.clone()
    }

    /// Returns the value, creating it with `init` if the cell is empty.
    ///
    /// # Errors
    ///
    /// Returns whatever `init` fails with; the cell stays empty in that case.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> DocumentStoreResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DocumentStoreResult<T>>,
    {
        if let Some(value) = self.value.read().await.as_ref() {
            return Ok(Arc::clone(value));
        }

        let mut guard = self.value.write().await;

        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(init().await?);
        *guard = Some(Arc::clone(&value));

        Ok(value)
    }
}

impl<T> Default for SharedCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCell").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::DocumentStoreError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_initializes_once() {
        let cell = Arc::new(SharedCell::<String>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let calls = Arc::clone(&calls);

                tokio::spawn(async move {
                    cell.get_or_try_init(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok("client".to_string())
                    })
                    .await
                    .unwrap()
                })
            })
            .collect::<Vec<_>>();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handles.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[tokio::test]
    async fn failed_init_leaves_cell_empty() {
        let cell = SharedCell::<u32>::new();

        let failed = cell
            .get_or_try_init(|| async { Err(DocumentStoreError::Configuration("nope".into())) })
            .await;

        assert!(failed.is_err());
        assert!(cell.get().await.is_none());

        let value = cell.get_or_try_init(|| async { Ok(7) }).await.unwrap();

        assert_eq!(*value, 7);
        assert!(Arc::ptr_eq(&cell.get().await.unwrap(), &value));
    }
}
