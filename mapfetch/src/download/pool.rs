//! Mirror pool bookkeeping for the download scheduler.
//!
//! The pool tracks which of the configured mirror servers are idle and which
//! are bound to an in-flight chunk. The set of mirrors is fixed at
//! construction; binding and release happen only through the scheduler.

use crate::error::{DownloadError, DownloadResult};

/// One mirror server and its current binding.
///
/// `assigned` is `None` while the mirror is idle, or the index of the chunk
/// it is currently downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    /// Base URL of the mirror.
    pub url: String,
    /// Index of the chunk bound to this mirror, if any.
    pub assigned: Option<usize>,
}

/// Fixed, ordered pool of mirror servers.
#[derive(Debug, Clone)]
pub struct ServerPool {
    mirrors: Vec<Mirror>,
}

impl ServerPool {
    /// Create a pool from an ordered list of mirror URLs.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NoMirrors`] if the list is empty.
    pub fn new(urls: Vec<String>) -> DownloadResult<Self> {
        if urls.is_empty() {
            return Err(DownloadError::NoMirrors);
        }

        let mirrors = urls
            .into_iter()
            .map(|url| Mirror {
                url,
                assigned: None,
            })
            .collect();

        Ok(Self { mirrors })
    }

    /// Total number of configured mirrors.
    ///
    /// A static capacity figure: callers use it to bound how many transfers
    /// they run concurrently, regardless of how many mirrors are busy right
    /// now.
    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    /// All mirrors, in configuration order.
    pub fn mirrors(&self) -> &[Mirror] {
        &self.mirrors
    }

    /// Index of the first idle mirror, if any.
    pub fn first_idle(&self) -> Option<usize> {
        self.mirrors.iter().position(|m| m.assigned.is_none())
    }

    /// Number of mirrors currently bound to a chunk.
    pub fn busy_count(&self) -> usize {
        self.mirrors.iter().filter(|m| m.assigned.is_some()).count()
    }

    /// Bind the mirror at `mirror_index` to `chunk_index`.
    pub fn bind(&mut self, mirror_index: usize, chunk_index: usize) {
        debug_assert!(
            self.mirrors[mirror_index].assigned.is_none(),
            "mirror {} already bound",
            mirror_index
        );
        self.mirrors[mirror_index].assigned = Some(chunk_index);
    }

    /// Drop every binding, returning all mirrors to idle.
    ///
    /// Used when the chunk table is rebuilt mid-session.
    pub fn clear_bindings(&mut self) {
        for mirror in &mut self.mirrors {
            mirror.assigned = None;
        }
    }

    /// Release whichever mirror is bound to `chunk_index`.
    ///
    /// Returns the mirror's URL, or `None` if no mirror was bound to that
    /// chunk.
    pub fn release(&mut self, chunk_index: usize) -> Option<String> {
        let mirror = self
            .mirrors
            .iter_mut()
            .find(|m| m.assigned == Some(chunk_index))?;
        mirror.assigned = None;
        Some(mirror.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ServerPool {
        ServerPool::new(vec!["http://a".to_string(), "http://b".to_string()]).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            ServerPool::new(Vec::new()),
            Err(DownloadError::NoMirrors)
        ));
    }

    #[test]
    fn test_mirror_count_is_static() {
        let mut pool = pool();
        assert_eq!(pool.mirror_count(), 2);

        pool.bind(0, 7);
        assert_eq!(pool.mirror_count(), 2);
        assert_eq!(pool.busy_count(), 1);
    }

    #[test]
    fn test_first_idle_in_order() {
        let mut pool = pool();
        assert_eq!(pool.first_idle(), Some(0));

        pool.bind(0, 1);
        assert_eq!(pool.first_idle(), Some(1));

        pool.bind(1, 2);
        assert_eq!(pool.first_idle(), None);
    }

    #[test]
    fn test_release_returns_url() {
        let mut pool = pool();
        pool.bind(1, 5);

        assert_eq!(pool.release(5), Some("http://b".to_string()));
        assert_eq!(pool.first_idle(), Some(0));
        assert_eq!(pool.release(5), None);
    }
}
