//! Staging buffer between fetch workers and the page loader

use parking_lot::Mutex;

/// A fetched page waiting to be persisted and indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPage {
    /// Canonical URL of the page
    pub url: String,
    pub status_code: u16,
    pub html: String,
}

/// Many-producer, single-consumer buffer of fetched pages
#[derive(Debug, Default)]
pub struct StagingBuffer {
    pages: Mutex<Vec<StagedPage>>,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, page: StagedPage) {
        self.pages.lock().push(page);
    }

    /// Removes up to `max` pages, oldest first
    pub fn drain(&self, max: usize) -> Vec<StagedPage> {
        let mut pages = self.pages.lock();
        let count = max.min(pages.len());
        pages.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.pages.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> StagedPage {
        StagedPage {
            url: url.to_string(),
            status_code: 200,
            html: String::new(),
        }
    }

    #[test]
    fn test_drain_respects_cap_and_order() {
        let buffer = StagingBuffer::new();
        for i in 0..5 {
            buffer.push(page(&format!("u{}", i)));
        }

        let batch = buffer.drain(3);
        assert_eq!(
            batch.iter().map(|p| p.url.as_str()).collect::<Vec<_>>(),
            vec!["u0", "u1", "u2"]
        );
        assert_eq!(buffer.len(), 2);

        assert_eq!(buffer.drain(10).len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.drain(10).is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let buffer = std::sync::Arc::new(StagingBuffer::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let buffer = std::sync::Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        buffer.push(page(&format!("w{}-{}", worker, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(buffer.len(), 400);
    }
}
