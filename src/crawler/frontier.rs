//! Crawl frontier and visited set
//!
//! The frontier is a FIFO queue, so pages are visited breadth-first from the
//! seed. Identity is the normalized URL string.
//!
//! Invariants:
//! - a URL enters the queue only if it is not visited and not already queued
//! - a URL is marked visited when it is dispatched, before it is fetched
//! - a visited URL is never dispatched again

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Pending URLs plus the set of URLs already dispatched
#[derive(Debug, Default)]
pub struct Frontier {
    /// Queue of URLs waiting to be fetched
    queue: VecDeque<Url>,

    /// URLs currently in the queue
    pending: HashSet<String>,

    /// URLs that have been dispatched (fetch attempted or about to be)
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    pub fn new(seed: Url) -> Self {
        let mut frontier = Self::default();
        frontier.enqueue(seed);
        frontier
    }

    /// Adds a URL to the back of the queue
    ///
    /// Returns false, leaving the frontier unchanged, if the URL was already
    /// visited or is already waiting.
    pub fn enqueue(&mut self, url: Url) -> bool {
        let key = url.as_str();
        if self.visited.contains(key) || self.pending.contains(key) {
            return false;
        }
        self.pending.insert(key.to_string());
        self.queue.push_back(url);
        true
    }

    /// Pops the next URL to fetch and marks it visited
    ///
    /// URLs that became visited while waiting (for example as the target of
    /// another page's redirect) are discarded here rather than dispatched.
    pub fn dispatch(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            self.pending.remove(url.as_str());

            if !self.mark_visited(&url) {
                tracing::trace!("Skipping already visited URL: {}", url);
                continue;
            }

            return Some(url);
        }
        None
    }

    /// Marks a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Returns true if the URL has been dispatched
    #[cfg(test)]
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of URLs marked visited
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
