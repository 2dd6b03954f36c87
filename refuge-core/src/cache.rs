//! The candidate cache.
//!
//! An unordered arena of positions that passed static validation. Order is
//! irrelevant, so removal swaps the last element into the hole.

use rand::Rng;

use crate::position::Position;

/// Index of a candidate returned by [`CandidateCache::draw`].
///
/// Only valid until the next mutation of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateHandle(usize);

/// Statically valid positions waiting to be handed out.
#[derive(Debug, Clone, Default)]
pub struct CandidateCache {
    candidates: Vec<Position>,
}

impl CandidateCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Appends a candidate.
    pub fn insert(&mut self, position: Position) {
        self.candidates.push(position);
    }

    /// Picks a uniformly random candidate without removing it.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Option<(CandidateHandle, Position)> {
        if self.candidates.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.candidates.len());
        Some((CandidateHandle(index), self.candidates[index]))
    }

    /// Picks a uniformly random candidate position without removing it.
    pub fn draw_random<R: Rng>(&self, rng: &mut R) -> Option<Position> {
        self.draw(rng).map(|(_, position)| position)
    }

    /// Removes one candidate equal to `position`. Returns whether one was found.
    pub fn remove(&mut self, position: &Position) -> bool {
        match self.candidates.iter().position(|c| c == position) {
            Some(index) => {
                self.candidates.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes the candidate behind a handle from [`draw`](Self::draw).
    pub fn remove_at(&mut self, handle: CandidateHandle) -> Option<Position> {
        (handle.0 < self.candidates.len()).then(|| self.candidates.swap_remove(handle.0))
    }

    /// Number of cached candidates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterates over the cached candidates in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.candidates.iter()
    }

    /// Drops every candidate.
    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

impl Extend<Position> for CandidateCache {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        self.candidates.extend(iter);
    }
}
