//! Play queue
//!
//! Keeps two views of the same songs:
//! - Play order: what next/previous walk through (shuffled or not)
//! - Original order: the list as the caller supplied it, so shuffle can be
//!   switched off without losing it
//!
//! ```text
//! original: [A, B, C, D]
//! play:     [C, A, D, B]   (shuffle on)
//!               ^ current_index = 1 → A is loaded
//! ```

use crate::shuffle::Shuffler;
use crate::types::{Song, SongId};

/// Ordered queue with shuffle support and index-based navigation
#[derive(Debug, Clone)]
pub struct PlayQueue {
    /// Songs in the order currently in effect
    songs: Vec<Song>,

    /// Songs in caller-supplied order
    original: Vec<Song>,

    /// Position of the loaded song in `songs`
    current: Option<usize>,

    shuffler: Shuffler,
}

impl PlayQueue {
    /// Create an empty queue
    pub fn new(shuffler: Shuffler) -> Self {
        Self {
            songs: Vec::new(),
            original: Vec::new(),
            current: None,
            shuffler,
        }
    }

    /// Replace the queue with a new context list
    ///
    /// `context` becomes the original order; the play order is a shuffled
    /// copy when `shuffle` is set. The current index points at `playing`
    /// inside the play order, or is cleared if it is not a member.
    pub fn set_context(&mut self, context: Vec<Song>, shuffle: bool, playing: &SongId) {
        self.songs = if shuffle {
            self.shuffler.shuffled(&context)
        } else {
            context.clone()
        };
        self.original = context;
        self.current = self.position_of(playing);
    }

    /// Rebuild the play order from the original order
    ///
    /// Shuffled copy when `shuffle` is set, exact copy otherwise. The index
    /// follows `playing`, falling back to 0 when it cannot be found.
    /// Returns false (and changes nothing) when there is no original order.
    pub fn reorder(&mut self, shuffle: bool, playing: Option<&SongId>) -> bool {
        if self.original.is_empty() {
            return false;
        }

        self.songs = if shuffle {
            self.shuffler.shuffled(&self.original)
        } else {
            self.original.clone()
        };
        self.current = Some(playing.and_then(|id| self.position_of(id)).unwrap_or(0));
        true
    }

    /// Append a song to both orders
    pub fn push(&mut self, song: Song) {
        self.songs.push(song.clone());
        self.original.push(song);
    }

    /// Index `next` would move to
    ///
    /// `None` means there is nowhere to go: empty queue, or end reached
    /// without `wrap`.
    pub fn next_index(&self, wrap: bool) -> Option<usize> {
        if self.songs.is_empty() {
            return None;
        }

        let next = self.current.map_or(0, |index| index + 1);
        if next < self.songs.len() {
            Some(next)
        } else if wrap {
            Some(0)
        } else {
            None
        }
    }

    /// Index `previous` would move to
    ///
    /// Never wraps backwards.
    pub fn previous_index(&self) -> Option<usize> {
        match self.current {
            Some(index) if index > 0 && index <= self.songs.len() => Some(index - 1),
            _ => None,
        }
    }

    /// Move the current index and return the song there
    pub fn select(&mut self, index: usize) -> Option<&Song> {
        let song = self.songs.get(index)?;
        self.current = Some(index);
        Some(song)
    }

    /// Position of a song in the play order
    pub fn position_of(&self, id: &SongId) -> Option<usize> {
        self.songs.iter().position(|song| &song.id == id)
    }

    /// Current position in the play order
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Songs in play order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Songs in original order
    pub fn original_order(&self) -> &[Song] {
        &self.original
    }

    /// Song at index in play order
    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    /// Number of songs in the play order
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new(Shuffler::default())
    }
}
