//! Song arena and play order
//!
//! ```text
//! slots (arena, append-only):  [A] [B] [ ] [D] [E]      (slot 2 removed)
//! order (play permutation):     3   0   4   1
//!                                   ^
//!                                 head  -> current song = slots[order[head]] = A
//! ```
//!
//! Removal clears a slot instead of shifting later ones, so a slot handle
//! keeps naming the same song for the life of the queue.

use crate::shuffle::{shuffle_order, unshuffle_order};
use crate::types::{ShufflePolicy, Slot, SongRef};
use queuer_core::{Song, SongId, StreamData};
use rand::Rng;

#[derive(Debug, Clone)]
struct Entry {
    song: Song,
    /// Stream attached while this song is the one playing
    stream: Option<StreamData>,
}

/// Arena of songs plus the order they play in
#[derive(Debug, Clone, Default)]
pub struct Tracklist {
    slots: Vec<Option<Entry>>,
    order: Vec<Slot>,
    head: usize,
}

impl Tracklist {
    /// Create an empty tracklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of songs in the play order
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Head position (0 when empty)
    pub fn head(&self) -> usize {
        self.head
    }

    /// Slots in play order
    pub fn order(&self) -> &[Slot] {
        &self.order
    }

    /// Slot at the head position
    pub fn current_slot(&self) -> Option<Slot> {
        self.order.get(self.head).copied()
    }

    /// Song at the head position
    pub fn current(&self) -> Option<&Song> {
        self.current_slot().and_then(|slot| self.song(slot))
    }

    /// Song stored in a slot, if still live
    pub fn song(&self, slot: Slot) -> Option<&Song> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .map(|entry| &entry.song)
    }

    /// Songs in play order
    pub fn songs(&self) -> impl Iterator<Item = &Song> + '_ {
        self.order.iter().filter_map(|slot| self.song(*slot))
    }

    /// Slot at a play position
    pub fn slot_at(&self, position: usize) -> Option<Slot> {
        self.order.get(position).copied()
    }

    /// Play position of a slot
    pub fn position_of(&self, slot: Slot) -> Option<usize> {
        self.order.iter().position(|s| *s == slot)
    }

    /// Slot holding the song with this ID
    pub fn slot_of(&self, id: &SongId) -> Option<Slot> {
        self.order
            .iter()
            .copied()
            .find(|slot| self.song(*slot).is_some_and(|song| song.id() == id))
    }

    pub fn contains(&self, id: &SongId) -> bool {
        self.slot_of(id).is_some()
    }

    /// Resolve a reference to a play position, then step by `offset`
    ///
    /// Out-of-range results are `None`; there is no wraparound here.
    pub fn resolve_position(&self, target: &SongRef, offset: isize) -> Option<usize> {
        let base = match target {
            SongRef::Id(id) => self.slot_of(id).and_then(|slot| self.position_of(slot)),
            SongRef::Slot(slot) => self.position_of(*slot),
            SongRef::Position(position) => Some(*position),
            SongRef::Title(title) => self
                .order
                .iter()
                .position(|slot| self.song(*slot).is_some_and(|song| song.title() == title)),
        }?;

        let position = base.checked_add_signed(offset)?;
        (position < self.order.len()).then_some(position)
    }

    /// Resolve a reference to a slot (see [`Tracklist::resolve_position`])
    pub fn resolve(&self, target: &SongRef, offset: isize) -> Option<Slot> {
        self.resolve_position(target, offset)
            .and_then(|position| self.slot_at(position))
    }

    /// Store a song and insert it into the play order at `position`
    ///
    /// `position` is clamped to the end. The head keeps pointing at the same
    /// song.
    pub fn insert(&mut self, song: Song, position: usize) -> Slot {
        let slot = self.slots.len();
        self.slots.push(Some(Entry { song, stream: None }));

        let position = position.min(self.order.len());
        let had_songs = !self.order.is_empty();
        self.order.insert(position, slot);
        if had_songs && position <= self.head {
            self.head += 1;
        }
        slot
    }

    /// Clear a slot and drop it from the play order
    ///
    /// Returns the song and the play position it occupied. Songs after it
    /// shift down one position; when the head song is removed the head lands
    /// on whatever now occupies its position (clamped to the last song).
    pub fn remove(&mut self, slot: Slot) -> Option<(Song, usize)> {
        let position = self.position_of(slot)?;
        let entry = self.slots.get_mut(slot)?.take()?;
        self.order.remove(position);

        if position < self.head {
            self.head -= 1;
        }
        if self.head >= self.order.len() {
            self.head = self.order.len().saturating_sub(1);
        }
        Some((entry.song, position))
    }

    /// Point the head at a slot
    pub fn set_head_to(&mut self, slot: Slot) -> bool {
        match self.position_of(slot) {
            Some(position) => {
                self.head = position;
                true
            }
            None => false,
        }
    }

    /// Point the head at a play position
    pub fn set_head(&mut self, position: usize) {
        self.head = position.min(self.order.len().saturating_sub(1));
    }

    /// Move `slot` next to `anchor` (after it or before it)
    pub fn move_next_to(&mut self, slot: Slot, anchor: Slot, after: bool) -> bool {
        if slot == anchor {
            return self.position_of(slot).is_some();
        }
        let current = self.current_slot();
        let Some(from) = self.position_of(slot) else {
            return false;
        };
        if self.position_of(anchor).is_none() {
            return false;
        }

        self.order.remove(from);
        let Some(anchor_position) = self.position_of(anchor) else {
            return false;
        };
        let to = if after { anchor_position + 1 } else { anchor_position };
        self.order.insert(to, slot);
        self.follow(current);
        true
    }

    /// Exchange the play positions of two slots
    pub fn swap(&mut self, a: Slot, b: Slot) -> bool {
        let (Some(pa), Some(pb)) = (self.position_of(a), self.position_of(b)) else {
            return false;
        };
        let current = self.current_slot();
        self.order.swap(pa, pb);
        self.follow(current);
        true
    }

    /// Randomize the play order
    pub fn shuffle<R: Rng + ?Sized>(&mut self, policy: ShufflePolicy, rng: &mut R) {
        let current = self.current_slot();
        self.head = shuffle_order(&mut self.order, current, policy, rng);
    }

    /// Restore insertion order
    pub fn unshuffle(&mut self) {
        let current = self.current_slot();
        self.head = unshuffle_order(&mut self.order, current);
    }

    /// Stream attached to a slot
    pub fn stream(&self, slot: Slot) -> Option<&StreamData> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .and_then(|entry| entry.stream.as_ref())
    }

    /// Attach a stream to a slot
    pub fn attach(&mut self, slot: Slot, stream: StreamData) {
        if let Some(Some(entry)) = self.slots.get_mut(slot) {
            entry.stream = Some(stream);
        }
    }

    /// Drop a slot's attached stream
    pub fn detach(&mut self, slot: Slot) {
        if let Some(Some(entry)) = self.slots.get_mut(slot) {
            entry.stream = None;
        }
    }

    /// Drop every attached stream
    pub fn detach_all(&mut self) {
        for entry in self.slots.iter_mut().flatten() {
            entry.stream = None;
        }
    }

    /// Check the structural invariants
    ///
    /// Every slot in the order is live and appears once, every live slot is
    /// in the order, and the head is in range.
    pub fn check(&self) -> Result<(), String> {
        let mut seen = vec![false; self.slots.len()];
        for slot in &self.order {
            match self.slots.get(*slot) {
                Some(Some(_)) => {}
                _ => return Err(format!("slot {slot} in order is not live")),
            }
            if std::mem::replace(&mut seen[*slot], true) {
                return Err(format!("slot {slot} appears twice"));
            }
        }
        let live = self.slots.iter().filter(|entry| entry.is_some()).count();
        if live != self.order.len() {
            return Err(format!("{live} live slots but {} in order", self.order.len()));
        }
        if !self.order.is_empty() && self.head >= self.order.len() {
            return Err(format!("head {} out of range", self.head));
        }
        Ok(())
    }

    fn follow(&mut self, slot: Option<Slot>) {
        if let Some(position) = slot.and_then(|slot| self.position_of(slot)) {
            self.head = position;
        }
    }
}
