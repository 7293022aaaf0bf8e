//! Bounded per-object undo/redo chains.
//!
//! Every object owns a [`History`]. A finished transition is recorded as one shared
//! [`HistoryItem`] in the history of the routing target and of each of its ancestors, so the
//! same item lives in several chains at once. The item carries a `done` flag: undoing it
//! through one chain is visible to every other chain, which then skips it instead of undoing it
//! a second time.
//!
//! ```text
//! record(t4) with cursor at the tail
//! [t1, t2, t3, t4]        cursor = 4
//!
//! undo() x2
//! [t1, t2, t3, t4]        cursor = 2   (t3, t4 not done)
//!
//! record(t5)              tail after the cursor is pruned first
//! [t1, t2, t5]            cursor = 3
//! ```

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{constants::DEFAULT_HISTORY_DEPTH, topic::Transition};

/// Limits for every object's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of transitions kept per object. Values below one are treated as one.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl HistoryConfig {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// A recorded transition plus its shared applied/undone state.
#[derive(Debug)]
pub struct HistoryItem {
    transition: Transition,
    done: Cell<bool>,
}

impl HistoryItem {
    /// Wrap a transition that has just been applied.
    pub fn new(transition: Transition) -> Rc<Self> {
        Rc::new(Self {
            transition,
            done: Cell::new(true),
        })
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// True while the transition's effects are live.
    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    fn set_done(&self, done: bool) {
        self.done.set(done);
    }
}

/// One object's undo/redo chain.
#[derive(Debug)]
pub struct History {
    items: VecDeque<Rc<HistoryItem>>,
    /// Number of entries considered applied from this chain's point of view.
    cursor: usize,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            items: VecDeque::new(),
            cursor: 0,
            max_depth: config.max_depth.max(1),
        }
    }

    /// Append an item, dropping the undone tail after the cursor first.
    pub fn record(&mut self, item: Rc<HistoryItem>) {
        self.items.truncate(self.cursor);
        self.items.push_back(item);
        self.cursor = self.items.len();
        while self.items.len() > self.max_depth {
            self.evict_oldest();
        }
    }

    /// Drop the oldest entry, shifting the cursor with it.
    pub fn evict_oldest(&mut self) -> Option<Rc<HistoryItem>> {
        let evicted = self.items.pop_front()?;
        self.cursor = self.cursor.saturating_sub(1);
        Some(evicted)
    }

    /// The item the next [`History::undo`] would return, without moving anything.
    pub fn peek_undo(&self) -> Option<&Rc<HistoryItem>> {
        self.undo_index().map(|i| &self.items[i])
    }

    /// The item the next [`History::redo`] would return, without moving anything.
    pub fn peek_redo(&self) -> Option<&Rc<HistoryItem>> {
        self.redo_index().map(|i| &self.items[i])
    }

    /// Step back to the most recent item that is still applied and mark it undone.
    ///
    /// Items already undone through another chain are stepped over. Returns `None` when there
    /// is nothing left to undo; the cursor does not move in that case.
    pub fn undo(&mut self) -> Option<Rc<HistoryItem>> {
        let index = self.undo_index()?;
        let item = Rc::clone(&self.items[index]);
        item.set_done(false);
        self.cursor = index;
        Some(item)
    }

    /// Step forward to the next item that is not applied and mark it applied.
    ///
    /// Items already redone through another chain are stepped over.
    pub fn redo(&mut self) -> Option<Rc<HistoryItem>> {
        let index = self.redo_index()?;
        let item = Rc::clone(&self.items[index]);
        item.set_done(true);
        self.cursor = index + 1;
        Some(item)
    }

    fn undo_index(&self) -> Option<usize> {
        (0..self.cursor).rev().find(|&i| self.items[i].is_done())
    }

    fn redo_index(&self) -> Option<usize> {
        (self.cursor..self.items.len()).find(|&i| !self.items[i].is_done())
    }

    pub fn can_undo(&self) -> bool {
        self.items.iter().take(self.cursor).any(|item| item.is_done())
    }

    pub fn can_redo(&self) -> bool {
        self.items.iter().skip(self.cursor).any(|item| !item.is_done())
    }

    /// The most recently applied entry from this chain's point of view.
    pub fn current(&self) -> Option<&Rc<HistoryItem>> {
        self.cursor.checked_sub(1).and_then(|i| self.items.get(i))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<HistoryItem>> {
        self.items.iter()
    }
}
