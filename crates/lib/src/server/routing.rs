//! Transition routing and undo/redo replay.
//!
//! A finished transition is recorded into the history of the lowest common ancestor of every
//! live object it touches, and into the history of each ancestor of that node up to the root.
//! One [`HistoryItem`] is shared by all of those chains.

use std::rc::Rc;

use super::{Server, ServerError};
use crate::{
    ObjectId, Result,
    hierarchy,
    history::HistoryItem,
    topic::{Change, Direction, Transition},
};

impl Server {
    /// Record a finished transition and notify transition callbacks.
    pub(crate) fn route(&mut self, transition: Transition) -> Result<()> {
        if let Some(target) = self.route_target(&transition)? {
            let path = hierarchy::ancestors(self, &target)?;
            let item = HistoryItem::new(transition.clone());
            for id in &path {
                self.object_mut(id)?.history_mut().record(Rc::clone(&item));
            }
            tracing::debug!(
                transition = transition.id,
                changes = transition.len(),
                %target,
                depth = path.len(),
                "recorded transition"
            );
        } else {
            tracing::trace!(transition = transition.id, "transition touches no object, not recorded");
        }
        self.run_transition_callbacks(&transition, Direction::Forward);
        Ok(())
    }

    /// Where a transition is recorded.
    ///
    /// `None` when no change names an object. When every named object is gone by now (a
    /// transition that destroys a whole subtree, say) the root records it.
    fn route_target(&self, transition: &Transition) -> Result<Option<ObjectId>> {
        let affected = transition.affected_objects();
        if affected.is_empty() {
            return Ok(None);
        }
        let live: Vec<ObjectId> = affected
            .into_iter()
            .filter(|id| self.objects.contains_key(id))
            .collect();
        if live.is_empty() {
            return Ok(Some(ObjectId::root()));
        }
        let target = hierarchy::lowest_common_ancestor_of(self, &live)?;
        Ok(Some(target.unwrap_or_else(ObjectId::root)))
    }

    /// Undo the most recent applied transition in the history of `target` (the root when
    /// `None`).
    ///
    /// Returns `Ok(None)` when there is nothing to undo. That is not an error. When replay
    /// fails the tree and the history are left as they were before the call.
    pub fn undo(&mut self, target: Option<&ObjectId>) -> Result<Option<Transition>> {
        self.step(target, Direction::Backward)
    }

    /// Redo the next undone transition in the history of `target` (the root when `None`).
    ///
    /// Returns `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self, target: Option<&ObjectId>) -> Result<Option<Transition>> {
        self.step(target, Direction::Forward)
    }

    pub fn can_undo(&self, target: Option<&ObjectId>) -> Result<bool> {
        Ok(self.history(&target.cloned().unwrap_or_else(ObjectId::root))?.can_undo())
    }

    pub fn can_redo(&self, target: Option<&ObjectId>) -> Result<bool> {
        Ok(self.history(&target.cloned().unwrap_or_else(ObjectId::root))?.can_redo())
    }

    /// Replay the next item of `target`'s history, then move the history.
    fn step(&mut self, target: Option<&ObjectId>, direction: Direction) -> Result<Option<Transition>> {
        let target = target.cloned().unwrap_or_else(ObjectId::root);
        let history = self.history(&target)?;
        let next = match direction {
            Direction::Backward => history.peek_undo(),
            Direction::Forward => history.peek_redo(),
        };
        let Some(transition) = next.map(|item| item.transition().clone()) else {
            tracing::debug!(%target, ?direction, "nothing to replay");
            return Ok(None);
        };

        self.replay(&transition, direction)?;
        let history = self.object_mut(&target)?.history_mut();
        match direction {
            Direction::Backward => history.undo(),
            Direction::Forward => history.redo(),
        };
        tracing::debug!(transition = transition.id, %target, ?direction, "replayed transition");
        self.run_transition_callbacks(&transition, direction);
        Ok(Some(transition))
    }

    /// Apply a recorded transition again, or its inverse, without recording anything.
    ///
    /// All or nothing: when a change fails, the changes already replayed are rolled back.
    fn replay(&mut self, transition: &Transition, direction: Direction) -> Result<()> {
        let changes: Vec<&Change> = match direction {
            Direction::Backward => transition.changes.iter().rev().collect(),
            Direction::Forward => transition.changes.iter().collect(),
        };
        let replaying = std::mem::replace(&mut self.replaying, true);
        let result = self.suppressed(|server| {
            for (applied, change) in changes.iter().enumerate() {
                let Err(err) = server.replay_change(change, direction) else {
                    continue;
                };
                tracing::error!(transition = transition.id, ?direction, error = %err, "replay failed, rolling back");
                for done in changes[..applied].iter().rev() {
                    if let Err(rollback) = server.replay_change(done, direction.reversed()) {
                        tracing::error!(transition = transition.id, error = %rollback, "rollback failed");
                    }
                }
                return Err(err);
            }
            Ok(())
        });
        self.replaying = replaying;
        result
    }

    fn replay_change(&mut self, change: &Change, direction: Direction) -> Result<()> {
        match direction {
            Direction::Backward => self.revert(change),
            Direction::Forward => self.reapply(change),
        }
    }

    fn revert(&mut self, change: &Change) -> Result<()> {
        match change {
            Change::Event { event, inverse, .. } => {
                let handlers = self.event_handlers(event)?;
                (handlers.inverse)(self, inverse)?;
            }
            _ => {
                let inverse = change.inverse().ok_or_else(|| {
                    ServerError::invalid("undo", "change has no inverse")
                })?;
                self.topics.apply(&inverse)?;
                self.react(&inverse)?;
            }
        }
        Ok(())
    }

    fn reapply(&mut self, change: &Change) -> Result<()> {
        match change {
            Change::Event { event, forward, .. } => {
                let handlers = self.event_handlers(event)?;
                (handlers.forward)(self, forward)?;
            }
            _ => {
                self.topics.apply(change)?;
                self.react(change)?;
            }
        }
        Ok(())
    }

    fn run_transition_callbacks(&self, transition: &Transition, direction: Direction) {
        for callback in &self.transition_callbacks {
            callback(self, transition, direction);
        }
    }
}
