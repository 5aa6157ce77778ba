//! Session-local read markers layered over remote read state.

use std::collections::HashSet;

use super::types::StreamKind;

/// Ids marked read locally, before (or without) server confirmation.
///
/// Membership ORs into a record's read flag. Ids are only unique within one
/// stream, so entries are keyed by `(StreamKind, id)`. The set lives for the
/// session and is never persisted; for the leave stream, which has no remote
/// mark-read endpoint, it is the only read state there is.
#[derive(Debug, Default)]
pub struct LocalReadOverrides {
  marked: HashSet<(StreamKind, i64)>,
}

impl LocalReadOverrides {
  pub fn new() -> Self {
    Self::default()
  }

  /// Mark a record read. Idempotent.
  pub fn mark(&mut self, origin: StreamKind, id: i64) {
    self.marked.insert((origin, id));
  }

  /// Roll back an optimistic marker after a failed mutation.
  pub fn unmark(&mut self, origin: StreamKind, id: i64) {
    self.marked.remove(&(origin, id));
  }

  pub fn contains(&self, origin: StreamKind, id: i64) -> bool {
    self.marked.contains(&(origin, id))
  }

  pub fn len(&self) -> usize {
    self.marked.len()
  }

  pub fn is_empty(&self) -> bool {
    self.marked.is_empty()
  }
}
