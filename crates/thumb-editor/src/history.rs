//! Undo/redo history.
//!
//! A thumbnail config is small, so every step is a snapshot pair
//! (before, after) rather than a forward/inverse mutation chain.
//!
//! Drag gestures are batched: the config is captured when the gesture
//! starts and again when it ends, so a whole drag undoes in one step.

use thumb_core::ThumbnailConfig;

#[derive(Debug, Clone)]
struct Entry {
    before: ThumbnailConfig,
    after: ThumbnailConfig,
    description: String,
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Config captured at the start of the outermost batch.
    batch_snapshot: Option<ThumbnailConfig>,
    batch_description: String,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Record a finished change. Ignored while a batch is open; the batch
    /// snapshot covers it.
    pub fn record(&mut self, before: ThumbnailConfig, after: &ThumbnailConfig, description: &str) {
        if self.in_batch() || before == *after {
            return;
        }
        self.push(Entry {
            before,
            after: after.clone(),
            description: description.to_owned(),
        });
    }

    /// Start a batch group. Nested calls join the outer batch.
    pub fn begin_batch(&mut self, config: &ThumbnailConfig, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(config.clone());
            self.batch_description = description.to_owned();
        }
        self.batch_depth += 1;
    }

    /// Close a batch group. The outermost close pushes one entry when the
    /// config actually changed.
    pub fn end_batch(&mut self, config: &ThumbnailConfig) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(before) = self.batch_snapshot.take()
            && before != *config
        {
            let description = std::mem::take(&mut self.batch_description);
            self.push(Entry {
                before,
                after: config.clone(),
                description,
            });
        }
    }

    fn push(&mut self, entry: Entry) {
        log::trace!("history: {}", entry.description);
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Restore the config from before the last step. Returns its description.
    pub fn undo(&mut self, config: &mut ThumbnailConfig) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        *config = entry.before.clone();
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        Some(description)
    }

    pub fn redo(&mut self, config: &mut ThumbnailConfig) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        *config = entry.after.clone();
        let description = entry.description.clone();
        self.undo_stack.push(entry);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}
