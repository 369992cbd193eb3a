//! Reference tracking for one encode or decode call.
//!
//! Both sides hand out slots sequentially in visitation order, and both
//! register a composite *before* visiting its children, so a slot number
//! written by the encoder always names the same node for the decoder.

use rustc_hash::FxHashMap;

use crate::model::Value;

/// Index of a composite in visitation order.
pub type Slot = usize;

/// Encode-side table: node identity to slot.
#[derive(Debug, Default)]
pub struct EncodeRefs {
    slots: FxHashMap<usize, Slot>,
    // Keeps every registered node alive until the call ends, so a temporary
    // adapter payload can't be freed and its address handed to another node.
    retained: Vec<Value>,
}

impl EncodeRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot of an already visited node.
    pub fn lookup(&self, value: &Value) -> Option<Slot> {
        value.identity().and_then(|id| self.slots.get(&id).copied())
    }

    /// Assigns the next slot to `value`, or returns its existing slot.
    pub fn register(&mut self, value: &Value) -> Slot {
        let Some(id) = value.identity() else {
            // No identity: consumes a slot but can never be looked up.
            self.retained.push(value.clone());
            return self.retained.len() - 1;
        };
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let slot = self.retained.len();
        self.slots.insert(id, slot);
        self.retained.push(value.clone());
        slot
    }

    /// Returns a checkpoint to [`rollback`](Self::rollback) to.
    pub fn checkpoint(&self) -> usize {
        self.retained.len()
    }

    /// Forgets every node registered since `checkpoint`.
    ///
    /// Used when a registered value ends up omitted: the decoder never sees
    /// it, so its slot (and those of anything visited inside it) must be
    /// handed out again.
    pub fn rollback(&mut self, checkpoint: usize) {
        for value in self.retained.drain(checkpoint..) {
            if let Some(id) = value.identity() {
                self.slots.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Decode-side table: slot to node.
#[derive(Debug, Default)]
pub struct DecodeRefs {
    values: Vec<Value>,
}

impl DecodeRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a (possibly still empty) node and returns its slot.
    pub fn register(&mut self, value: Value) -> Slot {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Returns a handle to the node at `slot`.
    pub fn resolve(&self, slot: Slot) -> Option<Value> {
        self.values.get(slot).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
