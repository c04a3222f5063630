//! Identity-keyed memoization tables, each owned by one in-flight memoized
//! call. Ids are assigned in strictly increasing order of first encounter,
//! and the decode side commits them in the same order.
use {
    crate::{
        codec::{Value, ValueIdentity},
        error::{
            cycle_without_initial_value, initial_value_mismatch, unreserved_backref, Result,
        },
    },
    std::collections::HashMap,
};

/// Encode-side table: allocation identity → sequential id.
#[derive(Default)]
pub(crate) struct EncodeMemo {
    ids: HashMap<ValueIdentity, u64>,
    // Clones pin the recorded allocations so an address cannot be freed and
    // reused for a distinct value mid-call.
    pinned: Vec<Value>,
}

impl EncodeMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup(&self, value: &Value) -> Option<u64> {
        self.ids.get(&ValueIdentity::of(value)).copied()
    }

    /// Record `value` under the next id. Called before the codec body runs,
    /// so a cycle back to the value under encode resolves to this id.
    pub(crate) fn assign(&mut self, value: &Value) -> u64 {
        let id = self.pinned.len() as u64;
        self.ids.insert(ValueIdentity::of(value), id);
        self.pinned.push(value.clone());
        id
    }
}

enum Slot {
    /// Reserved: the envelope is still being decoded. `initial` holds the
    /// codec's partially built skeleton, if it registered one.
    Pending { initial: Option<Value> },
    Done(Value),
}

/// Decode-side table: sequential id → reconstructed value.
#[derive(Default)]
pub(crate) struct DecodeMemo {
    slots: Vec<Slot>,
    // Ids of envelopes currently being decoded, innermost last.
    in_flight: Vec<u64>,
}

impl DecodeMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id for the envelope about to be decoded.
    pub(crate) fn reserve(&mut self) -> u64 {
        let id = self.slots.len() as u64;
        self.slots.push(Slot::Pending { initial: None });
        self.in_flight.push(id);
        id
    }

    /// Attach a codec's partially built value to the innermost in-flight id,
    /// making back-references to it resolvable before decoding finishes.
    pub(crate) fn register_initial(&mut self, value: Value) {
        if let Some(&id) = self.in_flight.last() {
            self.slots[id as usize] = Slot::Pending {
                initial: Some(value),
            };
        }
    }

    /// Resolve a back-reference read at `offset`.
    pub(crate) fn resolve(&self, offset: usize, id: u64) -> Result<Value> {
        match usize::try_from(id).ok().and_then(|ix| self.slots.get(ix)) {
            Some(Slot::Done(value)) => Ok(value.clone()),
            Some(Slot::Pending {
                initial: Some(value),
            }) => Ok(value.clone()),
            Some(Slot::Pending { initial: None }) => Err(cycle_without_initial_value(id)),
            None => Err(unreserved_backref(offset, id)),
        }
    }

    /// Record the fully decoded value under its reserved id.
    ///
    /// If the codec registered an initial value, the finished value must be
    /// that same allocation; anything else would silently split identity
    /// between earlier back-references and the final value.
    pub(crate) fn commit(&mut self, id: u64, value: Value, type_name: &'static str) -> Result<()> {
        self.in_flight.pop();
        let slot = &mut self.slots[id as usize];
        if let Slot::Pending {
            initial: Some(initial),
        } = slot
        {
            if !Value::ptr_eq(initial, &value) {
                return Err(initial_value_mismatch(type_name));
            }
        }
        *slot = Slot::Done(value);
        Ok(())
    }
}
