//! Immutable type-to-codec registry.
use {
    crate::{
        codec::{ErasedCodec, ObjectCodec, Value},
        error::{duplicate_registration, missing_codec, unknown_wire_tag, Result},
    },
    core::any::TypeId,
    std::{collections::HashMap, sync::Arc},
};

/// Read-only mapping from a value's runtime type to its codec.
///
/// Built once through [`RegistryBuilder`], immutable afterwards, and safe to
/// share across any number of concurrent calls. Wire tags are assigned
/// densely in registration order, starting at 1 (tag 0 is the back-reference
/// marker), so the encoding and decoding sides must be built from registries
/// with identical registration order.
pub struct CodecRegistry {
    by_type: HashMap<TypeId, u32>,
    entries: Vec<Arc<dyn ErasedCodec>>,
}

impl CodecRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the codec for a value's runtime type, with its wire tag.
    pub(crate) fn for_value(&self, value: &Value) -> Result<(u64, &dyn ErasedCodec)> {
        match self.by_type.get(&value.concrete_type_id()) {
            Some(&ix) => Ok((u64::from(ix) + 1, &*self.entries[ix as usize])),
            None => Err(missing_codec(value.type_name())),
        }
    }

    /// Look up the codec decoding envelopes with the given wire tag.
    pub(crate) fn by_tag(&self, tag: u64) -> Result<&dyn ErasedCodec> {
        tag.checked_sub(1)
            .and_then(|ix| usize::try_from(ix).ok())
            .and_then(|ix| self.entries.get(ix))
            .map(|codec| &**codec)
            .ok_or_else(|| unknown_wire_tag(tag))
    }
}

impl core::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.entries.len())
            .finish()
    }
}

/// Accumulates `(type, codec)` registrations for a [`CodecRegistry`].
///
/// A collision on the registered type is a programmer error and fails
/// [`RegistryBuilder::build`] rather than silently overwriting.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Arc<dyn ErasedCodec>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: ObjectCodec>(mut self, codec: C) -> Self {
        self.entries.push(Arc::new(codec));
        self
    }

    pub fn build(self) -> Result<CodecRegistry> {
        let mut by_type = HashMap::with_capacity(self.entries.len());
        for (ix, codec) in self.entries.iter().enumerate() {
            if by_type.insert(codec.item_type(), ix as u32).is_some() {
                return Err(duplicate_registration(codec.type_name()));
            }
        }
        Ok(CodecRegistry {
            by_type,
            entries: self.entries,
        })
    }
}
