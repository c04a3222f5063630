//! Per-call serialization and deserialization contexts.
//!
//! A context bundles the registry and ambient dependency map for one
//! top-level call and threads through nested codec invocations. The plain
//! variant allocates no memo table and re-encodes repeated references; the
//! memoizing variant encodes each allocation once and emits back-references
//! afterwards, which is what makes shared and cyclic graphs representable.
use {
    crate::{
        codec::Value,
        deps::DependencyMap,
        error::{depth_limit, payload_trailing_bytes, unexpected_backref, Result},
        memo::{DecodeMemo, EncodeMemo},
        registry::CodecRegistry,
        wire::{put_uvarint, Reader, BACKREF_TAG},
    },
    core::any::Any,
};

/// Serialization state for one top-level call.
pub struct EncodeContext<'a> {
    registry: &'a CodecRegistry,
    deps: &'a DependencyMap,
    memo: Option<EncodeMemo>,
    depth: usize,
    max_depth: usize,
}

impl<'a> EncodeContext<'a> {
    pub(crate) fn new(
        registry: &'a CodecRegistry,
        deps: &'a DependencyMap,
        memoizing: bool,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            deps,
            memo: memoizing.then(EncodeMemo::new),
            depth: 0,
            max_depth,
        }
    }

    /// Fetch an ambient dependency configured on the engine.
    pub fn dependency<T: Any + Send + Sync>(&self) -> Result<&T> {
        self.deps.get::<T>()
    }

    /// Encode one value as an envelope into `out`.
    ///
    /// Under memoization, an already-seen allocation becomes a
    /// back-reference; a new allocation is recorded *before* its codec runs,
    /// so a cycle back to it resolves to the reserved id instead of
    /// recursing forever.
    pub fn serialize(&mut self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        if let Some(memo) = &mut self.memo {
            if let Some(id) = memo.lookup(value) {
                put_uvarint(out, BACKREF_TAG);
                put_uvarint(out, id);
                return Ok(());
            }
            memo.assign(value);
        }
        let (tag, codec) = self.registry.for_value(value)?;
        if self.depth == self.max_depth {
            return Err(depth_limit(self.max_depth));
        }
        // Codec payloads are length-delimited, and their size depends on
        // memo state, so each envelope body is staged before framing.
        let mut payload = Vec::new();
        self.depth += 1;
        let encoded = codec.encode_value(self, value, &mut payload);
        self.depth -= 1;
        encoded?;
        put_uvarint(out, tag);
        put_uvarint(out, payload.len() as u64);
        out.extend_from_slice(&payload);
        Ok(())
    }
}

/// Deserialization state for one top-level call.
pub struct DecodeContext<'a> {
    registry: &'a CodecRegistry,
    deps: &'a DependencyMap,
    memo: Option<DecodeMemo>,
    depth: usize,
    max_depth: usize,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(
        registry: &'a CodecRegistry,
        deps: &'a DependencyMap,
        memoizing: bool,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            deps,
            memo: memoizing.then(DecodeMemo::new),
            depth: 0,
            max_depth,
        }
    }

    /// Fetch an ambient dependency configured on the engine.
    pub fn dependency<T: Any + Send + Sync>(&self) -> Result<&T> {
        self.deps.get::<T>()
    }

    /// Make back-references to the envelope currently being decoded resolve
    /// to `value`, the codec's partially built skeleton. Required for
    /// decoding cycles; a no-op in a non-memoized call.
    pub fn register_initial_value(&mut self, value: Value) {
        if let Some(memo) = &mut self.memo {
            memo.register_initial(value);
        }
    }

    /// Decode one envelope from `reader`.
    pub fn deserialize(&mut self, reader: &mut Reader) -> Result<Value> {
        let envelope_offset = reader.offset();
        let tag = reader.get_uvarint()?;
        if tag == BACKREF_TAG {
            let id = reader.get_uvarint()?;
            return match &self.memo {
                Some(memo) => memo.resolve(envelope_offset, id),
                None => Err(unexpected_backref(envelope_offset)),
            };
        }
        let codec = self.registry.by_tag(tag)?;
        let payload_len = reader.get_uvarint()?;
        let mut window = reader.split_window(payload_len)?;
        if self.depth == self.max_depth {
            return Err(depth_limit(self.max_depth));
        }
        let id = self.memo.as_mut().map(DecodeMemo::reserve);
        self.depth += 1;
        let decoded = codec.decode_value(self, &mut window);
        self.depth -= 1;
        let value = decoded?;
        if !window.is_empty() {
            return Err(payload_trailing_bytes(
                codec.type_name(),
                window.remaining(),
            ));
        }
        if let (Some(memo), Some(id)) = (&mut self.memo, id) {
            memo.commit(id, value.clone(), codec.type_name())?;
        }
        Ok(value)
    }
}
