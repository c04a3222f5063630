//! Top-level facade over the codec machinery.
use {
    crate::{
        codec::Value,
        context::{DecodeContext, EncodeContext},
        deps::DependencyMap,
        error::{read_failed, trailing_bytes, write_failed, Result},
        registry::CodecRegistry,
        wire::Reader,
    },
    bytes::Bytes,
    std::{io, sync::Arc},
};

/// Default bound on value-graph recursion depth.
///
/// Converts runaway recursion (a cyclic graph encoded without memoization,
/// or a hostile deeply nested stream) into an error instead of a stack
/// overflow. Override with [`Engine::with_max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Serialization engine: a codec registry plus ambient dependencies, shared
/// read-only by every call.
///
/// All four operations construct a fresh per-call context, so concurrent
/// calls from multiple threads never interfere. The plain operations do not
/// track identity: a value referenced twice is encoded twice, and cyclic
/// graphs fail with [`Error::DepthLimit`](crate::Error::DepthLimit). The
/// memoized operations preserve reference sharing and close cycles.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<CodecRegistry>,
    deps: Arc<DependencyMap>,
    max_depth: usize,
}

impl Engine {
    pub fn new(registry: CodecRegistry, deps: DependencyMap) -> Self {
        Self {
            registry: Arc::new(registry),
            deps: Arc::new(deps),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Encode `value` without identity tracking.
    pub fn serialize(&self, value: &Value) -> Result<Bytes> {
        self.serialize_impl(value, false)
    }

    /// Encode `value`, preserving reference sharing and cycles.
    pub fn serialize_memoized(&self, value: &Value) -> Result<Bytes> {
        self.serialize_impl(value, true)
    }

    /// Decode one value from `data`, which must contain exactly one
    /// serialized value.
    ///
    /// Payload bytes handed to codecs are zero-copy slices of `data`; a
    /// codec that stores them keeps the input allocation alive through the
    /// returned value.
    pub fn deserialize(&self, data: impl Into<Bytes>) -> Result<Value> {
        self.deserialize_impl(data.into(), false)
    }

    /// Decode one value from `data`, resolving back-references so shared
    /// sub-objects come back as one allocation and cycles are closed.
    pub fn deserialize_memoized(&self, data: impl Into<Bytes>) -> Result<Value> {
        self.deserialize_impl(data.into(), true)
    }

    /// Encode `value` and flush the finished bytes to `out` in one write.
    ///
    /// Nothing is written on a failed serialize; transport failures come
    /// back as [`Error::Write`](crate::Error::Write) naming the value's
    /// type, never as a raw I/O error.
    pub fn serialize_into<W: io::Write>(&self, value: &Value, out: &mut W) -> Result<()> {
        let bytes = self.serialize(value)?;
        self.flush(value, &bytes, out)
    }

    /// Memoized variant of [`Engine::serialize_into`].
    pub fn serialize_memoized_into<W: io::Write>(&self, value: &Value, out: &mut W) -> Result<()> {
        let bytes = self.serialize_memoized(value)?;
        self.flush(value, &bytes, out)
    }

    /// Read `input` to its end and decode one value from it.
    pub fn deserialize_from<R: io::Read>(&self, input: &mut R) -> Result<Value> {
        self.deserialize_impl(Self::slurp(input)?, false)
    }

    /// Memoized variant of [`Engine::deserialize_from`].
    pub fn deserialize_memoized_from<R: io::Read>(&self, input: &mut R) -> Result<Value> {
        self.deserialize_impl(Self::slurp(input)?, true)
    }

    fn serialize_impl(&self, value: &Value, memoize: bool) -> Result<Bytes> {
        let mut ctx = EncodeContext::new(&self.registry, &self.deps, memoize, self.max_depth);
        let mut out = Vec::new();
        ctx.serialize(value, &mut out)?;
        Ok(Bytes::from(out))
    }

    fn deserialize_impl(&self, data: Bytes, memoize: bool) -> Result<Value> {
        let mut ctx = DecodeContext::new(&self.registry, &self.deps, memoize, self.max_depth);
        let mut reader = Reader::new(data);
        let value = ctx.deserialize(&mut reader)?;
        if !reader.is_empty() {
            return Err(trailing_bytes(reader.remaining()));
        }
        Ok(value)
    }

    fn flush<W: io::Write>(&self, value: &Value, bytes: &[u8], out: &mut W) -> Result<()> {
        out.write_all(bytes)
            .and_then(|()| out.flush())
            .map_err(|e| write_failed(value.type_name(), e))
    }

    fn slurp<R: io::Read>(input: &mut R) -> Result<Bytes> {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf).map_err(read_failed)?;
        Ok(Bytes::from(buf))
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("deps", &self.deps)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
