//! The codec contract: per-type encode/decode pairs and the dynamically
//! typed values they operate on.
use {
    crate::{
        context::{DecodeContext, EncodeContext},
        error::{missing_codec, Result},
        wire::Reader,
    },
    core::any::{Any, TypeId},
    std::sync::Arc,
};

/// Object-safe view of a registrable value, blanket-implemented for every
/// `Any + Send + Sync` type so a type-erased value can still report its
/// concrete type name in errors.
trait AnyValue: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AnyValue for T {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

/// A dynamically typed, shareable value handled by the engine.
///
/// Shared references and cycles are expressed by cloning the `Value` (an
/// `Arc` under the hood). The memoizing mode keys on the allocation address:
/// two clones of one `Value` are one object, two equal-valued allocations
/// are two distinct objects.
#[derive(Clone)]
pub struct Value(Arc<dyn AnyValue>);

impl Value {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an existing shared allocation. Clones of `arc` held elsewhere
    /// share identity with the result.
    pub fn from_arc<T: Send + Sync + 'static>(arc: Arc<T>) -> Self {
        Self(arc)
    }

    /// Concrete type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        (*self.0).type_name()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Recover the concrete allocation, returning the input untouched on
    /// type mismatch.
    pub fn downcast<T: Any + Send + Sync>(self) -> core::result::Result<Arc<T>, Self> {
        if self.is::<T>() {
            let raw = Arc::into_raw(self.0);
            // SAFETY: the allocation holds a `T`, verified just above.
            // Casting away the vtable metadata leaves the same allocation,
            // as in `Arc::downcast`.
            Ok(unsafe { Arc::from_raw(raw as *const T) })
        } else {
            Err(self)
        }
    }

    /// Whether two values are the same allocation (identity, not equality).
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        ValueIdentity::of(a) == ValueIdentity::of(b)
    }

    pub(crate) fn concrete_type_id(&self) -> TypeId {
        (*self.0).as_any().type_id()
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Value").field(&self.type_name()).finish()
    }
}

impl<T: Send + Sync + 'static> From<Arc<T>> for Value {
    fn from(arc: Arc<T>) -> Self {
        Self::from_arc(arc)
    }
}

/// Identity of a [`Value`]: the address of its allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ValueIdentity(*const ());

impl ValueIdentity {
    #[inline]
    pub(crate) fn of(value: &Value) -> Self {
        Self(Arc::as_ptr(&value.0).cast::<()>())
    }
}

/// Per-type encode/decode logic, registered under its `Item` type.
///
/// Codecs are stateless: everything needed to reconstruct a value arrives
/// through the context (nested values, ambient dependencies), never through
/// global state. `encode` and `decode` must be inverses for every value the
/// codec claims, and must not retain the context beyond the call.
pub trait ObjectCodec: Send + Sync + 'static {
    type Item: Send + Sync + 'static;

    /// Encode `value` into `out`.
    ///
    /// Nested fields are encoded by calling [`EncodeContext::serialize`],
    /// which frames each child in its own envelope (and subjects it to
    /// memoization when the call is memoized).
    fn encode(
        &self,
        ctx: &mut EncodeContext<'_>,
        value: &Self::Item,
        out: &mut Vec<u8>,
    ) -> Result<()>;

    /// Decode one value from `reader`, a window over exactly this codec's
    /// payload bytes. The window must be fully consumed.
    ///
    /// Codecs for types that can appear in cycles should build a skeleton,
    /// call [`DecodeContext::register_initial_value`] with it, then decode
    /// children into the skeleton through interior mutability.
    fn decode(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<Self::Item>>;
}

/// Object-safe form of [`ObjectCodec`] stored in the registry.
pub(crate) trait ErasedCodec: Send + Sync {
    fn item_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn encode_value(
        &self,
        ctx: &mut EncodeContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<()>;
    fn decode_value(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Value>;
}

impl<C: ObjectCodec> ErasedCodec for C {
    fn item_type(&self) -> TypeId {
        TypeId::of::<C::Item>()
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<C::Item>()
    }

    fn encode_value(
        &self,
        ctx: &mut EncodeContext<'_>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        // The registry dispatches by `TypeId`, so this downcast only fails
        // if a codec misreports its `item_type`.
        let value = value
            .downcast_ref::<C::Item>()
            .ok_or_else(|| missing_codec(value.type_name()))?;
        ObjectCodec::encode(self, ctx, value, out)
    }

    fn decode_value(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Value> {
        let value = ObjectCodec::decode(self, ctx, reader)?;
        Ok(Value::from_arc(value))
    }
}
