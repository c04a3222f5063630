//! graphcode serializes heterogeneous object graphs through a runtime codec
//! registry, with optional identity memoization so shared references and
//! cycles survive a round trip.
//!
//! The engine owns no per-type encoding logic. Each registrable type brings
//! an [`ObjectCodec`]; the [`CodecRegistry`] maps runtime types to codecs
//! and assigns wire tags; a [`DependencyMap`] injects ambient singletons
//! codecs need but which are not worth serializing. The [`Engine`] facade
//! exposes plain and memoized serialize/deserialize over in-memory buffers
//! and `std::io` sinks/sources.
//!
//! # Quickstart
//!
//! ```
//! use graphcode::{
//!     wire::Reader, CodecRegistry, DecodeContext, DependencyMap, EncodeContext, Engine,
//!     ObjectCodec, Value,
//! };
//! use std::sync::Arc;
//!
//! struct U32Codec;
//!
//! impl ObjectCodec for U32Codec {
//!     type Item = u32;
//!
//!     fn encode(
//!         &self,
//!         _ctx: &mut EncodeContext<'_>,
//!         value: &u32,
//!         out: &mut Vec<u8>,
//!     ) -> graphcode::Result<()> {
//!         out.extend_from_slice(&value.to_le_bytes());
//!         Ok(())
//!     }
//!
//!     fn decode(
//!         &self,
//!         _ctx: &mut DecodeContext<'_>,
//!         reader: &mut Reader,
//!     ) -> graphcode::Result<Arc<u32>> {
//!         Ok(Arc::new(u32::from_le_bytes(reader.get_array()?)))
//!     }
//! }
//!
//! let registry = CodecRegistry::builder().register(U32Codec).build().unwrap();
//! let engine = Engine::new(registry, DependencyMap::new());
//!
//! let bytes = engine.serialize(&Value::new(7u32)).unwrap();
//! let back = engine.deserialize(bytes).unwrap();
//! assert_eq!(back.downcast_ref::<u32>(), Some(&7));
//! ```
//!
//! # Plain vs. memoized
//!
//! The plain operations re-encode a value every time it appears, which is
//! fine for tree-shaped data but loses sharing and cannot terminate on a
//! cycle (the engine's depth limit turns that into an error). The memoized
//! operations key on allocation identity: each [`Value`] is encoded once
//! and later appearances become compact back-references, so a decoded graph
//! has the same sharing structure the encoded one had, including cycles,
//! when codecs register their partially built value through
//! [`DecodeContext::register_initial_value`].
//!
//! # Wire format
//!
//! See [`wire`]. A registry's wire tags follow registration order, so both
//! ends of a transfer must register the same codecs in the same order.

pub mod error;
pub use error::{Error, Result};
mod codec;
pub use codec::{ObjectCodec, Value};
mod context;
pub use context::{DecodeContext, EncodeContext};
mod deps;
pub use deps::DependencyMap;
mod engine;
pub use engine::{Engine, DEFAULT_MAX_DEPTH};
mod memo;
mod registry;
pub use registry::{CodecRegistry, RegistryBuilder};
pub mod wire;

#[cfg(test)]
mod testutil;
