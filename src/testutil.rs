//! Sample codecs shared by the test modules. Per-type codecs are client
//! code, so none of this ships outside of tests.
use {
    crate::{
        codec::{ObjectCodec, Value},
        context::{DecodeContext, EncodeContext},
        error::{codec_error, Result},
        wire::{put_uvarint, Reader},
    },
    std::sync::{Arc, Mutex},
};

fn get_string(reader: &mut Reader) -> Result<String> {
    let len = reader.get_uvarint()?;
    let bytes = reader.take_bytes(len as usize)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| codec_error(e.to_string()))
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    put_uvarint(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

pub(crate) struct U64Codec;

impl ObjectCodec for U64Codec {
    type Item = u64;

    fn encode(&self, _ctx: &mut EncodeContext<'_>, value: &u64, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn decode(&self, _ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<u64>> {
        Ok(Arc::new(u64::from_le_bytes(reader.get_array()?)))
    }
}

pub(crate) struct StringCodec;

impl ObjectCodec for StringCodec {
    type Item = String;

    fn encode(
        &self,
        _ctx: &mut EncodeContext<'_>,
        value: &String,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        put_string(out, value);
        Ok(())
    }

    fn decode(&self, _ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<String>> {
        Ok(Arc::new(get_string(reader)?))
    }
}

pub(crate) struct Pair {
    pub left: Value,
    pub right: Value,
}

pub(crate) fn pair(left: Value, right: Value) -> Value {
    Value::new(Pair { left, right })
}

pub(crate) struct PairCodec;

impl ObjectCodec for PairCodec {
    type Item = Pair;

    fn encode(&self, ctx: &mut EncodeContext<'_>, value: &Pair, out: &mut Vec<u8>) -> Result<()> {
        ctx.serialize(&value.left, out)?;
        ctx.serialize(&value.right, out)
    }

    fn decode(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<Pair>> {
        let left = ctx.deserialize(reader)?;
        let right = ctx.deserialize(reader)?;
        Ok(Arc::new(Pair { left, right }))
    }
}

/// Record with identity-carrying children, the cyclic-graph scenario type.
pub(crate) struct Node {
    pub name: String,
    pub children: Mutex<Vec<Value>>,
}

pub(crate) fn node(name: &str) -> Arc<Node> {
    Arc::new(Node {
        name: name.into(),
        children: Mutex::new(Vec::new()),
    })
}

pub(crate) struct NodeCodec;

impl ObjectCodec for NodeCodec {
    type Item = Node;

    fn encode(&self, ctx: &mut EncodeContext<'_>, value: &Node, out: &mut Vec<u8>) -> Result<()> {
        put_string(out, &value.name);
        // Snapshot before recursing: a cycle re-enters this codec for the
        // same node, and the lock is not reentrant.
        let children: Vec<Value> = value.children.lock().unwrap().clone();
        put_uvarint(out, children.len() as u64);
        for child in &children {
            ctx.serialize(child, out)?;
        }
        Ok(())
    }

    fn decode(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<Node>> {
        let name = get_string(reader)?;
        let node = Arc::new(Node {
            name,
            children: Mutex::new(Vec::new()),
        });
        // Children may point back at this node; make it resolvable first.
        ctx.register_initial_value(Value::from_arc(node.clone()));
        let n = reader.get_uvarint()?;
        let mut children = Vec::new();
        for _ in 0..n {
            children.push(ctx.deserialize(reader)?);
        }
        *node.children.lock().unwrap() = children;
        Ok(node)
    }
}

/// Same shape as [`Node`] but its codec never registers an initial value,
/// so decoding a cycle through it must fail.
pub(crate) struct LeakyNode {
    pub children: Mutex<Vec<Value>>,
}

pub(crate) struct LeakyNodeCodec;

impl ObjectCodec for LeakyNodeCodec {
    type Item = LeakyNode;

    fn encode(
        &self,
        ctx: &mut EncodeContext<'_>,
        value: &LeakyNode,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let children: Vec<Value> = value.children.lock().unwrap().clone();
        put_uvarint(out, children.len() as u64);
        for child in &children {
            ctx.serialize(child, out)?;
        }
        Ok(())
    }

    fn decode(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<LeakyNode>> {
        let n = reader.get_uvarint()?;
        let mut children = Vec::new();
        for _ in 0..n {
            children.push(ctx.deserialize(reader)?);
        }
        Ok(Arc::new(LeakyNode {
            children: Mutex::new(children),
        }))
    }
}

/// Ambient dependency: a namespace prefix not worth serializing per value.
pub(crate) struct Namespace(pub String);

/// A name serialized as its suffix only; the namespace prefix is stripped on
/// encode and reattached from the ambient dependency map on decode.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ScopedName {
    pub full: String,
}

pub(crate) struct ScopedNameCodec;

impl ObjectCodec for ScopedNameCodec {
    type Item = ScopedName;

    fn encode(
        &self,
        ctx: &mut EncodeContext<'_>,
        value: &ScopedName,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let namespace = ctx.dependency::<Namespace>()?;
        let suffix = value
            .full
            .strip_prefix(&format!("{}::", namespace.0))
            .ok_or_else(|| codec_error(format!("`{}` is outside the namespace", value.full)))?;
        put_string(out, suffix);
        Ok(())
    }

    fn decode(&self, ctx: &mut DecodeContext<'_>, reader: &mut Reader) -> Result<Arc<ScopedName>> {
        let namespace = ctx.dependency::<Namespace>()?;
        let suffix = get_string(reader)?;
        Ok(Arc::new(ScopedName {
            full: format!("{}::{}", namespace.0, suffix),
        }))
    }
}

/// Misbehaving codec: registers an initial value, then returns a fresh
/// allocation. Exercises the identity check at commit time.
pub(crate) struct SwapItem;

pub(crate) struct SwapCodec;

impl ObjectCodec for SwapCodec {
    type Item = SwapItem;

    fn encode(
        &self,
        _ctx: &mut EncodeContext<'_>,
        _value: &SwapItem,
        _out: &mut Vec<u8>,
    ) -> Result<()> {
        Ok(())
    }

    fn decode(&self, ctx: &mut DecodeContext<'_>, _reader: &mut Reader) -> Result<Arc<SwapItem>> {
        ctx.register_initial_value(Value::new(SwapItem));
        Ok(Arc::new(SwapItem))
    }
}
