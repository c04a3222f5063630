//! Error types and helpers.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no codec registered for type `{0}`")]
    MissingCodec(&'static str),
    #[error("no codec registered for wire tag {0}")]
    UnknownWireTag(u64),
    #[error("missing ambient dependency `{0}`")]
    MissingDependency(&'static str),
    #[error("duplicate codec registration for type `{0}`")]
    DuplicateRegistration(&'static str),
    #[error("truncated stream: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: u64 },
    #[error("varint at offset {0} overflows u64")]
    VarintOverflow(usize),
    #[error("back-reference at offset {0} in a non-memoized stream")]
    UnexpectedBackref(usize),
    #[error("back-reference at offset {offset} to unreserved id {id}")]
    UnreservedBackref { offset: usize, id: u64 },
    #[error("cycle through id {0} reaches a value with no registered initial value")]
    CycleWithoutInitialValue(u64),
    #[error("codec for `{type_name}` left {remaining} bytes of its payload unread")]
    PayloadTrailingBytes {
        type_name: &'static str,
        remaining: usize,
    },
    #[error("{0} trailing bytes after the deserialized value")]
    TrailingBytes(usize),
    #[error("codec for `{0}` returned a value other than its registered initial value")]
    InitialValueMismatch(&'static str),
    #[error("value graph exceeds the depth limit of {0}")]
    DepthLimit(usize),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("failed to serialize `{type_name}`")]
    Write {
        type_name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stream for deserialization")]
    Read(#[source] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[cold]
pub const fn missing_codec(type_name: &'static str) -> Error {
    Error::MissingCodec(type_name)
}

#[cold]
pub const fn unknown_wire_tag(tag: u64) -> Error {
    Error::UnknownWireTag(tag)
}

#[cold]
pub const fn missing_dependency(type_name: &'static str) -> Error {
    Error::MissingDependency(type_name)
}

#[cold]
pub const fn duplicate_registration(type_name: &'static str) -> Error {
    Error::DuplicateRegistration(type_name)
}

#[cold]
pub const fn truncated(offset: usize, needed: u64) -> Error {
    Error::Truncated { offset, needed }
}

#[cold]
pub const fn varint_overflow(offset: usize) -> Error {
    Error::VarintOverflow(offset)
}

#[cold]
pub const fn unexpected_backref(offset: usize) -> Error {
    Error::UnexpectedBackref(offset)
}

#[cold]
pub const fn unreserved_backref(offset: usize, id: u64) -> Error {
    Error::UnreservedBackref { offset, id }
}

#[cold]
pub const fn cycle_without_initial_value(id: u64) -> Error {
    Error::CycleWithoutInitialValue(id)
}

#[cold]
pub const fn payload_trailing_bytes(type_name: &'static str, remaining: usize) -> Error {
    Error::PayloadTrailingBytes {
        type_name,
        remaining,
    }
}

#[cold]
pub const fn trailing_bytes(remaining: usize) -> Error {
    Error::TrailingBytes(remaining)
}

#[cold]
pub const fn initial_value_mismatch(type_name: &'static str) -> Error {
    Error::InitialValueMismatch(type_name)
}

#[cold]
pub const fn depth_limit(limit: usize) -> Error {
    Error::DepthLimit(limit)
}

#[cold]
pub fn codec_error(message: impl Into<String>) -> Error {
    Error::Codec(message.into())
}

#[cold]
pub fn write_failed(type_name: &'static str, source: std::io::Error) -> Error {
    Error::Write { type_name, source }
}

#[cold]
pub fn read_failed(source: std::io::Error) -> Error {
    Error::Read(source)
}
