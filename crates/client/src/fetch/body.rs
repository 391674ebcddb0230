//! Single-consumption response bodies.

use bytes::Bytes;

/// A response body that can be read exactly once.
///
/// Not `Clone`. Handing the same body to two consumers (return it to the
/// caller and write it to a store) requires [`Body::tee`], which consumes the
/// body and yields two independent readers over one shared buffer.
#[derive(Debug, Default)]
pub struct Body {
    bytes: Bytes,
}

impl Body {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Branch the body into two independent bodies.
    pub fn tee(self) -> (Body, Body) {
        let branch = self.bytes.clone();
        (Body { bytes: self.bytes }, Body { bytes: branch })
    }

    /// Consume the body.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Consume the body as UTF-8, replacing invalid sequences.
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
