use std::fmt;

use crate::{DecodeError, DispatchError, ReadBuffer};

/// Decode entry point stored in a [`Registry`].
pub type DecodeFn<M> = fn(&mut ReadBuffer<'_>) -> Result<M, DecodeError>;

/// One row of the identifier table.
pub struct RegistryEntry<M: 'static> {
    pub id:     u32,
    pub name:   &'static str,
    pub decode: DecodeFn<M>,
}

impl<M: 'static> fmt::Debug for RegistryEntry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Identifier → decode table used to demultiplex inbound frames.
///
/// Generated code builds one of these as a `static` from entries sorted by
/// identifier, so lookups are a binary search and nothing is allocated.
pub struct Registry<M: 'static> {
    entries: &'static [RegistryEntry<M>],
}

impl<M: 'static> Registry<M> {
    /// `entries` must be sorted by `id` with no duplicates.
    pub const fn new(entries: &'static [RegistryEntry<M>]) -> Self {
        Registry { entries }
    }

    pub fn entries(&self) -> &'static [RegistryEntry<M>] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&'static RegistryEntry<M>> {
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Registered identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + 'static {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Decode the message registered under `id` from the buffer's cursor.
    pub fn decode(&self, id: u32, buf: &mut ReadBuffer<'_>) -> Result<M, DispatchError> {
        let entry = self.get(id).ok_or(DispatchError::UnknownId(id))?;
        Ok((entry.decode)(buf)?)
    }

    /// Decode a whole frame payload whose identifier was read by the transport.
    pub fn decode_frame(&self, id: u32, payload: &[u8]) -> Result<M, DispatchError> {
        self.decode(id, &mut ReadBuffer::new(payload))
    }
}

impl<M: 'static> fmt::Debug for Registry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Any {
        Ping,
        Clock(u32),
    }

    fn decode_ping(_: &mut ReadBuffer<'_>) -> Result<Any, DecodeError> {
        Ok(Any::Ping)
    }

    fn decode_clock(buf: &mut ReadBuffer<'_>) -> Result<Any, DecodeError> {
        Ok(Any::Clock(buf.read_u32()?))
    }

    static REGISTRY: Registry<Any> = Registry::new(&[
        RegistryEntry { id: 2, name: "Ping", decode: decode_ping },
        RegistryEntry { id: 9, name: "Clock", decode: decode_clock },
    ]);

    #[test]
    fn lookup_by_identifier() {
        assert_eq!(REGISTRY.len(), 2);
        assert_eq!(REGISTRY.get(9).map(|e| e.name), Some("Clock"));
        assert!(REGISTRY.contains(2));
        assert!(!REGISTRY.contains(3));
        assert_eq!(REGISTRY.ids().collect::<Vec<_>>(), vec![2, 9]);
    }

    #[test]
    fn dispatch_frames() {
        assert_eq!(REGISTRY.decode_frame(2, &[]), Ok(Any::Ping));
        assert_eq!(REGISTRY.decode_frame(9, &[5, 0, 0, 0]), Ok(Any::Clock(5)));
        assert_eq!(REGISTRY.decode_frame(4, &[]), Err(DispatchError::UnknownId(4)));
        assert!(matches!(
            REGISTRY.decode_frame(9, &[5]),
            Err(DispatchError::Decode(DecodeError::Truncated { .. }))
        ));
    }
}
