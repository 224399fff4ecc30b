use std::fmt;

/// A 128-bit record identifier.
///
/// Identifiers are opaque 16-byte values compared structurally. The table
/// performs no arithmetic or ordering on them; equality is the only
/// operation, so any 16 bytes work (interned symbol addresses, UUIDs,
/// truncated digests).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id([u8; 16]);

impl Id {
    /// Creates an identifier from its raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Id {
        Id(bytes)
    }

    /// Creates an identifier from two 64-bit halves, least-significant
    /// half first.
    #[inline]
    pub const fn from_halves(lsb: u64, msb: u64) -> Id {
        let lsb = lsb.to_le_bytes();
        let msb = msb.to_le_bytes();

        let mut bytes = [0; 16];
        let mut i = 0;
        while i < 8 {
            bytes[i] = lsb[i];
            bytes[i + 8] = msb[i];
            i += 1;
        }

        Id(bytes)
    }

    /// Creates an identifier from a `u128`, in little-endian byte order.
    #[inline]
    pub const fn from_u128(value: u128) -> Id {
        Id(value.to_le_bytes())
    }

    /// Returns the identifier bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the reference 32-bit hash code for this identifier, a CRC32
    /// of its bytes.
    ///
    /// This is the mix [`Key::new`] applies. Callers are free to substitute
    /// any other mix through [`Key::with_hash`]; the table only ever masks
    /// the low bits of whatever hash a key carries.
    #[inline]
    pub fn hash_code(&self) -> u32 {
        crc32fast::hash(&self.0)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:#034x})", u128::from_le_bytes(self.0))
    }
}

/// A record header: an identifier plus its precomputed hash code.
///
/// The hash is computed once by the caller, before insertion, and trusted
/// blindly by the table. A hash inconsistent with its identifier makes the
/// entry unreachable, or reachable only by accident.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Key {
    /// The record identifier.
    pub id: Id,
    /// The 32-bit hash code used to pick a starting slot.
    pub hash: u32,
}

impl Key {
    /// Creates a key with the reference hash mix.
    #[inline]
    pub fn new(id: Id) -> Key {
        Key {
            id,
            hash: id.hash_code(),
        }
    }

    /// Creates a key with a caller-chosen hash code.
    #[inline]
    pub const fn with_hash(id: Id, hash: u32) -> Key {
        Key { id, hash }
    }
}

/// An externally owned record that can be stored in a [`Table`].
///
/// The table stores plain references and never copies, clones, or drops a
/// record; the borrow checker holds the caller to the record outliving the
/// table. `key` must return the same value for as long as the record may be
/// referenced by a table. The table compares identifiers and masks hashes
/// on every probe and relies on both being stable.
///
/// [`Table`]: crate::Table
pub trait Record {
    /// Returns the record's stable header.
    fn key(&self) -> Key;
}

#[test]
fn bytes_roundtrip() {
    let bytes = [0xfe, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 0xef];
    let id = Id::from_bytes(bytes);
    assert_eq!(id.as_bytes(), &bytes);
    assert_eq!(id, Id::from_u128(u128::from_le_bytes(bytes)));
    assert_ne!(id, Id::from_bytes([0; 16]));
}

#[test]
fn halves_match_le_bytes() {
    let id = Id::from_halves(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210);
    let expect = Id::from_u128((0xfedc_ba98_7654_3210_u128 << 64) | 0x0123_4567_89ab_cdef);
    assert_eq!(id, expect);
    assert_eq!(id.as_bytes(), expect.as_bytes());
}

#[test]
fn reference_mix_is_stable() {
    let id = Id::from_u128(42);
    assert_eq!(id.hash_code(), id.hash_code());
    assert_eq!(Key::new(id).hash, id.hash_code());
    assert_eq!(Key::with_hash(id, 7).hash, 7);
}
