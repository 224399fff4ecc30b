use std::fmt;

use crate::raw;
use crate::record::{Key, Record};

/// A fixed-capacity concurrent hash table of externally owned records.
///
/// The table maps 128-bit identifiers to records it does not own: callers
/// insert plain references and get them back on lookup and removal. The
/// `'r` lifetime ties the table to the records it may still reference, so
/// a record can only be dropped once the table (or the record's entry) is
/// gone.
///
/// Collisions are resolved by linear probing and deletions leave
/// tombstones, so probe chains survive removals. Each slot has its own
/// lock, held only while that slot is inspected; operations never hold two
/// slot locks at once.
///
/// # Examples
///
/// ```
/// use loquat::{Id, Key, Record, Table};
///
/// struct Session {
///     key: Key,
///     user: &'static str,
/// }
///
/// impl Record for Session {
///     fn key(&self) -> Key {
///         self.key
///     }
/// }
///
/// let alice = Session { key: Key::new(Id::from_u128(1)), user: "alice" };
///
/// let table = Table::with_capacity(16);
/// table.insert(&alice);
/// assert_eq!(table.get(alice.key()).map(|s| s.user), Some("alice"));
/// ```
pub struct Table<'r, R> {
    raw: raw::RawTable<'r, R>,
}

impl<'r, R> Table<'r, R> {
    /// Creates a table with at least `capacity` slots.
    ///
    /// The capacity is rounded up to the next power of two (minimum 2) and
    /// never changes; the table does not resize. One slot is always kept
    /// free so that probes terminate, so a table with capacity `n` holds
    /// at most `n - 1` records.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use loquat::{Key, Record, Table};
    /// # struct Session { key: Key }
    /// # impl Record for Session { fn key(&self) -> Key { self.key } }
    /// let table: Table<Session> = Table::with_capacity(10);
    /// assert_eq!(table.capacity(), 16);
    /// ```
    pub fn with_capacity(capacity: usize) -> Table<'r, R> {
        Table {
            raw: raw::RawTable::with_capacity(capacity),
        }
    }

    /// Returns the number of slots in the table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of live records.
    ///
    /// Under concurrent mutation the count is a point-in-time snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the table holds no live records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every record from the table.
    ///
    /// This also drops accumulated tombstones, which no shared-access
    /// operation ever does; exclusive access makes that sound because no
    /// probe can be mid-chain.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns an iterator over the live records.
    ///
    /// The iterator locks one slot at a time, briefly, and yields a
    /// point-in-time view: records inserted or removed during iteration
    /// may or may not be observed.
    pub fn iter(&self) -> Iter<'_, 'r, R> {
        Iter {
            raw: self.raw.iter(),
        }
    }
}

impl<'r, R> Table<'r, R>
where
    R: Record,
{
    /// Inserts a record, returning the record it replaced, if any.
    ///
    /// If a record with the same identifier is already in the table it is
    /// replaced and handed back; the table never holds two records with
    /// one identifier. The record's [`Key`] must stay stable for as long
    /// as the table may reference it.
    ///
    /// # Panics
    ///
    /// Panics if every usable slot is occupied (the table holds
    /// `capacity - 1` records). The table is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use loquat::{Id, Key, Record, Table};
    /// # struct Session { key: Key }
    /// # impl Record for Session { fn key(&self) -> Key { self.key } }
    /// let first = Session { key: Key::new(Id::from_u128(7)) };
    /// let second = Session { key: Key::new(Id::from_u128(7)) };
    ///
    /// let table = Table::with_capacity(16);
    /// assert!(table.insert(&first).is_none());
    ///
    /// // Same identifier: the first record is handed back.
    /// let old = table.insert(&second).unwrap();
    /// assert!(std::ptr::eq(old, &first));
    /// ```
    pub fn insert(&self, record: &'r R) -> Option<&'r R> {
        self.raw.insert(record)
    }

    /// Returns the live record for `key`, if any.
    ///
    /// The returned reference borrows the record, not the table: it stays
    /// valid after the table is dropped, and after the record is removed
    /// or replaced by another thread.
    #[inline]
    pub fn get(&self, key: Key) -> Option<&'r R> {
        self.raw.get(key)
    }

    /// Returns `true` if a record with `key`'s identifier is live.
    ///
    /// Under concurrent mutation presence is a point-in-time answer.
    #[inline]
    pub fn contains_key(&self, key: Key) -> bool {
        self.raw.get(key).is_some()
    }

    /// Removes the record for `key`, returning it if it was present.
    ///
    /// Removal is logical: the record itself is untouched and its slot
    /// becomes a tombstone. Removing an absent key is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// # use loquat::{Id, Key, Record, Table};
    /// # struct Session { key: Key }
    /// # impl Record for Session { fn key(&self) -> Key { self.key } }
    /// let session = Session { key: Key::new(Id::from_u128(3)) };
    ///
    /// let table = Table::with_capacity(16);
    /// table.insert(&session);
    ///
    /// assert!(table.remove(session.key()).is_some());
    /// assert!(table.remove(session.key()).is_none());
    /// ```
    pub fn remove(&self, key: Key) -> Option<&'r R> {
        self.raw.remove(key)
    }
}

impl<'r, R> fmt::Debug for Table<'r, R>
where
    R: Record + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|record| (record.key().id, record)))
            .finish()
    }
}

impl<'t, 'r, R> IntoIterator for &'t Table<'r, R> {
    type Item = &'r R;
    type IntoIter = Iter<'t, 'r, R>;

    fn into_iter(self) -> Iter<'t, 'r, R> {
        self.iter()
    }
}

/// An iterator over a table's live records, returned by [`Table::iter`].
pub struct Iter<'t, 'r, R> {
    raw: raw::Iter<'t, 'r, R>,
}

impl<'r, R> Iterator for Iter<'_, 'r, R> {
    type Item = &'r R;

    fn next(&mut self) -> Option<&'r R> {
        self.raw.next()
    }
}
