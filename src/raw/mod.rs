mod lock;
mod probe;
mod utils;

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use self::lock::SlotLock;
use self::probe::Probe;
use self::utils::CachePadded;
use crate::record::{Key, Record};

// The contents of a single slot.
//
// The tri-state distinguishes a slot that has never held a record from one
// whose record was deleted: probes stop at `Empty` but walk through
// `Tombstone`, or records displaced past a deletion would become
// unreachable.
pub enum SlotState<'r, R> {
    // The slot has never held a record.
    Empty,
    // The slot held a record that was since deleted. Tombstones never
    // revert to `Empty` while the table is shared; they are only reclaimed
    // by an insert or an exclusive `clear`.
    Tombstone,
    // The slot holds a live record.
    Occupied(&'r R),
}

impl<R> Clone for SlotState<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for SlotState<'_, R> {}

// A single slot: a lock and the state it guards.
pub struct Slot<'r, R> {
    lock: SlotLock,
    state: UnsafeCell<SlotState<'r, R>>,
}

// Safety: the state cell is only accessed with the slot lock held, and the
// record references handed out are `&'r R`, shared across threads.
unsafe impl<R: Sync> Sync for Slot<'_, R> {}

impl<'r, R> Slot<'r, R> {
    fn new() -> Slot<'r, R> {
        Slot {
            lock: SlotLock::new(),
            state: UnsafeCell::new(SlotState::Empty),
        }
    }

    // Locks the slot, returning a guard that releases it on drop.
    #[inline]
    fn lock(&self) -> SlotGuard<'_, 'r, R> {
        self.lock.lock();
        SlotGuard { slot: self }
    }
}

// Holds a slot's lock, exposing the state it guards.
//
// Probes never hold two guards at once: a guard is always dropped before
// the next slot is locked.
pub struct SlotGuard<'t, 'r, R> {
    slot: &'t Slot<'r, R>,
}

impl<'t, 'r, R> SlotGuard<'t, 'r, R> {
    #[inline]
    fn get(&self) -> SlotState<'r, R> {
        // Safety: the lock is held for the lifetime of the guard.
        unsafe { *self.slot.state.get() }
    }

    #[inline]
    fn set(&mut self, state: SlotState<'r, R>) {
        // Safety: the lock is held for the lifetime of the guard.
        unsafe { *self.slot.state.get() = state }
    }
}

impl<R> Drop for SlotGuard<'_, '_, R> {
    #[inline]
    fn drop(&mut self) {
        // Safety: the guard holds the lock by construction.
        unsafe { self.slot.lock.unlock() }
    }
}

// Storage for a table: the slot array and its occupancy count.
pub struct RawTable<'r, R> {
    // The slot array; the length is always a power of two.
    slots: Box<[Slot<'r, R>]>,
    // Mask for the table length.
    mask: usize,
    // The number of occupied slots, kept strictly below the table length.
    occupied: CachePadded<AtomicUsize>,
}

impl<'r, R> RawTable<'r, R> {
    // Allocates a table with at least `capacity` slots, all empty.
    pub fn with_capacity(capacity: usize) -> RawTable<'r, R> {
        let len = capacity
            .checked_next_power_of_two()
            .expect("capacity overflow")
            .max(2);
        let slots = (0..len).map(|_| Slot::new()).collect();

        RawTable {
            slots,
            mask: len - 1,
            occupied: CachePadded {
                value: AtomicUsize::new(0),
            },
        }
    }

    // Returns the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    // Returns the number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied.value.load(Ordering::Relaxed)
    }

    // Resets every slot to empty.
    //
    // Exclusive access means no probe is in flight, so tombstones can be
    // dropped wholesale. This is the only way a tombstone becomes empty.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot.state.get_mut() = SlotState::Empty;
        }
        *self.occupied.value.get_mut() = 0;
    }

    // Returns an iterator over the live records.
    pub fn iter(&self) -> Iter<'_, 'r, R> {
        Iter { table: self, i: 0 }
    }

    // Reserves one occupied slot, panicking if none remain.
    //
    // Occupied slots are capped at `len - 1`, so every probe cycle contains
    // at least one empty or tombstoned slot and probes terminate.
    #[inline]
    fn reserve_one(&self) {
        let occupied = self.occupied.value.fetch_add(1, Ordering::Relaxed) + 1;
        if occupied > self.mask {
            self.occupied.value.fetch_sub(1, Ordering::Relaxed);
            full();
        }
    }

    // Releases a previously reserved occupied slot.
    #[inline]
    fn release_one(&self) {
        let occupied = self.occupied.value.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(occupied > 0);
    }
}

impl<'r, R> RawTable<'r, R>
where
    R: Record,
{
    // Inserts a record, returning the record it replaced, if any.
    //
    // A tombstone on the probe chain is not claimed outright: a live copy
    // of the id may sit further along the chain, and storing into the
    // tombstone would shadow it. Instead the first tombstone is remembered
    // and the walk continues; if the id turns up it is overwritten in
    // place, and only once the chain ends is the remembered slot claimed.
    pub fn insert(&self, record: &'r R) -> Option<&'r R> {
        let key = record.key();
        let len = self.slots.len();

        'probe: loop {
            let mut probe = Probe::start(key.hash, len);

            // The first tombstone on the chain, reusable once the id is
            // known to be absent.
            let mut tombstone = None;

            loop {
                let mut slot = self.slots[probe.i].lock();

                match slot.get() {
                    // The chain ends here: the id is not in the table.
                    // Reclaim the first tombstone seen on the way, or
                    // claim this slot.
                    SlotState::Empty => match tombstone {
                        None => {
                            self.reserve_one();
                            slot.set(SlotState::Occupied(record));
                            return None;
                        }
                        Some(i) => {
                            drop(slot);

                            match self.claim(i, record, key) {
                                Claimed::Fresh => return None,
                                Claimed::Replaced(old) => return Some(old),
                                Claimed::Lost => continue 'probe,
                            }
                        }
                    },

                    SlotState::Tombstone => {
                        if tombstone.is_none() {
                            tombstone = Some(probe.i);
                        }
                    }

                    SlotState::Occupied(found) => {
                        if found.key().id == key.id {
                            slot.set(SlotState::Occupied(record));
                            return Some(found);
                        }
                    }
                }

                drop(slot);
                probe.next();

                if probe.exhausted() {
                    // A full cycle without an empty slot. The occupied
                    // bound means a tombstone was seen unless racing
                    // writers kept moving the free slot around the probe;
                    // in that case walk the chain again.
                    match tombstone {
                        Some(i) => match self.claim(i, record, key) {
                            Claimed::Fresh => return None,
                            Claimed::Replaced(old) => return Some(old),
                            Claimed::Lost => continue 'probe,
                        },
                        None => continue 'probe,
                    }
                }
            }
        }
    }

    // Re-locks the remembered slot `i` and installs `record` if the slot
    // is still reusable.
    //
    // The slot's lock was released while the rest of the chain was walked,
    // so its state must be checked again. Racing inserts of the same id
    // remember the same first tombstone and serialize here.
    fn claim(&self, i: usize, record: &'r R, key: Key) -> Claimed<'r, R> {
        let mut slot = self.slots[i].lock();

        match slot.get() {
            SlotState::Empty | SlotState::Tombstone => {
                self.reserve_one();
                slot.set(SlotState::Occupied(record));
                Claimed::Fresh
            }

            SlotState::Occupied(found) => {
                if found.key().id == key.id {
                    slot.set(SlotState::Occupied(record));
                    Claimed::Replaced(found)
                } else {
                    Claimed::Lost
                }
            }
        }
    }

    // Returns the live record for `key`, if any.
    pub fn get(&self, key: Key) -> Option<&'r R> {
        let mut probe = Probe::start(key.hash, self.slots.len());

        loop {
            let slot = self.slots[probe.i].lock();

            match slot.get() {
                // An empty slot means no insert ever continued the chain
                // past this point.
                SlotState::Empty => return None,
                SlotState::Tombstone => {}
                SlotState::Occupied(record) => {
                    if record.key().id == key.id {
                        return Some(record);
                    }
                }
            }

            drop(slot);
            probe.next();

            // A table with no empty slots can send a probe around the
            // full cycle; every slot has been checked at this point.
            if probe.exhausted() {
                return None;
            }
        }
    }

    // Removes the record for `key`, returning it if it was present.
    pub fn remove(&self, key: Key) -> Option<&'r R> {
        let mut probe = Probe::start(key.hash, self.slots.len());

        loop {
            let mut slot = self.slots[probe.i].lock();

            match slot.get() {
                SlotState::Empty => return None,
                SlotState::Tombstone => {}
                SlotState::Occupied(record) => {
                    if record.key().id == key.id {
                        // Deleted slots become tombstones, never empty: a
                        // record displaced past this slot must stay
                        // reachable.
                        slot.set(SlotState::Tombstone);
                        self.release_one();
                        return Some(record);
                    }
                }
            }

            drop(slot);
            probe.next();

            if probe.exhausted() {
                return None;
            }
        }
    }
}

// The result of claiming a remembered slot.
enum Claimed<'r, R> {
    // The record took a free slot.
    Fresh,
    // The record replaced a live copy of the same id.
    Replaced(&'r R),
    // The slot was taken by a different id; the probe must rerun.
    Lost,
}

#[cold]
fn full() -> ! {
    panic!("table is full");
}

// An iterator over the live records of a table.
//
// Each slot is visited once and locked only while it is inspected, so the
// yielded set is a point-in-time view: records inserted or removed while
// iterating may or may not be observed.
pub struct Iter<'t, 'r, R> {
    table: &'t RawTable<'r, R>,
    i: usize,
}

impl<'r, R> Iterator for Iter<'_, 'r, R> {
    type Item = &'r R;

    fn next(&mut self) -> Option<&'r R> {
        while self.i < self.table.slots.len() {
            let slot = self.table.slots[self.i].lock();
            self.i += 1;

            if let SlotState::Occupied(record) = slot.get() {
                return Some(record);
            }
        }

        None
    }
}
