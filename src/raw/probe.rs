// A linear probe sequence.
//
// Every operation walks the same sequence: start at `hash & (len - 1)` and
// advance one slot at a time, wrapping at the end of the table. The sequence
// is exhausted once it has visited every slot, i.e. after one full cycle.
pub struct Probe {
    // The current slot index.
    pub i: usize,
    // The number of slots already visited.
    pub len: usize,
    // Mask for the length of the table.
    mask: usize,
}

impl Probe {
    // Initialize the probe sequence for the given hash.
    #[inline]
    pub fn start(hash: u32, len: usize) -> Probe {
        debug_assert!(len.is_power_of_two());

        Probe {
            i: (hash as usize) & (len - 1),
            len: 0,
            mask: len - 1,
        }
    }

    // Advance to the next slot in the sequence.
    #[inline]
    pub fn next(&mut self) {
        self.len += 1;
        self.i = (self.i + 1) & self.mask;
    }

    // Whether the probe has visited every slot in the table.
    #[inline]
    pub fn exhausted(&self) -> bool {
        self.len > self.mask
    }
}

#[test]
fn full_cycle() {
    let mut probe = Probe::start(6, 8);

    let mut seen = Vec::new();
    while !probe.exhausted() {
        seen.push(probe.i);
        probe.next();
    }

    assert_eq!(seen, [6, 7, 0, 1, 2, 3, 4, 5]);
}

#[test]
fn masks_high_bits() {
    let probe = Probe::start(0xdead_beef, 8);
    assert_eq!(probe.i, 0xdead_beef & 7);
}
