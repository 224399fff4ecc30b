#![allow(dead_code)]

use loquat::{Id, Key, Record};

// A caller-owned record with a payload to check after retrieval.
pub struct TestRecord {
    key: Key,
    pub value: usize,
}

impl TestRecord {
    pub fn new(id: u128, value: usize) -> TestRecord {
        TestRecord {
            key: Key::new(Id::from_u128(id)),
            value,
        }
    }

    // A record with a caller-chosen hash, for forcing collisions.
    pub fn with_hash(id: u128, hash: u32, value: usize) -> TestRecord {
        TestRecord {
            key: Key::with_hash(Id::from_u128(id), hash),
            value,
        }
    }
}

impl Record for TestRecord {
    fn key(&self) -> Key {
        self.key
    }
}

// Prints a log message if `RUST_LOG=debug` is set.
#[macro_export]
macro_rules! debug {
    ($($x:tt)*) => {
        if std::env::var("RUST_LOG").as_deref() == Ok("debug") {
            println!($($x)*);
        }
    };
}

// Returns the number of threads to use for stress testing.
pub fn threads() -> usize {
    if cfg!(miri) {
        2
    } else {
        num_cpus::get_physical().next_power_of_two()
    }
}
