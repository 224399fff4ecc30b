#![no_main]

use libfuzzer_sys::fuzz_target;

use arbitrary::Arbitrary;
use loquat::{Id, Key, Record, Table};
use std::collections::HashMap as StdHashMap;

#[derive(Debug, Arbitrary)]
enum Operation {
    Insert(u8),
    Remove(u8),
    Get(u8),
    Contains(u8),
    Clear,
    Len,
    IsEmpty,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    operations: Vec<Operation>,
}

struct FuzzRecord {
    key: Key,
    value: usize,
}

impl Record for FuzzRecord {
    fn key(&self) -> Key {
        self.key
    }
}

fn key(k: u8) -> Key {
    Key::new(Id::from_u128(k as u128))
}

fn fuzz_table(input: FuzzInput) {
    // The table borrows its records, so allocate one per insert up front.
    let records: Vec<FuzzRecord> = input
        .operations
        .iter()
        .enumerate()
        .filter_map(|(i, op)| match op {
            Operation::Insert(k) => Some(FuzzRecord {
                key: key(*k),
                value: i,
            }),
            _ => None,
        })
        .collect();
    let mut inserts = records.iter();

    // Ids are single bytes, so with room for 511 records the table can
    // never fill up.
    let mut std_map = StdHashMap::new();
    let mut table = Table::with_capacity(512);

    for op in input.operations {
        match op {
            Operation::Insert(k) => {
                let record = inserts.next().unwrap();
                let std_result = std_map.insert(k, record.value);
                let table_result = table.insert(record).map(|r| r.value);
                assert_eq!(std_result, table_result);
            }
            Operation::Remove(k) => {
                let std_result = std_map.remove(&k);
                let table_result = table.remove(key(k)).map(|r| r.value);
                assert_eq!(std_result, table_result);
            }
            Operation::Get(k) => {
                let std_result = std_map.get(&k).copied();
                let table_result = table.get(key(k)).map(|r| r.value);
                assert_eq!(std_result, table_result);
            }
            Operation::Contains(k) => {
                let std_result = std_map.contains_key(&k);
                let table_result = table.contains_key(key(k));
                assert_eq!(std_result, table_result);
            }
            Operation::Clear => {
                std_map.clear();
                table.clear();
            }
            Operation::Len => {
                assert_eq!(std_map.len(), table.len());
            }
            Operation::IsEmpty => {
                assert_eq!(std_map.is_empty(), table.is_empty());
            }
        }
    }

    // Final consistency checks
    for (k, v) in std_map.iter() {
        let table_result = table.get(key(*k)).map(|r| r.value);
        assert_eq!(Some(*v), table_result);
    }
    assert_eq!(std_map.len(), table.len());
    assert_eq!(std_map.is_empty(), table.is_empty());
}

fuzz_target!(|data: FuzzInput| {
    fuzz_table(data);
});
