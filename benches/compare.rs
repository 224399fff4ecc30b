use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use loquat::{Id, Key, Record, Table};

const SIZE: usize = 10_000;

struct Entry {
    key: Key,
    value: usize,
}

impl Entry {
    fn new(i: usize) -> Entry {
        Entry {
            key: Key::new(Id::from_u128(i as u128)),
            value: i,
        }
    }
}

impl Record for Entry {
    fn key(&self) -> Key {
        self.key
    }
}

fn compare(c: &mut Criterion) {
    #[derive(Clone, Copy)]
    struct RandomKeys {
        state: usize,
    }

    impl RandomKeys {
        fn new() -> Self {
            RandomKeys { state: 0 }
        }
    }

    impl Iterator for RandomKeys {
        type Item = usize;
        fn next(&mut self) -> Option<usize> {
            // Add 1 then multiply by some 32 bit prime.
            self.state = self.state.wrapping_add(1).wrapping_mul(3_787_392_781);
            Some(self.state)
        }
    }

    let mut group = c.benchmark_group("read");

    group.bench_function("loquat", |b| {
        let records: Vec<_> = RandomKeys::new().take(SIZE).map(Entry::new).collect();
        let table = Table::with_capacity(2 * SIZE);
        for record in &records {
            table.insert(record);
        }

        b.iter(|| {
            for record in &records {
                black_box(assert_eq!(
                    table.get(record.key()).map(|r| r.value),
                    Some(record.value)
                ));
            }
        });
    });

    group.bench_function("std", |b| {
        let mut m = HashMap::<u128, usize>::default();
        for i in RandomKeys::new().take(SIZE) {
            m.insert(i as u128, i);
        }

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                black_box(assert_eq!(m.get(&(i as u128)), Some(&i)));
            }
        });
    });

    group.bench_function("dashmap", |b| {
        let m = dashmap::DashMap::<u128, usize>::default();
        for i in RandomKeys::new().take(SIZE) {
            m.insert(i as u128, i);
        }

        b.iter(|| {
            for i in RandomKeys::new().take(SIZE) {
                black_box(assert_eq!(*m.get(&(i as u128)).unwrap(), i));
            }
        });
    });

    group.finish();

    let mut group = c.benchmark_group("insert");

    group.bench_function("loquat", |b| {
        let records: Vec<_> = RandomKeys::new().take(SIZE).map(Entry::new).collect();

        b.iter(|| {
            let table = Table::with_capacity(2 * SIZE);
            for record in &records {
                table.insert(record);
            }
            black_box(table.len())
        });
    });

    group.bench_function("std", |b| {
        b.iter(|| {
            let mut m = HashMap::<u128, usize>::default();
            for i in RandomKeys::new().take(SIZE) {
                m.insert(i as u128, i);
            }
            black_box(m.len())
        });
    });

    group.bench_function("dashmap", |b| {
        b.iter(|| {
            let m = dashmap::DashMap::<u128, usize>::default();
            for i in RandomKeys::new().take(SIZE) {
                m.insert(i as u128, i);
            }
            black_box(m.len())
        });
    });

    group.finish();
}

criterion_group!(benches, compare);
criterion_main!(benches);
