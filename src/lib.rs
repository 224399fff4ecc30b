#![doc = include_str!("../README.md")]

mod raw;
mod record;
mod table;

pub use record::{Id, Key, Record};
pub use table::{Iter, Table};
