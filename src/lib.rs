#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation using Robin Hood hashing.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

/// A Robin Hood hash table keyed by arbitrary hashable types.
pub mod hash_table;

pub use hash_map::HashMap;
pub use hash_table::DuplicateKey;
pub use hash_table::HashTable;
pub use hash_table::LookupError;
#[cfg(any(feature = "stats", test))]
pub use hash_table::TableStats;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Default [`BuildHasher`](core::hash::BuildHasher) used by [`HashTable`]
        /// and [`HashMap`] when none is supplied.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Default [`BuildHasher`](core::hash::BuildHasher) used by [`HashTable`]
        /// and [`HashMap`] when none is supplied.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder hash builder used when neither the `foldhash` nor the
        /// `std` feature is enabled.
        ///
        /// This type is uninhabited; without a default hasher every table must
        /// be constructed through `with_hasher` or `with_capacity_and_hasher`.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}

        impl core::hash::BuildHasher for DefaultHashBuilder {
            type Hasher = NeverHasher;

            fn build_hasher(&self) -> NeverHasher {
                match *self {}
            }
        }

        /// Hasher type paired with the uninhabited [`DefaultHashBuilder`].
        #[derive(Clone, Copy, Debug)]
        pub enum NeverHasher {}

        impl core::hash::Hasher for NeverHasher {
            fn finish(&self) -> u64 {
                match *self {}
            }

            fn write(&mut self, _bytes: &[u8]) {
                match *self {}
            }
        }
    }
}
