//! Builds a synthetic collision workload against `HashTable` and prints the
//! resulting PSL histogram and occupancy statistics.
//!
//! The workload hashes keys to themselves and lays out collision chains of
//! cycling lengths across the lower part of the slot array, so the printed
//! distribution is exact and identical on every run.
//!
//! Requires the `stats` feature:
//!
//! ```text
//! cargo run --example psl_demo --features stats
//! ```

use std::hash::BuildHasher;
use std::hash::Hasher;

use clap::Parser;
use rh_hash::HashTable;

#[derive(Parser)]
struct Args {
    /// Table capacity; rounds up to a power of two.
    #[arg(short = 'c', long = "capacity", default_value_t = 4096)]
    capacity: usize,

    /// Longest collision chain to build. Must stay below the table's PSL
    /// bound so the workload never forces a growth.
    #[arg(short = 'm', long = "max_chain", default_value_t = 8)]
    max_chain: usize,

    /// Percentage of keys to re-insert afterwards to demonstrate duplicate
    /// rejection.
    #[arg(short = 'd', long = "duplicate_percent", default_value_t = 25)]
    duplicate_percent: usize,
}

/// Hashes a `u64` key to itself so the workload picks ideal slots exactly.
#[derive(Clone, Default)]
struct IdentityBuild;

impl BuildHasher for IdentityBuild {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = (self.0 << 8) | u64::from(byte);
        }
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

fn main() {
    let args = Args::parse();
    assert!(args.max_chain >= 1, "max_chain must be at least 1");
    assert!(
        args.duplicate_percent <= 100,
        "duplicate_percent is a percentage"
    );

    let mut table: HashTable<u64, u64, IdentityBuild> =
        HashTable::with_capacity_and_hasher(args.capacity, IdentityBuild);
    let n_buckets = table.bucket_count();
    assert!(
        (args.max_chain as u32) < table.max_psl(),
        "max_chain {} must stay below the PSL bound {}; raise --capacity",
        args.max_chain,
        table.max_psl()
    );

    // Chain bases are spaced so neighboring chains never touch, and the top
    // quarter of the array is left empty so no probe ever nears its end.
    // Keys base + j * n_buckets all share ideal slot `base`, putting a
    // length-L chain at slots base..base + L with PSLs 0..L.
    let spacing = args.max_chain + 1;
    let mut keys = Vec::new();
    for (group, base) in (0..3 * n_buckets / 4).step_by(spacing).enumerate() {
        let length = 1 + group % args.max_chain;
        for j in 0..length as u64 {
            keys.push(base as u64 + j * n_buckets as u64);
        }
    }

    for &key in &keys {
        table.insert(key, key).expect("workload keys are distinct");
    }
    println!("inserted {} entries into {} buckets", keys.len(), n_buckets);

    let attempts = keys.len() * args.duplicate_percent / 100;
    let rejected = keys[..attempts]
        .iter()
        .filter(|&&key| table.insert(key, 0).is_err())
        .count();
    println!(
        "re-inserted {} existing keys, {} rejected as duplicates",
        attempts, rejected
    );
    println!();

    table.stats().print();
    println!();
    table.print_psl_histogram();
}
