use alloc::format;
use core::hash::BuildHasherDefault;
use core::hash::Hash;
use core::hint::black_box;
use std::collections::HashMap as StdHashMap;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownHashMap;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use rh_hash::HashTable;
use siphasher::sip::SipHasher;

extern crate alloc;

/// All tables hash through the same SipHash state so the comparison measures
/// table layout and probing, not hash function quality.
type SipState = BuildHasherDefault<SipHasher>;

trait TestPairs {
    type Key: Hash + Eq + Clone;
    type Value: Clone;

    fn pair(key: u64) -> (Self::Key, Self::Value);
}

struct SmallPair;

impl TestPairs for SmallPair {
    type Key = u64;
    type Value = u64;

    fn pair(key: u64) -> (Self::Key, Self::Value) {
        black_box((key, key))
    }
}

struct StringPair;

impl TestPairs for StringPair {
    type Key = String;
    type Value = u64;

    fn pair(key: u64) -> (Self::Key, Self::Value) {
        black_box((format!("key_{:016X}", key), key))
    }
}

struct LargePair;

impl TestPairs for LargePair {
    type Key = String;
    type Value = [u8; 256];

    fn pair(key: u64) -> (Self::Key, Self::Value) {
        let mut value = [0u8; 256];
        for (i, byte) in value.iter_mut().enumerate() {
            *byte = ((key >> ((i % 8) * 8)) & 0xFF) as u8;
        }
        black_box((format!("key_{:064b}", key), value))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 11),
    (1 << 12),
    (1 << 13),
    (1 << 14),
    (1 << 15),
    (1 << 16),
    (1 << 17),
    (1 << 18),
];

/// Zipf reads are drawn from a key space this many times larger than the
/// table population, so a tail of reads miss.
const KEY_SPACE_MULTIPLIER: usize = 2;

fn random_pairs<P: TestPairs>(count: usize) -> Vec<(P::Key, P::Value)> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| P::pair(rng.try_next_u64().unwrap()))
        .collect()
}

fn bench_insert_random<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<P>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let pairs = random_pairs::<P>(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut table = HashTable::with_hasher(SipState::default());
                    for (key, value) in pairs {
                        let _ = black_box(table.insert(key, value));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut map = HashbrownHashMap::with_hasher(SipState::default());
                    for (key, value) in pairs {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut map = StdHashMap::with_hasher(SipState::default());
                    for (key, value) in pairs {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_random_preallocated<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_random_preallocated_{}",
        core::any::type_name::<P>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let pairs = random_pairs::<P>(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut table =
                        HashTable::with_capacity_and_hasher(*size * 2, SipState::default());
                    for (key, value) in pairs {
                        let _ = black_box(table.insert(key, value));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut map =
                        HashbrownHashMap::with_capacity_and_hasher(*size, SipState::default());
                    for (key, value) in pairs {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter_batched(
                || {
                    let mut pairs = pairs.clone();
                    pairs.shuffle(&mut SmallRng::from_os_rng());
                    pairs
                },
                |pairs| {
                    let mut map = StdHashMap::with_capacity_and_hasher(*size, SipState::default());
                    for (key, value) in pairs {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Duplicate-heavy insert stream: every key is drawn from a pool a quarter
/// the stream length, so roughly three quarters of the inserts hit an equal
/// key. The Robin Hood table rejects those outright; the comparison maps get
/// the equivalent keep-first behavior through their entry APIs.
fn bench_insert_duplicates<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_duplicates_{}", core::any::type_name::<P>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let pool = random_pairs::<P>((*size / 4).max(1));
        let mut rng = SmallRng::from_os_rng();
        let stream: Vec<(P::Key, P::Value)> = (0..*size)
            .map(|_| pool[rng.random_range(0..pool.len())].clone())
            .collect();

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter_batched(
                || stream.clone(),
                |stream| {
                    let mut table = HashTable::with_hasher(SipState::default());
                    for (key, value) in stream {
                        let _ = black_box(table.insert(key, value));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter_batched(
                || stream.clone(),
                |stream| {
                    let mut map = HashbrownHashMap::with_hasher(SipState::default());
                    for (key, value) in stream {
                        black_box(map.entry(key).or_insert(value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter_batched(
                || stream.clone(),
                |stream| {
                    let mut map = StdHashMap::with_hasher(SipState::default());
                    for (key, value) in stream {
                        black_box(map.entry(key).or_insert(value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_{}", core::any::type_name::<P>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let pairs = random_pairs::<P>(*size);

        let mut table = HashTable::with_capacity_and_hasher(*size * 2, SipState::default());
        let mut hashbrown_map =
            HashbrownHashMap::with_capacity_and_hasher(*size, SipState::default());
        let mut std_map = StdHashMap::with_capacity_and_hasher(*size, SipState::default());
        for (key, value) in pairs.iter().cloned() {
            let _ = table.insert(key.clone(), value.clone());
            hashbrown_map.insert(key.clone(), value.clone());
            std_map.insert(key, value);
        }

        let mut keys: Vec<P::Key> = pairs.iter().map(|(k, _)| k.clone()).collect();
        keys.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(table.lookup(black_box(key)).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("rh_hash_displacement", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(table.lookup_by_displacement(black_box(key)).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(hashbrown_map.get(black_box(key)));
                }
            })
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(std_map.get(black_box(key)));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_miss<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_miss_{}", core::any::type_name::<P>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        // Twice the pairs; the second half is generated but never inserted.
        let pairs = random_pairs::<P>(*size * 2);
        let (present, absent) = pairs.split_at(*size);

        let mut table = HashTable::with_capacity_and_hasher(*size * 2, SipState::default());
        let mut hashbrown_map =
            HashbrownHashMap::with_capacity_and_hasher(*size, SipState::default());
        let mut std_map = StdHashMap::with_capacity_and_hasher(*size, SipState::default());
        for (key, value) in present.iter().cloned() {
            let _ = table.insert(key.clone(), value.clone());
            hashbrown_map.insert(key.clone(), value.clone());
            std_map.insert(key, value);
        }

        let mut keys: Vec<P::Key> = absent.iter().map(|(k, _)| k.clone()).collect();
        keys.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(table.lookup(black_box(key)).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("rh_hash_displacement", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(table.lookup_by_displacement(black_box(key)).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(hashbrown_map.get(black_box(key)));
                }
            })
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(std_map.get(black_box(key)));
                }
            })
        });
    }

    group.finish();
}

/// Zipf-skewed read workload over a populated table. Keys are indexed rather
/// than random so the distribution's rank maps directly onto table entries;
/// ranks past the population miss.
fn bench_read_zipf<P: TestPairs, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("read_zipf_{}", core::any::type_name::<P>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let mut table = HashTable::with_capacity_and_hasher(*size * 2, SipState::default());
        let mut hashbrown_map =
            HashbrownHashMap::with_capacity_and_hasher(*size, SipState::default());
        let mut std_map = StdHashMap::with_capacity_and_hasher(*size, SipState::default());
        for i in 0..*size {
            let (key, value) = P::pair(i as u64);
            let _ = table.insert(key.clone(), value.clone());
            hashbrown_map.insert(key.clone(), value.clone());
            std_map.insert(key, value);
        }

        let read_distr = Zipf::new(*size as f32 * KEY_SPACE_MULTIPLIER as f32 - 1.0, 1.0).unwrap();
        let mut rng = SmallRng::from_os_rng();

        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(BenchmarkId::new("rh_hash", size), |b| {
            b.iter(|| {
                for _ in 0..*size {
                    let key = P::pair(rng.sample(read_distr) as u64 - 1).0;
                    black_box(table.lookup(&key).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("rh_hash_displacement", size), |b| {
            b.iter(|| {
                for _ in 0..*size {
                    let key = P::pair(rng.sample(read_distr) as u64 - 1).0;
                    black_box(table.lookup_by_displacement(&key).ok());
                }
            })
        });

        group.bench_function(BenchmarkId::new("hashbrown", size), |b| {
            b.iter(|| {
                for _ in 0..*size {
                    let key = P::pair(rng.sample(read_distr) as u64 - 1).0;
                    black_box(hashbrown_map.get(&key));
                }
            })
        });

        group.bench_function(BenchmarkId::new("std", size), |b| {
            b.iter(|| {
                for _ in 0..*size {
                    let key = P::pair(rng.sample(read_distr) as u64 - 1).0;
                    black_box(std_map.get(&key));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<SmallPair, 8>,
    bench_insert_random::<StringPair, 8>,
    bench_insert_random::<LargePair, 5>,
    bench_insert_random_preallocated::<SmallPair, 8>,
    bench_insert_random_preallocated::<StringPair, 8>,
    bench_insert_random_preallocated::<LargePair, 5>,
    bench_insert_duplicates::<SmallPair, 8>,
    bench_insert_duplicates::<StringPair, 8>,
    bench_insert_duplicates::<LargePair, 5>,
    bench_find_hit::<SmallPair, 8>,
    bench_find_hit::<StringPair, 8>,
    bench_find_hit::<LargePair, 5>,
    bench_find_miss::<SmallPair, 8>,
    bench_find_miss::<StringPair, 8>,
    bench_find_miss::<LargePair, 5>,
    bench_read_zipf::<SmallPair, 8>,
    bench_read_zipf::<StringPair, 8>,
    bench_read_zipf::<LargePair, 5>,
);
criterion_main!(benches);
