use alloc::boxed::Box;
use core::fmt;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter;
use core::mem;

use crate::DefaultHashBuilder;

/// Bucket count used when no capacity is requested (or a capacity of zero).
const DEFAULT_CAPACITY: usize = 32;

/// Probe-sequence-length bound for a table of `n_buckets` slots.
///
/// Any probe that would reach this displacement abandons placement and grows
/// the table instead, which keeps worst-case chains logarithmic in the table
/// size and well short of the array end.
#[inline(always)]
fn psl_bound(n_buckets: usize) -> u32 {
    debug_assert!(n_buckets.is_power_of_two());
    n_buckets.ilog2()
}

#[inline(always)]
fn new_slots<K, V>(n_buckets: usize) -> Box<[Slot<K, V>]> {
    iter::repeat_with(|| Slot::Empty).take(n_buckets).collect()
}

#[derive(Clone)]
struct Bucket<K, V> {
    psl: u32,
    key: K,
    value: V,
}

#[derive(Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(Bucket<K, V>),
}

/// Outcome of one probe pass. `Duplicate` and `Full` hand the carried entry
/// back to the caller, which decides between reporting and regrowth.
enum ProbeOutcome<K, V> {
    Placed,
    Duplicate(Bucket<K, V>),
    Full(Bucket<K, V>),
}

/// Error returned by [`HashTable::insert`] when an equal key is already
/// present.
///
/// The table does not support upsert: the resident entry is left untouched
/// and the rejected key and value are handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey<K, V> {
    /// The key that was not inserted.
    pub key: K,
    /// The value that was not inserted.
    pub value: V,
}

impl<K, V> fmt::Display for DuplicateKey<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an equal key is already present in the table")
    }
}

impl<K, V> core::error::Error for DuplicateKey<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
}

/// Error returned by the lookup operations when a key is not found.
///
/// The three variants preserve the probe's distinct failure conditions rather
/// than collapsing them into a single "absent" answer; callers that only care
/// about presence can treat them interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    /// The probe reached an empty slot before finding the key.
    NotFound,
    /// The probe reached a slot whose recorded PSL exceeds the slot's
    /// physical index.
    ///
    /// This early exit compares against the absolute index rather than the
    /// probe's displacement from the ideal slot, a quirk preserved from the
    /// design this table reproduces. Because probing never wraps, a slot at
    /// index `p` can only record a PSL of at most `p`, so in practice this
    /// variant is never produced; it is kept so the failure taxonomy matches
    /// the probing contract. See [`HashTable::lookup_by_displacement`] for
    /// the displacement-based cutoff.
    FoundHigherPsl,
    /// The probe walked `max_psl` slots, or ran off the end of the array,
    /// without finding the key or an empty slot.
    ExceededBounds,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NotFound => f.write_str("key not found (reached an empty slot)"),
            LookupError::FoundHigherPsl => {
                f.write_str("probe found a slot with a higher PSL than its index")
            }
            LookupError::ExceededBounds => {
                f.write_str("probe exhausted its bound without finding the key")
            }
        }
    }
}

impl core::error::Error for LookupError {}

/// Occupancy and probe statistics for table analysis.
///
/// Available with the `stats` feature (and always under `cfg(test)`).
#[cfg(any(feature = "stats", test))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    /// Number of entries currently stored.
    pub populated: usize,
    /// Total number of slots allocated.
    pub bucket_count: usize,
    /// Current probe-sequence-length bound.
    pub max_psl: u32,
    /// `populated / bucket_count`.
    pub load_factor: f64,
    /// Exact size in bytes of the slot array.
    pub table_bytes: usize,
}

#[cfg(any(feature = "stats", test))]
impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Robin Hood Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.bucket_count,
            self.load_factor * 100.0
        );
        println!("PSL bound:  {}", self.max_psl);
        println!("Backing:    {} bytes", self.table_bytes);
    }
}

/// A hash table using Robin Hood hashing with a bounded probe-sequence
/// length.
///
/// `HashTable<K, V, S>` stores key-value pairs in a flat, power-of-two-sized
/// array of slots. Hashing is provided by a [`BuildHasher`] supplied at
/// construction and key equality by [`Eq`]; a key type that needs bespoke
/// semantics for either wraps itself in a newtype. Unlike the standard
/// library's map, `insert` never overwrites: inserting an equal key reports
/// [`DuplicateKey`] and leaves the table unchanged. There is no removal
/// operation.
///
/// ## Probing discipline
///
/// An insert walks forward from the key's ideal slot (`hash & (n - 1)`),
/// carrying the new entry at PSL 0. At each occupied slot the carried entry
/// either moves on (gaining one PSL) or, when the resident is richer (has a
/// strictly smaller PSL), swaps places with it and the walk continues with
/// the evicted resident. The walk is strictly linear and never wraps around
/// the end of the array. It is abandoned once the carried PSL reaches the
/// table's `max_psl` bound (`log2` of the bucket count) or the position runs
/// off the array; the table then doubles, rehashes every entry, and retries
/// the insert exactly once.
///
/// Growth invalidates value references and rewrites every slot, so `insert`
/// requires `&mut self` and lookups borrow the table for their result's
/// lifetime.
///
/// ## Example
///
/// ```rust
/// use rh_hash::HashTable;
///
/// let mut table: HashTable<u64, &str> = HashTable::new();
/// table.insert(1u64, "one").unwrap();
///
/// assert_eq!(table.lookup(&1), Ok(&"one"));
/// assert!(table.insert(1u64, "uno").is_err());
/// assert_eq!(table.len(), 1);
/// ```
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    slots: Box<[Slot<K, V>]>,
    buckets_used: usize,
    max_psl: u32,
    hash_builder: S,
}

impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            buckets_used: self.buckets_used,
            max_psl: self.max_psl,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("buckets_used", &self.buckets_used)
            .field("bucket_count", &self.slots.len())
            .field("max_psl", &self.max_psl)
            .finish_non_exhaustive()
    }
}

impl<K, V, S> HashTable<K, V, S> {
    /// Creates an empty table with the default capacity and the given hash
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::DefaultHashBuilder;
    /// use rh_hash::HashTable;
    ///
    /// let table: HashTable<u64, &str> = HashTable::with_hasher(DefaultHashBuilder::default());
    /// assert!(table.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty table with room for at least `capacity` buckets and
    /// the given hash builder.
    ///
    /// The bucket count is `capacity` rounded up to the next power of two; a
    /// capacity of zero selects the 32-bucket default. The PSL bound is
    /// `log2` of the bucket count, so small explicit capacities grow after
    /// only a few collisions — useful for exercising the growth path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::DefaultHashBuilder;
    /// use rh_hash::HashTable;
    ///
    /// let table: HashTable<u64, ()> = HashTable::with_capacity_and_hasher(
    ///     5,
    ///     DefaultHashBuilder::default(),
    /// );
    /// assert_eq!(table.bucket_count(), 8);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let n_buckets = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity.next_power_of_two()
        };

        Self {
            slots: new_slots(n_buckets),
            buckets_used: 0,
            max_psl: psl_bound(n_buckets),
            hash_builder,
        }
    }

    /// Returns the number of entries stored in the table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buckets_used
    }

    /// Returns `true` if the table holds no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buckets_used == 0
    }

    /// Returns the number of allocated slots. Always a power of two.
    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current probe-sequence-length bound.
    ///
    /// Every recorded PSL in the table is strictly below this value; a probe
    /// that would reach it triggers growth instead.
    #[inline(always)]
    pub fn max_psl(&self) -> u32 {
        self.max_psl
    }

    /// Returns a reference to the table's hash builder.
    #[inline(always)]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(bucket) => Some((&bucket.key, &bucket.value)),
            Slot::Empty => None,
        })
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    S: BuildHasher + Default,
{
    /// Creates an empty table with the default capacity and a default hash
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let table: HashTable<u64, &str> = HashTable::new();
    /// assert_eq!(table.bucket_count(), 32);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty table with room for at least `capacity` buckets and a
    /// default hash builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let table: HashTable<u64, &str> = HashTable::with_capacity(100);
    /// assert_eq!(table.bucket_count(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashTable<K, V, S>
where
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair.
    ///
    /// If an equal key is already present the table is left untouched and
    /// the rejected pair is returned in [`DuplicateKey`]; this table has no
    /// upsert. A successful insert may grow the table (doubling the bucket
    /// count and rehashing every entry) either up front, when every bucket
    /// is in use, or after a probe exhausts its bound.
    ///
    /// # Panics
    ///
    /// Panics if the probe exhausts its bound again immediately after a
    /// growth. Probing never wraps, so colliding keys that hash to the very
    /// end of the array can run out of forward room no matter how large the
    /// table gets; outside that corner, a second failure indicates broken
    /// internal accounting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// assert!(table.insert(7u64, "a").is_ok());
    ///
    /// let rejected = table.insert(7u64, "b").unwrap_err();
    /// assert_eq!((rejected.key, rejected.value), (7, "b"));
    /// assert_eq!(table.lookup(&7), Ok(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<(), DuplicateKey<K, V>> {
        if self.buckets_used >= self.slots.len() {
            self.grow();
        }

        match self.probe_insert(Bucket { psl: 0, key, value }) {
            ProbeOutcome::Placed => Ok(()),
            ProbeOutcome::Duplicate(bucket) => Err(DuplicateKey {
                key: bucket.key,
                value: bucket.value,
            }),
            ProbeOutcome::Full(bucket) => {
                self.grow();
                match self.probe_insert(bucket) {
                    ProbeOutcome::Placed => Ok(()),
                    ProbeOutcome::Duplicate(bucket) => Err(DuplicateKey {
                        key: bucket.key,
                        value: bucket.value,
                    }),
                    ProbeOutcome::Full(_) => {
                        panic!("probe exhausted its bound immediately after growth")
                    }
                }
            }
        }
    }

    /// Looks up a key, returning a reference to its value.
    ///
    /// The probe walks forward from the key's ideal slot for at most
    /// `max_psl` steps, stopping early at the array end (no wraparound). The
    /// failure variants distinguish hitting an empty slot, tripping the
    /// historical PSL-versus-index comparison, and exhausting the bound; see
    /// [`LookupError`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    /// use rh_hash::LookupError;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.insert(1u64, "one").unwrap();
    ///
    /// assert_eq!(table.lookup(&1), Ok(&"one"));
    /// assert_eq!(table.lookup(&9), Err(LookupError::NotFound));
    /// ```
    pub fn lookup(&self, key: &K) -> Result<&V, LookupError> {
        let position = self.probe_slot(key)?;
        match &self.slots[position] {
            Slot::Occupied(resident) => Ok(&resident.value),
            // probe_slot only yields positions it saw occupied
            Slot::Empty => unreachable!("lookup landed on an empty slot"),
        }
    }

    /// Looks up a key, returning a mutable reference to its value.
    ///
    /// Same probe as [`lookup`](Self::lookup).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, i32> = HashTable::new();
    /// table.insert(1u64, 10).unwrap();
    ///
    /// *table.lookup_mut(&1).unwrap() += 5;
    /// assert_eq!(table.lookup(&1), Ok(&15));
    /// ```
    pub fn lookup_mut(&mut self, key: &K) -> Result<&mut V, LookupError> {
        let position = self.probe_slot(key)?;
        match &mut self.slots[position] {
            Slot::Occupied(resident) => Ok(&mut resident.value),
            // probe_slot only yields positions it saw occupied
            Slot::Empty => unreachable!("lookup landed on an empty slot"),
        }
    }

    /// Looks up a key using the displacement-based early exit instead of the
    /// historical index comparison.
    ///
    /// [`lookup`](Self::lookup) preserves a comparison of each resident's
    /// recorded PSL against its absolute slot index, which never fires and so
    /// always scans to the probe bound on a miss. This variant applies the
    /// textbook Robin Hood cutoff instead: as soon as a resident's recorded
    /// PSL drops strictly below the probe's current displacement, the scan
    /// stops with [`LookupError::NotFound`].
    ///
    /// The cutoff trusts recorded PSLs to track true displacement, and
    /// insert's swap rule does not uphold that: a swap leaves the carried
    /// entry's PSL unchanged while its walk continues, so an entry evicted
    /// mid-chain can come to rest beyond a slot this scan reads as proof of
    /// absence. On such chains this method reports `NotFound` for a key
    /// [`lookup`](Self::lookup) finds. Treat it as a fast-miss scan for
    /// workloads that tolerate false misses after swap-heavy insertion, not
    /// as a drop-in replacement; [`lookup`](Self::lookup) never misses a
    /// present key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.insert(3u64, "three").unwrap();
    ///
    /// assert_eq!(table.lookup_by_displacement(&3), Ok(&"three"));
    /// assert!(table.lookup_by_displacement(&4).is_err());
    /// ```
    pub fn lookup_by_displacement(&self, key: &K) -> Result<&V, LookupError> {
        let n_buckets = self.slots.len();
        let ideal = self.ideal_index(self.hash_builder.hash_one(key));
        let end = n_buckets.min(ideal + self.max_psl as usize);

        for position in ideal..end {
            match &self.slots[position] {
                Slot::Empty => return Err(LookupError::NotFound),
                Slot::Occupied(resident) => {
                    if resident.key == *key {
                        return Ok(&resident.value);
                    }
                    if (resident.psl as usize) < position - ideal {
                        return Err(LookupError::NotFound);
                    }
                }
            }
        }

        Err(LookupError::ExceededBounds)
    }

    /// Walks the faithful probe for `key` and returns the matching slot
    /// position.
    ///
    /// The early-exit branch compares the resident's recorded PSL against
    /// the absolute position, before the equality check, exactly as the
    /// retrieval this reproduces did.
    fn probe_slot(&self, key: &K) -> Result<usize, LookupError> {
        let n_buckets = self.slots.len();
        let ideal = self.ideal_index(self.hash_builder.hash_one(key));
        let end = n_buckets.min(ideal + self.max_psl as usize);

        for position in ideal..end {
            match &self.slots[position] {
                Slot::Empty => return Err(LookupError::NotFound),
                Slot::Occupied(resident) => {
                    if resident.psl as usize > position {
                        return Err(LookupError::FoundHigherPsl);
                    }
                    if resident.key == *key {
                        return Ok(position);
                    }
                }
            }
        }

        Err(LookupError::ExceededBounds)
    }

    /// Carries `carried` forward from its ideal slot until it is placed, an
    /// equal key is found, or the probe bound is exhausted.
    ///
    /// The carried PSL is reset to 0 on entry; it only advances in the
    /// move-on branch, so an entry placed right after evicting a resident
    /// keeps the PSL it was swapped in with.
    fn probe_insert(&mut self, mut carried: Bucket<K, V>) -> ProbeOutcome<K, V> {
        carried.psl = 0;
        let n_buckets = self.slots.len();
        let mut position = self.ideal_index(self.hash_builder.hash_one(&carried.key));

        while carried.psl < self.max_psl && position < n_buckets {
            match &mut self.slots[position] {
                Slot::Occupied(resident) => {
                    if resident.key == carried.key {
                        return ProbeOutcome::Duplicate(carried);
                    }
                    if resident.psl < carried.psl {
                        // Steal from the rich: the richer resident finishes
                        // the walk in the carried entry's place.
                        mem::swap(resident, &mut carried);
                    } else {
                        carried.psl += 1;
                    }
                }
                slot @ Slot::Empty => {
                    *slot = Slot::Occupied(carried);
                    self.buckets_used += 1;
                    return ProbeOutcome::Placed;
                }
            }
            position += 1;
        }

        ProbeOutcome::Full(carried)
    }

    /// Doubles the table and rehashes every entry.
    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let n_buckets = self.slots.len();
        let target = if n_buckets.is_power_of_two() {
            n_buckets * 2
        } else {
            n_buckets.next_power_of_two()
        };
        self.rehash_into(target);
    }

    /// Replaces the slot array with `n_buckets` empty slots and reinserts
    /// every occupied entry with its PSL reset to 0.
    ///
    /// Migration runs the normal probe, so a severely skewed hash builder
    /// can demand another doubling mid-rehash; the remaining entries then
    /// migrate into the re-doubled array.
    fn rehash_into(&mut self, n_buckets: usize) {
        let old = mem::replace(&mut self.slots, new_slots(n_buckets));
        self.max_psl = psl_bound(n_buckets);
        self.buckets_used = 0;

        for slot in old.into_vec() {
            let Slot::Occupied(bucket) = slot else {
                continue;
            };

            let mut carried = bucket;
            loop {
                match self.probe_insert(carried) {
                    ProbeOutcome::Placed => break,
                    ProbeOutcome::Full(displaced) => {
                        carried = displaced;
                        self.grow();
                    }
                    ProbeOutcome::Duplicate(_) => {
                        unreachable!("equal keys encountered while rehashing")
                    }
                }
            }
        }
    }

    #[inline(always)]
    fn ideal_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.slots.len() - 1)
    }
}

#[cfg(any(feature = "stats", test))]
impl<K, V, S> HashTable<K, V, S> {
    /// Returns occupancy statistics for the current table state.
    ///
    /// `table_bytes` is computed from the slot layout, so benchmark code can
    /// account for memory deterministically without hooking the allocator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rh_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.insert(1u64, "one").unwrap();
    ///
    /// let stats = table.stats();
    /// assert_eq!(stats.populated, 1);
    /// assert_eq!(stats.bucket_count, 32);
    /// ```
    pub fn stats(&self) -> TableStats {
        let bucket_count = self.slots.len();
        TableStats {
            populated: self.buckets_used,
            bucket_count,
            max_psl: self.max_psl,
            load_factor: if bucket_count == 0 {
                0.0
            } else {
                self.buckets_used as f64 / bucket_count as f64
            },
            table_bytes: mem::size_of::<Slot<K, V>>() * bucket_count,
        }
    }

    /// Computes a histogram of recorded probe-sequence lengths.
    ///
    /// Returns a vector of length `max_psl` where index `p` counts the
    /// occupied slots whose recorded PSL is `p`. Placement keeps every
    /// recorded PSL strictly below `max_psl`, so every entry lands in a bin.
    pub fn psl_histogram(&self) -> alloc::vec::Vec<usize> {
        let mut hist = alloc::vec![0usize; self.max_psl as usize];

        for slot in self.slots.iter() {
            if let Slot::Occupied(bucket) = slot {
                hist[bucket.psl as usize] += 1;
            }
        }

        hist
    }

    /// Pretty-prints the PSL histogram horizontally using stdout.
    ///
    /// Each row is a PSL bin rendered as a proportional bar chart.
    #[cfg(feature = "std")]
    pub fn print_psl_histogram(&self) {
        let hist = self.psl_histogram();
        let max = hist.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("psl histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("psl histogram ({} entries):", self.buckets_used);

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = (count * total_units).div_ceil(max);
            let full = units / 8;
            let rem = units % 8;
            let mut bar = "█".repeat(full);
            if rem > 0 {
                let ch = match rem {
                    1 => '▏',
                    2 => '▎',
                    3 => '▍',
                    4 => '▌',
                    5 => '▋',
                    6 => '▊',
                    7 => '▉',
                    _ => unreachable!(),
                };
                bar.push(ch);
            }
            bar
        };

        for (psl, &count) in hist.iter().enumerate() {
            println!("{:>2} | {} ({})", psl, make_bar(count), count);
        }
    }
}
