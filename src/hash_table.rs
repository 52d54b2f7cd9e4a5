use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;

/// Bucket counts the table moves through as it grows and shrinks.
///
/// Every [`HashTable`] starts at the first entry. Crossing the 90% load mark
/// after an insert advances one step; dropping under 1% load after a removal
/// retreats one step. The last entry is terminal: a table that reaches it
/// keeps filling in place.
pub static PRIME_CAPACITIES: [usize; 16] = [
    67, 137, 277, 557, 1117, 2237, 4481, 8963, 17929, 35863, 71741, 143483, 286973, 573953,
    1147921, 2295859,
];

#[inline(always)]
fn overloaded(populated: usize, capacity: usize) -> bool {
    10 * populated >= 9 * capacity
}

#[inline(always)]
fn underloaded(populated: usize, capacity: usize, cap_index: usize) -> bool {
    cap_index > 0 && 100 * populated < capacity
}

#[derive(Clone)]
struct Slot<V> {
    hash: u64,
    value: V,
}

/// One physical position in the table.
///
/// `distance` is the number of steps from the slot's ideal index to this
/// bucket. It is meaningless while `slot` is `None`.
#[derive(Clone)]
struct Bucket<V> {
    slot: Option<Slot<V>>,
    distance: usize,
}

impl<V> Bucket<V> {
    #[inline(always)]
    const fn empty() -> Self {
        Bucket {
            slot: None,
            distance: 0,
        }
    }

    #[inline(always)]
    fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    #[inline(always)]
    fn occupied(&self) -> Option<&V> {
        self.slot.as_ref().map(|slot| &slot.value)
    }

    #[inline(always)]
    fn occupied_mut(&mut self) -> Option<&mut V> {
        self.slot.as_mut().map(|slot| &mut slot.value)
    }
}

fn empty_buckets<V>(capacity: usize) -> Vec<Bucket<V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, Bucket::empty);
    buckets
}

/// Debug statistics for hash table analysis.
///
/// Test-only unless the `stats` feature is enabled.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Total number of buckets allocated
    pub capacity: usize,
    /// Position of `capacity` in [`PRIME_CAPACITIES`]
    pub cap_index: usize,
    /// Largest stored probe distance
    pub max_distance: usize,
    /// Mean stored probe distance over occupied buckets
    pub mean_distance: f64,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Total memory in bytes used by the bucket array
    pub total_bytes: usize,
    /// Bytes held by empty buckets
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Schedule position: {}", self.cap_index);
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_distance, self.mean_distance
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// An open-addressing hash table using Robin Hood hashing with backward-shift
/// deletion.
///
/// `HashTable<V>` stores values of type `V` in a single contiguous bucket
/// array whose length is drawn from [`PRIME_CAPACITIES`]. Like the raw tables
/// in other crates, it does not hash anything itself: every operation takes
/// the value's hash and an equality predicate. The hash is cached next to the
/// value so that rebalancing never calls back into user code.
///
/// ## Performance Characteristics
///
/// - **Memory**: one `u64` hash and one `usize` probe distance per bucket,
///   plus the size of `V`.
/// - **Load factor**: grows once 90% of the buckets are full and shrinks once
///   fewer than 1% are.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use robin_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// // Insert a person
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     robin_hash::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     robin_hash::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    buckets: Vec<Bucket<V>>,
    populated: usize,
    cap_index: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        f.debug_struct("HashTable")
            .field(
                "distances",
                &self
                    .buckets
                    .chunks(16)
                    .map(|row| {
                        row.iter()
                            .map(|bucket| {
                                if bucket.is_occupied() {
                                    format!("{:02}", bucket.distance)
                                } else {
                                    "..".to_string()
                                }
                            })
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.buckets.len())
            .field("cap_index", &self.cap_index)
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table at the smallest scheduled capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// # use robin_hash::hash_table::PRIME_CAPACITIES;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
    /// ```
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(PRIME_CAPACITIES[0]),
            populated: 0,
            cap_index: 0,
        }
    }

    #[inline(always)]
    fn ideal_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline(always)]
    fn next_index(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.buckets.len() { 0 } else { next }
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are yielded in physical bucket order, which is neither
    /// insertion order nor hash order. Every call starts a fresh traversal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table
    ///     .entry(hash_str("key1"), |s: &String| s == "key1")
    ///     .or_insert("key1".to_string());
    /// table
    ///     .entry(hash_str("key2"), |s: &String| s == "key2")
    ///     .or_insert("key2".to_string());
    ///
    /// assert_eq!(table.iter().count(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            remaining: self.populated,
            exact: true,
        }
    }

    /// Returns an iterator over mutable references to all values in the
    /// table, in the same order as [`iter`](Self::iter).
    ///
    /// Callers must not change the parts of a value that its hash or equality
    /// predicate depend on.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            remaining: self.populated,
            exact: true,
        }
    }

    /// Returns an iterator positioned at the value matching `hash` and `eq`.
    ///
    /// The first item is the matching value; the traversal then continues in
    /// physical order to the end of the bucket array. If nothing matches, the
    /// returned iterator is already exhausted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(7, |&n: &u64| n == 7).or_insert(7);
    ///
    /// assert_eq!(table.iter_at(7, |&n| n == 7).next(), Some(&7));
    /// assert_eq!(table.iter_at(8, |&n| n == 8).next(), None);
    /// ```
    pub fn iter_at(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Iter<'_, V> {
        let start = self.find_index(hash, eq).unwrap_or(self.buckets.len());
        Iter {
            buckets: self.buckets[start..].iter(),
            remaining: self.populated,
            exact: false,
        }
    }

    /// Mutable form of [`iter_at`](Self::iter_at).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(7, |&(k, _): &(u64, u64)| k == 7).or_insert((7, 0));
    ///
    /// if let Some((_, v)) = table.iter_at_mut(7, |&(k, _)| k == 7).next() {
    ///     *v = 70;
    /// }
    /// assert_eq!(table.find(7, |&(k, _)| k == 7), Some(&(7, 70)));
    /// ```
    pub fn iter_at_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> IterMut<'_, V> {
        let start = self.find_index(hash, eq).unwrap_or(self.buckets.len());
        IterMut {
            buckets: self.buckets[start..].iter_mut(),
            remaining: self.populated,
            exact: false,
        }
    }

    /// Returns an iterator that removes and yields all values from the table.
    ///
    /// The table is reset to the smallest scheduled capacity as soon as this
    /// is called; values the iterator does not yield are dropped with it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table
    ///     .entry(hash_str("key1"), |s: &String| s == "key1")
    ///     .or_insert("key1".to_string());
    ///
    /// let values: Vec<String> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values.len(), 1);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        let remaining = self.populated;
        let buckets = mem::replace(&mut self.buckets, empty_buckets(PRIME_CAPACITIES[0]));
        self.populated = 0;
        self.cap_index = 0;

        Drain {
            inner: buckets.into_iter(),
            remaining,
            _table: PhantomData,
        }
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of elements in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of buckets currently allocated.
    ///
    /// This is always one of [`PRIME_CAPACITIES`]. The table holds at most 90%
    /// of this many values before it grows.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Removes all elements from the table and returns it to the smallest
    /// scheduled capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// # use robin_hash::hash_table::PRIME_CAPACITIES;
    /// #
    /// let mut table = HashTable::new();
    /// for i in 0..100u64 {
    ///     table.entry(i, |&n| n == i).or_insert(i);
    /// }
    /// assert!(table.capacity() > PRIME_CAPACITIES[0]);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
    /// ```
    pub fn clear(&mut self) {
        self.buckets = empty_buckets(PRIME_CAPACITIES[0]);
        self.populated = 0;
        self.cap_index = 0;
    }

    /// Removes and returns a value from the table.
    ///
    /// The value is identified by its hash and an equality predicate. The gap
    /// it leaves is closed by shifting the rest of its probe cluster back one
    /// bucket, and the table shrinks if it falls under 1% load.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// let removed = table.remove(hash_u64(42), |&n| n == 42);
    /// assert_eq!(removed, Some(42));
    /// assert!(table.is_empty());
    ///
    /// // Removing non-existent value returns None
    /// let not_found = table.remove(hash_u64(99), |&n| n == 99);
    /// assert_eq!(not_found, None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_at(index))
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("hello");
    ///
    /// match table.entry(hash, |s: &String| s == "hello") {
    ///     robin_hash::hash_table::Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     robin_hash::hash_table::Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert!(matches!(
    ///     table.entry(hash, |s: &String| s == "hello"),
    ///     robin_hash::hash_table::Entry::Occupied(_)
    /// ));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.find_index(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Walks the probe sequence for `hash`.
    ///
    /// Stops early at an empty bucket or at a bucket whose occupant sits
    /// closer to its own ideal index than we are to ours: insertion would
    /// have displaced that occupant, so the value cannot lie further on.
    fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        let mut index = self.ideal_index(hash);
        let mut distance = 0;
        while distance < self.buckets.len() {
            let bucket = &self.buckets[index];
            let slot = bucket.slot.as_ref()?;
            if bucket.distance < distance {
                return None;
            }
            if slot.hash == hash && eq(&slot.value) {
                return Some(index);
            }

            index = self.next_index(index);
            distance += 1;
        }

        None
    }

    /// Places `value` with Robin Hood displacement and returns the index it
    /// landed in.
    ///
    /// The caller must ensure that at least one bucket is empty. Values
    /// displaced along the way are carried forward by the loop until one of
    /// them reaches an empty bucket. If `follow` names a bucket whose occupant
    /// gets displaced, it is updated to wherever that occupant ends up.
    fn place(&mut self, hash: u64, value: V, follow: &mut Option<usize>) -> usize {
        debug_assert!(self.populated < self.buckets.len());

        let mut carried = Slot { hash, value };
        let mut index = self.ideal_index(hash);
        let mut distance = 0;
        let mut landed = None;
        let mut carrying_followed = false;

        loop {
            let bucket = &mut self.buckets[index];
            match bucket.slot.as_mut() {
                None => {
                    bucket.slot = Some(carried);
                    bucket.distance = distance;
                    if carrying_followed {
                        *follow = Some(index);
                    }
                    return landed.unwrap_or(index);
                }
                Some(occupant) => {
                    if bucket.distance < distance {
                        mem::swap(occupant, &mut carried);
                        mem::swap(&mut bucket.distance, &mut distance);
                        landed = landed.or(Some(index));

                        let evicted_followed = *follow == Some(index);
                        if carrying_followed {
                            *follow = Some(index);
                        }
                        carrying_followed = evicted_followed;
                    }
                }
            }

            index = self.next_index(index);
            distance += 1;
        }
    }

    fn remove_at(&mut self, index: usize) -> V {
        let Some(Slot { value, .. }) = self.buckets[index].slot.take() else {
            unreachable!("bucket {index} was located as occupied");
        };
        self.buckets[index].distance = 0;

        let mut hole = index;
        let mut next = self.next_index(index);
        loop {
            let bucket = &mut self.buckets[next];
            if !bucket.is_occupied() || bucket.distance == 0 {
                break;
            }

            let moved = bucket.slot.take();
            let distance = mem::take(&mut bucket.distance) - 1;
            let target = &mut self.buckets[hole];
            target.slot = moved;
            target.distance = distance;

            hole = next;
            next = self.next_index(next);
        }

        self.populated -= 1;
        if underloaded(self.populated, self.buckets.len(), self.cap_index) {
            self.rehash(self.cap_index - 1, None);
        }

        value
    }

    /// Rebuilds the bucket array at `PRIME_CAPACITIES[cap_index]`.
    ///
    /// Live values are reinserted in their current physical order. If
    /// `tracked` names an occupied bucket, the index that value ends up at in
    /// the new array is returned.
    #[cold]
    #[inline(never)]
    fn rehash(&mut self, cap_index: usize, tracked: Option<usize>) -> Option<usize> {
        let old = mem::replace(
            &mut self.buckets,
            empty_buckets(PRIME_CAPACITIES[cap_index]),
        );
        self.cap_index = cap_index;

        let mut follow = None;
        for (index, bucket) in old.into_iter().enumerate() {
            let Some(slot) = bucket.slot else {
                continue;
            };
            let landed = self.place(slot.hash, slot.value, &mut follow);
            if tracked == Some(index) {
                follow = Some(landed);
            }
        }

        follow
    }

    fn value_at(&self, index: usize) -> &V {
        match self.buckets[index].occupied() {
            Some(value) => value,
            None => unreachable!("bucket {index} was located as occupied"),
        }
    }

    fn value_at_mut(&mut self, index: usize) -> &mut V {
        match self.buckets[index].occupied_mut() {
            Some(value) => value,
            None => unreachable!("bucket {index} was located as occupied"),
        }
    }

    /// Finds a value in the table by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value_at(index))
    }

    /// Finds a value in the table by hash and equality predicate, returning a
    /// mutable reference.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(42, |&(k, _): &(u64, u64)| k == 42).or_insert((42, 0));
    ///
    /// if let Some((_, v)) = table.find_mut(42, |&(k, _)| k == 42) {
    ///     *v = 100;
    /// }
    /// assert_eq!(table.find(42, |&(k, _)| k == 42), Some(&(42, 100)));
    /// ```
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value_at_mut(index))
    }

    /// Computes a histogram of stored probe distances.
    ///
    /// Test-only unless the `stats` feature is enabled. Index `d` of the
    /// returned vector counts the values sitting `d` buckets past their ideal
    /// index; the vector is as long as the largest distance plus one.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for bucket in self.buckets.iter().filter(|b| b.is_occupied()) {
            if bucket.distance >= hist.len() {
                hist.resize(bucket.distance + 1, 0);
            }
            hist[bucket.distance] += 1;
        }

        hist
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Test-only unless the `stats` feature is enabled.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.buckets.len();
        let (max_distance, total_distance) = self
            .buckets
            .iter()
            .filter(|b| b.is_occupied())
            .fold((0, 0), |(max, total), b| {
                (max.max(b.distance), total + b.distance)
            });
        let bucket_bytes = mem::size_of::<Bucket<V>>();

        DebugStats {
            populated: self.populated,
            capacity,
            cap_index: self.cap_index,
            max_distance,
            mean_distance: if self.populated == 0 {
                0.0
            } else {
                total_distance as f64 / self.populated as f64
            },
            load_factor: self.populated as f64 / capacity as f64,
            total_bytes: capacity * bucket_bytes,
            wasted_bytes: (capacity - self.populated) * bucket_bytes,
        }
    }

    /// Pretty-prints the probe-distance histogram horizontally using stdout.
    #[cfg(all(feature = "std", any(test, feature = "stats")))]
    pub fn print_probe_histogram(&self) {
        let hist = self.probe_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("probe histogram ({} entries):", self.populated);
        for (distance, &count) in hist.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", distance, "█".repeat(width), count);
        }
    }

    /// Asserts the Robin Hood layout invariants over every bucket.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let capacity = self.buckets.len();
        assert_eq!(capacity, PRIME_CAPACITIES[self.cap_index]);
        assert_eq!(
            self.buckets.iter().filter(|b| b.is_occupied()).count(),
            self.populated
        );
        if self.cap_index + 1 < PRIME_CAPACITIES.len() {
            assert!(!overloaded(self.populated, capacity), "{self:?}");
        }

        for (index, bucket) in self.buckets.iter().enumerate() {
            let Some(slot) = bucket.slot.as_ref() else {
                continue;
            };
            let ideal = self.ideal_index(slot.hash);
            assert_eq!(
                bucket.distance,
                (index + capacity - ideal) % capacity,
                "bucket {index} has a stale distance: {self:?}"
            );

            // The predecessor may only be poorer by at most one step.
            let prev = &self.buckets[(index + capacity - 1) % capacity];
            if bucket.distance > 0 {
                assert!(prev.is_occupied(), "gap before bucket {index}: {self:?}");
                assert!(
                    prev.distance + 1 >= bucket.distance,
                    "bucket {index} breaks Robin Hood ordering: {self:?}"
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn cap_index(&self) -> usize {
        self.cap_index
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - the value is not present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - the value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    ///
    /// An occupied entry keeps its existing value; `default` is dropped.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value and returns the entry.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when the
/// requested value is not present.
///
/// [`entry`]: HashTable::entry
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts a value into the vacant entry and returns a mutable reference to
    /// it.
    ///
    /// If the insert pushes the table to 90% load, the table grows to the next
    /// scheduled capacity before this returns; the reference points at the
    /// value's final bucket.
    ///
    /// # Panics
    ///
    /// Panics if the table is at the last scheduled capacity and every bucket
    /// is occupied.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        assert!(
            table.populated < table.buckets.len(),
            "hash table capacity exhausted"
        );

        let mut index = table.place(self.hash, value, &mut None);
        table.populated += 1;

        let next_index = table.cap_index + 1;
        if overloaded(table.populated, table.buckets.len()) && next_index < PRIME_CAPACITIES.len()
        {
            if let Some(moved) = table.rehash(next_index, Some(index)) {
                index = moved;
            }
        }

        table.value_at_mut(index)
    }
}

/// A view into an occupied entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when the
/// requested value is present.
///
/// [`entry`]: HashTable::entry
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.table.value_at(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_at_mut(self.index)
    }

    /// Converts the entry into a mutable reference to its value with the
    /// table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        self.table.value_at_mut(self.index)
    }

    /// Removes the value from the table and returns it.
    ///
    /// This may shrink the table.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter`] and [`iter_at`] methods on
/// [`HashTable`]. It yields `&V` references in physical bucket order.
///
/// [`iter`]: HashTable::iter
/// [`iter_at`]: HashTable::iter_at
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Bucket<V>>,
    remaining: usize,
    // Cursors from `iter_at` start mid-table and only know an upper bound.
    exact: bool,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            buckets: self.buckets.clone(),
            remaining: self.remaining,
            exact: self.exact,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.buckets.find_map(Bucket::occupied)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower = if self.exact { self.remaining } else { 0 };
        (lower, Some(self.remaining))
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

/// A mutable iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] and [`iter_at_mut`] methods on
/// [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
/// [`iter_at_mut`]: HashTable::iter_at_mut
pub struct IterMut<'a, V> {
    buckets: core::slice::IterMut<'a, Bucket<V>>,
    remaining: usize,
    exact: bool,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.buckets.find_map(Bucket::occupied_mut)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower = if self.exact { self.remaining } else { 0 };
        (lower, Some(self.remaining))
    }
}

impl<V> FusedIterator for IterMut<'_, V> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V> {
    inner: alloc::vec::IntoIter<Bucket<V>>,
    remaining: usize,
    _table: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.inner.find_map(|bucket| bucket.slot)?;
        self.remaining -= 1;
        Some(slot.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}
impl<V> FusedIterator for Drain<'_, V> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    inner: alloc::vec::IntoIter<Bucket<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.inner.find_map(|bucket| bucket.slot)?;
        self.remaining -= 1;
        Some(slot.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.buckets.into_iter(),
            remaining: self.populated,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn insert_item(table: &mut HashTable<Item>, hash: u64, key: u64, value: i32) {
        match table.entry(hash, |v| v.key == key) {
            Entry::Vacant(v) => {
                v.insert(Item { key, value });
            }
            Entry::Occupied(_) => panic!("unexpected occupied for {key}: {table:#?}"),
        }
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            insert_item(&mut table, hash, k, (k as i32) * 2);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                })
            );
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
        table.assert_invariants();
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        let k = 42u64;
        let hash = hash_key(&state, k);

        insert_item(&mut table, hash, k, 7);

        match table.entry(hash, |v| v.key == k) {
            Entry::Occupied(mut occ) => {
                assert_eq!(occ.get().value, 7);
                occ.get_mut().value = 11;
            }
            Entry::Vacant(_) => panic!("should be occupied second time"),
        }
        assert_eq!(table.find(hash, |v| v.key == k).map(|v| v.value), Some(11));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn or_insert_keeps_first_value() {
        let mut table: HashTable<(u64, &str)> = HashTable::new();
        table.entry(5, |&(k, _)| k == 5).or_insert((5, "first"));
        table.entry(5, |&(k, _)| k == 5).or_insert((5, "second"));
        assert_eq!(table.find(5, |&(k, _)| k == 5), Some(&(5, "first")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..16u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }

        for k in (0..16u64).step_by(2) {
            let removed = table.remove(hash_key(&state, k), |v| v.key == k);
            assert_eq!(
                removed,
                Some(Item {
                    key: k,
                    value: k as i32
                })
            );
            table.assert_invariants();
        }
        assert_eq!(table.len(), 8);

        for k in 0..16u64 {
            let found = table.find(hash_key(&state, k), |v| v.key == k);
            assert_eq!(found.is_some(), k % 2 == 1, "key {k}");
        }

        assert_eq!(table.remove(hash_key(&state, 0), |v| v.key == 0), None);
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn remove_from_empty_is_noop() {
        let mut table: HashTable<u64> = HashTable::new();
        assert_eq!(table.remove(3, |&v| v == 3), None);
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
    }

    #[test]
    fn explicit_collision() {
        // Every value shares one ideal index, forming a single probe chain.
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..20u64 {
            table.entry(0, |&x| x == v).or_insert(v);
        }
        table.assert_invariants();
        for v in 0..20u64 {
            assert_eq!(table.find(0, |&x| x == v), Some(&v));
        }
        assert_eq!(table.probe_histogram(), vec![1; 20]);

        // Removing from the middle shifts the tail back.
        assert_eq!(table.remove(0, |&x| x == 10), Some(10));
        table.assert_invariants();
        assert_eq!(table.find(0, |&x| x == 10), None);
        for v in (0..20u64).filter(|&v| v != 10) {
            assert_eq!(table.find(0, |&x| x == v), Some(&v));
        }
        assert_eq!(table.probe_histogram(), vec![1; 19]);
    }

    #[test]
    fn richer_occupant_is_displaced() {
        let capacity = PRIME_CAPACITIES[0] as u64;
        let mut table: HashTable<u64> = HashTable::new();

        // Three values for slot 0 occupy buckets 0, 1, 2.
        for v in 0..3u64 {
            table.entry(0, |&x| x == v).or_insert(v);
        }
        // A value whose ideal slot is 1 must be pushed past the slot 0 chain.
        let hash = 1 + capacity;
        table.entry(hash, |&x| x == 100).or_insert(100);
        table.assert_invariants();

        assert_eq!(table.buckets[3].occupied(), Some(&100));
        assert_eq!(table.buckets[3].distance, 2);

        // A fourth slot-0 value is poorer than the slot-1 value at bucket 3 and
        // steals it, pushing 100 to bucket 4.
        table.entry(0, |&x| x == 3).or_insert(3);
        table.assert_invariants();
        assert_eq!(table.buckets[3].occupied(), Some(&3));
        assert_eq!(table.buckets[4].occupied(), Some(&100));
        assert_eq!(table.buckets[4].distance, 3);
    }

    #[test]
    fn lookup_stops_at_richer_bucket() {
        let capacity = PRIME_CAPACITIES[0] as u64;
        let mut table: HashTable<u64> = HashTable::new();
        table.entry(5, |&x| x == 1).or_insert(1);
        table.entry(6, |&x| x == 2).or_insert(2);

        // Probing for slot 5 meets bucket 6 (distance 0) after one step.
        assert_eq!(table.find(5 + capacity, |&x| x == 2), None);
        assert_eq!(table.find(6, |&x| x == 2), Some(&2));
    }

    #[test]
    fn wraparound_probe_chain() {
        let last = PRIME_CAPACITIES[0] as u64 - 1;
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..4u64 {
            table.entry(last, |&x| x == v).or_insert(v);
        }
        table.assert_invariants();
        assert_eq!(table.buckets[0].distance, 1);
        assert_eq!(table.buckets[2].distance, 3);

        assert_eq!(table.remove(last, |&x| x == 0), Some(0));
        table.assert_invariants();
        assert_eq!(table.buckets[last as usize].occupied(), Some(&1));
        assert!(!table.buckets[2].is_occupied());
    }

    #[test]
    fn growth_at_ninety_percent() {
        let c0 = PRIME_CAPACITIES[0];
        // The first n with 10 * n >= 9 * c0.
        let threshold = (9 * c0).div_ceil(10);
        let mut table: HashTable<u64> = HashTable::new();

        for v in 0..(threshold - 1) as u64 {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        assert_eq!(table.capacity(), c0);

        let last = (threshold - 1) as u64;
        let value = table.entry(last, |&x| x == last).or_insert(last);
        assert_eq!(*value, last);
        assert_eq!(table.capacity(), PRIME_CAPACITIES[1]);
        assert_eq!(table.cap_index(), 1);
        assert_eq!(table.len(), threshold);
        table.assert_invariants();

        let mut seen: Vec<u64> = table.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..threshold as u64).collect::<Vec<_>>());
    }

    fn layout(table: &HashTable<(u64, u64)>) -> Vec<Option<((u64, u64), usize)>> {
        table
            .buckets
            .iter()
            .map(|b| b.occupied().map(|v| (*v, b.distance)))
            .collect()
    }

    // Sixty entries with identity hashes, one short of growing. In the first
    // capacity 137 sits at bucket 3; in the second it wants bucket 0.
    fn one_short_of_growth(keys: impl IntoIterator<Item = u64>) -> HashTable<(u64, u64)> {
        let mut table: HashTable<(u64, u64)> = HashTable::new();
        for k in keys {
            table.entry(k, |&(x, _)| x == k).or_insert((k, 0));
        }
        assert_eq!(table.len(), 60);
        assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
        table
    }

    #[test]
    fn growth_reinserts_in_physical_order() {
        let mut table = one_short_of_growth(core::iter::once(137).chain(2..61));

        let mut rebuilt = table.clone();
        rebuilt.place(0, (0, 0), &mut None);
        rebuilt.populated += 1;
        rebuilt.rehash(1, None);

        let value = table.entry(0, |&(x, _)| x == 0).or_insert((0, 0));
        assert_eq!(*value, (0, 0));
        value.1 = 7;
        assert_eq!(table.capacity(), PRIME_CAPACITIES[1]);
        table.assert_invariants();

        // 0 was at bucket 0 before 137, so it keeps bucket 0 and 137 settles
        // one step past its ideal index.
        let prefix: Vec<u64> = table.iter().take(3).map(|&(k, _)| k).collect();
        assert_eq!(prefix, vec![0, 137, 2]);
        assert_eq!(table.buckets[1].distance, 1);

        rebuilt.buckets[0].occupied_mut().unwrap().1 = 7;
        assert_eq!(layout(&table), layout(&rebuilt));
    }

    #[test]
    fn growth_follows_displaced_new_value() {
        let mut table = one_short_of_growth(core::iter::once(137).chain(2..60).chain([0]));

        // 1 is reinserted at bucket 1 and then pushed along by 137.
        let value = table.entry(1, |&(x, _)| x == 1).or_insert((1, 0));
        assert_eq!(value.0, 1);
        value.1 = 99;
        assert_eq!(table.capacity(), PRIME_CAPACITIES[1]);
        table.assert_invariants();

        let prefix: Vec<u64> = table.iter().take(4).map(|&(k, _)| k).collect();
        assert_eq!(prefix, vec![0, 137, 1, 2]);
        assert_eq!(table.find(1, |&(x, _)| x == 1), Some(&(1, 99)));
        for k in (2..60).chain([0, 137]) {
            assert_eq!(table.find(k, |&(x, _)| x == k), Some(&(k, 0)));
        }
    }

    #[test]
    fn iter_at_mut_starts_at_match() {
        let mut table: HashTable<(u64, u64)> = HashTable::new();
        for k in 0..20u64 {
            table.entry(k * 7, |&(x, _)| x == k).or_insert((k, 0));
        }
        let order: Vec<u64> = table.iter().map(|&(k, _)| k).collect();
        let at = order.iter().position(|&k| k == 5).unwrap();

        let mut cursor = table.iter_at_mut(35, |&(x, _)| x == 5);
        assert_eq!(cursor.size_hint(), (0, Some(20)));
        for (_, v) in &mut cursor {
            *v = 1;
        }
        assert!(cursor.next().is_none());

        let touched: Vec<u64> = table.iter().filter(|&&(_, v)| v == 1).map(|&(k, _)| k).collect();
        assert_eq!(touched, order[at..].to_vec());

        let mut missing = table.iter_at_mut(36, |&(x, _)| x == 99);
        assert!(missing.next().is_none());
        assert_eq!(table.iter_mut().size_hint(), (20, Some(20)));
    }

    #[test]
    fn reference_after_growth_points_at_value() {
        let mut table: HashTable<(u64, u64)> = HashTable::new();
        for k in 0..1000u64 {
            let value = table.entry(k * 31, |&(x, _)| x == k).or_insert((k, 0));
            assert_eq!(value.0, k);
            value.1 = k + 1;
        }
        for k in 0..1000u64 {
            assert_eq!(table.find(k * 31, |&(x, _)| x == k), Some(&(k, k + 1)));
        }
        table.assert_invariants();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many_then_remove_all() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..5000u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        assert_eq!(table.len(), 5000);
        assert!(table.capacity() > PRIME_CAPACITIES[3]);
        table.assert_invariants();

        for k in (0..5000u64).rev() {
            assert!(table.remove(hash_key(&state, k), |v| v.key == k).is_some());
        }
        assert!(table.is_empty());
        assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
        assert_eq!(table.cap_index(), 0);
        table.assert_invariants();
    }

    #[test]
    fn shrink_below_one_percent() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..200u64 {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        let grown = table.cap_index();
        assert!(grown >= 1);

        let mut v = 0;
        while table.cap_index() == grown {
            table.remove(v, |&x| x == v);
            v += 1;
        }
        assert_eq!(table.cap_index(), grown - 1);
        assert!(100 * table.len() < PRIME_CAPACITIES[grown]);
        table.assert_invariants();
        for rest in v..200 {
            assert_eq!(table.find(rest, |&x| x == rest), Some(&rest));
        }
    }

    #[test]
    fn iter_and_drain() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..100u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }

        let iter = table.iter();
        assert_eq!(iter.size_hint(), (100, Some(100)));
        let mut keys: Vec<u64> = iter.map(|v| v.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());

        for item in table.iter_mut() {
            item.value += 1;
        }
        assert!(table.iter().all(|v| v.value == v.key as i32 + 1));

        let drained = table.drain();
        assert_eq!(drained.len(), 100);
        let mut drained: Vec<Item> = drained.collect();
        drained.sort_by_key(|v| v.key);
        assert_eq!(drained.len(), 100);
        assert_eq!(drained[7].key, 7);

        assert!(table.is_empty());
        assert_eq!(table.capacity(), PRIME_CAPACITIES[0]);
        assert_eq!(table.iter().next(), None);
    }

    #[test]
    fn iter_follows_physical_order() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in [30u64, 2, 17, 9] {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        // Identity hashes below the capacity land in their own bucket.
        assert_eq!(table.iter().copied().collect::<Vec<_>>(), vec![2, 9, 17, 30]);
    }

    #[test]
    fn iter_at_continues_traversal() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in [30u64, 2, 17, 9] {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        assert_eq!(
            table.iter_at(9, |&x| x == 9).copied().collect::<Vec<_>>(),
            vec![9, 17, 30]
        );
        assert_eq!(table.iter_at(10, |&x| x == 10).next(), None);
        assert_eq!(table.iter_at(10, |&x| x == 10).size_hint().0, 0);
    }

    #[test]
    fn partially_consumed_drain_drops_rest() {
        let mut table: HashTable<String> = HashTable::new();
        for k in 0..10u64 {
            table.entry(k, |_| false).or_insert(k.to_string());
        }
        let mut drain = table.drain();
        assert!(drain.next().is_some());
        drop(drain);
        assert!(table.is_empty());
    }

    fn hash_string_key(state: &HashState, key: &str) -> u64 {
        let mut h = state.build_hasher();
        h.write(key.as_bytes());
        h.finish()
    }

    #[test]
    fn insert_and_remove_string_keys() {
        let state = HashState::default();
        let mut table: HashTable<(String, usize)> = HashTable::new();
        let keys: Vec<String> = (0..300).map(|i| alloc::format!("key_{i}")).collect();
        for (i, key) in keys.iter().enumerate() {
            table
                .entry(hash_string_key(&state, key), |(k, _)| k == key)
                .or_insert((key.clone(), i));
        }
        table.assert_invariants();

        for (i, key) in keys.iter().enumerate() {
            let found = table.find(hash_string_key(&state, key), |(k, _)| k == key);
            assert_eq!(found.map(|(_, v)| *v), Some(i));
        }

        for key in keys.iter().take(150) {
            let removed = table.remove(hash_string_key(&state, key), |(k, _)| k == key);
            assert_eq!(removed.map(|(k, _)| k), Some(key.clone()));
        }
        assert_eq!(table.len(), 150);
        table.assert_invariants();
    }

    #[test]
    fn occupied_entry_remove() {
        let mut table: HashTable<u64> = HashTable::new();
        table.entry(1, |&x| x == 1).or_insert(1);
        table.entry(1, |&x| x == 2).or_insert(2);

        match table.entry(1, |&x| x == 1) {
            Entry::Occupied(entry) => assert_eq!(entry.remove(), 1),
            Entry::Vacant(_) => unreachable!(),
        }
        table.assert_invariants();
        assert_eq!(table.find(1, |&x| x == 2), Some(&2));
    }

    #[test]
    fn entry_or_insert_with_and_modify() {
        let mut table: HashTable<(u64, u32)> = HashTable::new();
        table.entry(9, |&(k, _)| k == 9).or_insert_with(|| (9, 1));
        table
            .entry(9, |&(k, _)| k == 9)
            .and_modify(|(_, n)| *n += 1)
            .or_insert((9, 100));
        assert_eq!(table.find(9, |&(k, _)| k == 9), Some(&(9, 2)));
    }

    #[test]
    fn test_clone() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..100u64 {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        let mut cloned = table.clone();
        cloned.assert_invariants();
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            cloned.iter().collect::<Vec<_>>()
        );

        cloned.remove(5, |&x| x == 5);
        assert_eq!(table.find(5, |&x| x == 5), Some(&5));
        assert_eq!(cloned.find(5, |&x| x == 5), None);
    }

    #[test]
    fn into_iter_yields_everything() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..70u64 {
            table.entry(v, |&x| x == v).or_insert(v);
        }
        let into = table.into_iter();
        assert_eq!(into.len(), 70);
        assert_eq!(into.sum::<u64>(), (0..70).sum());
    }

    #[test]
    fn debug_stats_report_distances() {
        let mut table: HashTable<u64> = HashTable::new();
        for v in 0..4u64 {
            table.entry(0, |&x| x == v).or_insert(v);
        }
        let stats = table.debug_stats();
        assert_eq!(stats.populated, 4);
        assert_eq!(stats.capacity, PRIME_CAPACITIES[0]);
        assert_eq!(stats.max_distance, 3);
        assert!((stats.mean_distance - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..2000u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        table.print_probe_histogram();
        table.debug_stats().print();
    }
}
