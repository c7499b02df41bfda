//! Open addressing hash tables used to remember visited placements.
//!
//! Both tables store [`StateKey`](StateKey)s in a power of two sized array and resolve collisions
//! by linear probing. A slot containing `0` is empty, which is why a key is never `0`.
//!
//! Once a table is more than half full, it grows by the configured [`Growth`](Growth) factor and
//! every stored entry is inserted again. A failed allocation is reported as
//! [`SolverError::Allocation`](SolverError::Allocation) and leaves the table unchanged.

use log::trace;
use ricochet_board::StateKey;

use crate::{Growth, SolverError};

const EMPTY: u64 = 0;

/// Mixes the bits of `key` so that similar keys end up in different slots.
///
/// This is the finalizer of the splitmix64 generator.
#[inline(always)]
pub fn mix(key: u64) -> u64 {
    let mut z = key;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The storage shared by both tables, with `V` being the value stored next to each key.
#[derive(Debug, Clone)]
struct Table<V> {
    keys: Vec<u64>,
    values: Vec<V>,
    len: usize,
    mask: usize,
    growth: Growth,
    structure: &'static str,
}

/// The result of looking for a key.
enum Probe {
    Found(usize),
    Vacant(usize),
}

impl<V: Copy + Default> Table<V> {
    fn with_capacity(
        capacity: usize,
        growth: Growth,
        structure: &'static str,
    ) -> Result<Self, SolverError> {
        let capacity = capacity.max(2).next_power_of_two();
        let (keys, values) = allocate(capacity, structure)?;
        Ok(Self {
            keys,
            values,
            len: 0,
            mask: capacity - 1,
            growth,
            structure,
        })
    }

    #[inline(always)]
    fn probe(&self, key: u64) -> Probe {
        let mut index = mix(key) as usize & self.mask;
        loop {
            match self.keys[index] {
                EMPTY => return Probe::Vacant(index),
                stored if stored == key => return Probe::Found(index),
                _ => index = (index + 1) & self.mask,
            }
        }
    }

    /// Stores `key` with `value` in the empty slot at `index`.
    ///
    /// Grows the table if it is more than half full afterwards.
    fn insert_at(&mut self, index: usize, key: u64, value: V) -> Result<(), SolverError> {
        self.keys[index] = key;
        self.values[index] = value;
        self.len += 1;
        if self.len * 2 > self.mask {
            self.grow()?;
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<(), SolverError> {
        let capacity = (self.mask + 1) << self.growth.shift();
        let (keys, values) = allocate(capacity, self.structure)?;
        trace!(
            "growing {} from {} to {} slots with {} entries",
            self.structure,
            self.mask + 1,
            capacity,
            self.len
        );

        let old_keys = std::mem::replace(&mut self.keys, keys);
        let old_values = std::mem::replace(&mut self.values, values);
        self.mask = capacity - 1;
        for (key, value) in old_keys.into_iter().zip(old_values) {
            if key == EMPTY {
                continue;
            }
            if let Probe::Vacant(index) = self.probe(key) {
                self.keys[index] = key;
                self.values[index] = value;
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        for key in self.keys.iter_mut() {
            *key = EMPTY;
        }
        self.len = 0;
    }
}

/// Allocates `capacity` empty slots, reporting a failed allocation instead of aborting.
fn allocate<V: Copy + Default>(
    capacity: usize,
    structure: &'static str,
) -> Result<(Vec<u64>, Vec<V>), SolverError> {
    let error = |source| SolverError::Allocation {
        structure,
        requested: capacity,
        source,
    };
    let mut keys = Vec::new();
    keys.try_reserve_exact(capacity).map_err(error)?;
    keys.resize(capacity, EMPTY);
    let mut values = Vec::new();
    values.try_reserve_exact(capacity).map_err(error)?;
    values.resize(capacity, V::default());
    Ok((keys, values))
}

/// A set of visited placements.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    table: Table<()>,
}

impl VisitedSet {
    /// Creates an empty set with room for at least `capacity` slots.
    pub fn with_capacity(capacity: usize, growth: Growth) -> Result<Self, SolverError> {
        Ok(Self {
            table: Table::with_capacity(capacity, growth, "visited set")?,
        })
    }

    /// Adds `key` to the set.
    ///
    /// Returns `false` if the key has been added before.
    #[inline]
    pub fn add(&mut self, key: StateKey) -> Result<bool, SolverError> {
        match self.table.probe(key.get()) {
            Probe::Found(_) => Ok(false),
            Probe::Vacant(index) => {
                self.table.insert_at(index, key.get(), ())?;
                Ok(true)
            }
        }
    }

    /// Checks if `key` has been added.
    pub fn contains(&self, key: StateKey) -> bool {
        matches!(self.table.probe(key.get()), Probe::Found(_))
    }

    /// Returns the number of keys in the set.
    pub fn len(&self) -> usize {
        self.table.len
    }

    /// Checks if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.table.mask + 1
    }

    /// Removes all keys, keeping the allocated slots.
    pub fn clear(&mut self) {
        self.table.clear()
    }
}

/// A map from visited placements to the largest number of moves left when they were visited.
#[derive(Debug, Clone)]
pub struct BestDepthMap {
    table: Table<u8>,
}

impl BestDepthMap {
    /// Creates an empty map with room for at least `capacity` slots.
    pub fn with_capacity(capacity: usize, growth: Growth) -> Result<Self, SolverError> {
        Ok(Self {
            table: Table::with_capacity(capacity, growth, "transposition table")?,
        })
    }

    /// Records that `key` is visited with `depth` moves left.
    ///
    /// Returns `false` and changes nothing if `key` has already been visited with at least `depth`
    /// moves left. Otherwise the depth is stored and `true` is returned.
    #[inline]
    pub fn add(&mut self, key: StateKey, depth: u8) -> Result<bool, SolverError> {
        match self.table.probe(key.get()) {
            Probe::Found(index) if self.table.values[index] >= depth => Ok(false),
            Probe::Found(index) => {
                self.table.values[index] = depth;
                Ok(true)
            }
            Probe::Vacant(index) => {
                self.table.insert_at(index, key.get(), depth)?;
                Ok(true)
            }
        }
    }

    /// Returns the depth `key` has been visited with.
    pub fn get(&self, key: StateKey) -> Option<u8> {
        match self.table.probe(key.get()) {
            Probe::Found(index) => Some(self.table.values[index]),
            Probe::Vacant(_) => None,
        }
    }

    /// Returns the number of keys in the map.
    pub fn len(&self) -> usize {
        self.table.len
    }

    /// Checks if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.table.mask + 1
    }

    /// Removes all keys, keeping the allocated slots.
    pub fn clear(&mut self) {
        self.table.clear()
    }
}

#[cfg(test)]
mod tests {
    use fxhash::FxHashSet;
    use rand::Rng;
    use ricochet_board::{Placement, Position, Robot, StateKey};

    use super::{mix, BestDepthMap, VisitedSet};
    use crate::{Growth, SolverError};

    fn key(cells: &[u16]) -> StateKey {
        let positions = cells.iter().map(|&c| Position::new(c)).collect::<Vec<_>>();
        Placement::new(&positions)
            .unwrap()
            .canonical_key(Robot::Red)
    }

    fn random_keys(n: usize, seed: u128) -> Vec<StateKey> {
        let mut rng = rand_pcg::Pcg64Mcg::new(seed);
        (0..n)
            .map(|_| {
                let cells = (0..4).map(|_| rng.gen_range(0..256)).collect::<Vec<u16>>();
                key(&cells)
            })
            .collect()
    }

    #[test]
    fn mix_is_deterministic() {
        assert_eq!(mix(1), mix(1));
        assert_ne!(mix(1), mix(2));
        assert_eq!(mix(0), 0);
    }

    #[test]
    fn add_twice() {
        let mut set = VisitedSet::with_capacity(16, Growth::Quadruple).unwrap();
        let k = key(&[1, 2, 3]);
        assert!(!set.contains(k));
        assert!(set.add(k).unwrap());
        assert!(!set.add(k).unwrap());
        assert!(set.contains(k));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn capacity_is_power_of_two() {
        let set = VisitedSet::with_capacity(100, Growth::Double).unwrap();
        assert_eq!(set.capacity(), 128);
        let set = VisitedSet::with_capacity(1, Growth::Double).unwrap();
        assert_eq!(set.capacity(), 2);
    }

    #[test]
    fn growth_factor() {
        for &(growth, expected) in &[(Growth::Double, 32), (Growth::Quadruple, 64)] {
            let mut set = VisitedSet::with_capacity(16, growth).unwrap();
            for k in random_keys(200, 3).into_iter().take(8) {
                set.add(k).unwrap();
            }
            // 8 entries in 16 slots exceed half of the mask.
            assert_eq!(set.capacity(), expected);
        }
    }

    #[test]
    fn matches_reference_set() {
        for &growth in &[Growth::Double, Growth::Quadruple] {
            let mut set = VisitedSet::with_capacity(4, growth).unwrap();
            let mut reference = FxHashSet::default();
            let keys = random_keys(20_000, 42);

            for &k in &keys {
                assert_eq!(set.add(k).unwrap(), reference.insert(k));
            }
            assert_eq!(set.len(), reference.len());
            assert!(set.capacity() > 2 * set.len());

            // No key got lost while growing.
            assert!(keys.iter().all(|&k| set.contains(k)));
            let missing = random_keys(1000, 7)
                .into_iter()
                .filter(|k| !reference.contains(k))
                .collect::<Vec<_>>();
            assert!(missing.iter().all(|&k| !set.contains(k)));
        }
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut set = VisitedSet::with_capacity(4, Growth::Quadruple).unwrap();
        let keys = random_keys(100, 1);
        for &k in &keys {
            set.add(k).unwrap();
        }
        let capacity = set.capacity();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), capacity);
        assert!(keys.iter().all(|&k| !set.contains(k)));
    }

    #[test]
    fn best_depth() {
        let mut map = BestDepthMap::with_capacity(8, Growth::Quadruple).unwrap();
        let k = key(&[17, 4]);
        assert!(map.add(k, 3).unwrap());
        assert_eq!(map.get(k), Some(3));

        // Already visited with as many or more moves left.
        assert!(!map.add(k, 3).unwrap());
        assert!(!map.add(k, 2).unwrap());
        assert_eq!(map.get(k), Some(3));

        // More moves left are worth another visit.
        assert!(map.add(k, 5).unwrap());
        assert_eq!(map.get(k), Some(5));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn best_depth_survives_growth() {
        let mut map = BestDepthMap::with_capacity(2, Growth::Double).unwrap();
        let keys = random_keys(5000, 9);
        let mut reference = fxhash::FxHashMap::default();
        for (i, &k) in keys.iter().enumerate() {
            let depth = (i % 7) as u8;
            let stored = reference.entry(k).or_insert(depth);
            let improved = map.add(k, depth).unwrap();
            if improved && *stored < depth {
                *stored = depth;
            }
        }
        for (&k, &depth) in &reference {
            assert_eq!(map.get(k), Some(depth));
        }
        assert_eq!(map.len(), reference.len());
    }

    #[test]
    fn huge_capacity_is_an_error() {
        let capacity = usize::MAX >> 3;
        match VisitedSet::with_capacity(capacity, Growth::Quadruple) {
            Err(SolverError::Allocation {
                structure,
                requested,
                ..
            }) => {
                assert_eq!(structure, "visited set");
                assert_eq!(requested, capacity + 1);
            }
            other => panic!("expected an allocation error, got {:?}", other),
        }
        assert!(matches!(
            BestDepthMap::with_capacity(capacity, Growth::Double),
            Err(SolverError::Allocation { .. })
        ));
    }
}
