//! Bin packing of cut components into parts.
//!
//! Bins hold component sizes. `expand` maps the sizes back to concrete items
//! once the packing is final.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, trace};

type Counts = Vec<u32>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packing {
    opt_capacity: usize,
    approx_capacity: usize,
    bins: Vec<Vec<usize>>,
}

impl Packing {
    /// `opt_capacity` bounds perfect packing, `approx_capacity` bounds first fit.
    pub fn new(opt_capacity: usize, approx_capacity: usize) -> Self {
        Self {
            opt_capacity,
            approx_capacity,
            bins: Vec::new(),
        }
    }

    pub fn bins(&self) -> &[Vec<usize>] {
        &self.bins
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn opt_capacity(&self) -> usize {
        self.opt_capacity
    }

    pub fn approx_capacity(&self) -> usize {
        self.approx_capacity
    }

    /// Packs `count` items of each `size` into the fewest bins of `opt_capacity`.
    ///
    /// Returns the number of bins added, or None if an item can never fit.
    #[instrument(level = "debug", skip(self), fields(capacity = self.opt_capacity))]
    pub fn pack_perfect(&mut self, counts_by_size: &BTreeMap<usize, usize>) -> Option<usize> {
        let (sizes, counts): (Vec<usize>, Counts) = counts_by_size
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(&size, &count)| (size, count as u32))
            .unzip();
        if sizes.is_empty() {
            return Some(0);
        }
        if sizes.iter().any(|&s| s == 0 || s > self.opt_capacity) {
            debug!("item larger than capacity, sizes: {:?}", sizes);
            return None;
        }

        let configs = self.bin_configurations(&sizes, &counts);
        trace!("{} maximal bin configurations", configs.len());

        // BFS over remaining counts; each state remembers its predecessor.
        let zero: Counts = vec![0; counts.len()];
        let mut predecessor: HashMap<Counts, Counts> = HashMap::new();
        predecessor.insert(counts.clone(), counts.clone());
        let mut frontier = vec![counts.clone()];

        'search: while !frontier.is_empty() {
            let mut next_frontier = Vec::new();
            for remaining in &frontier {
                for config in &configs {
                    let next: Counts = remaining
                        .iter()
                        .zip(config)
                        .map(|(r, c)| r.saturating_sub(*c))
                        .collect();
                    if predecessor.contains_key(&next) {
                        continue;
                    }
                    predecessor.insert(next.clone(), remaining.clone());
                    if next == zero {
                        break 'search;
                    }
                    next_frontier.push(next);
                }
            }
            frontier = next_frontier;
        }

        if !predecessor.contains_key(&zero) {
            return None;
        }

        let mut added = 0;
        let mut current = zero;
        while current != counts {
            let previous = predecessor.get(&current)?.clone();
            let bin: Vec<usize> = previous
                .iter()
                .zip(&current)
                .zip(&sizes)
                .flat_map(|((p, c), &size)| std::iter::repeat(size).take((p - c) as usize))
                .collect();
            self.bins.push(bin);
            added += 1;
            current = previous;
        }
        debug!("perfect packing uses {} bins", added);
        Some(added)
    }

    /// All bin contents that fit `opt_capacity` and leave no room for another
    /// available item.
    fn bin_configurations(&self, sizes: &[usize], counts: &[u32]) -> Vec<Counts> {
        let mut partial: BTreeMap<Counts, usize> = BTreeMap::new();
        partial.insert(vec![0; sizes.len()], 0);

        for (idx, (&size, &count)) in sizes.iter().zip(counts).enumerate() {
            let mut extended = BTreeMap::new();
            for (config, fill) in &partial {
                for take in 0..=count {
                    let new_fill = fill + take as usize * size;
                    if new_fill > self.opt_capacity {
                        break;
                    }
                    let mut config = config.clone();
                    config[idx] += take;
                    extended.insert(config, new_fill);
                }
            }
            partial = extended;
        }

        partial
            .into_iter()
            .filter(|(config, fill)| {
                config
                    .iter()
                    .zip(counts)
                    .zip(sizes)
                    .all(|((&taken, &count), &size)| taken >= count || size > self.opt_capacity - fill)
            })
            .map(|(config, _)| config)
            .collect()
    }

    /// First fit in ascending size order into bins of `approx_capacity`.
    #[instrument(level = "debug", skip(self), fields(capacity = self.approx_capacity))]
    pub fn pack_first_fit(&mut self, counts_by_size: &BTreeMap<usize, usize>) {
        let mut remaining: Vec<usize> = self
            .bins
            .iter()
            .map(|bin| self.approx_capacity.saturating_sub(bin.iter().sum()))
            .collect();

        for (&size, &count) in counts_by_size {
            for _ in 0..count {
                match remaining.iter().position(|&free| size <= free) {
                    Some(idx) => {
                        self.bins[idx].push(size);
                        remaining[idx] -= size;
                    }
                    None => {
                        self.bins.push(vec![size]);
                        remaining.push(self.approx_capacity.saturating_sub(size));
                    }
                }
            }
        }
    }

    /// Replaces every packed size with an item taken from `mapping[size]`.
    ///
    /// Returns None if the mapping runs out of items for some size.
    pub fn expand<T: Clone>(&self, mapping: &BTreeMap<usize, Vec<T>>) -> Option<Vec<Vec<T>>> {
        let mut pools = mapping.clone();
        self.bins
            .iter()
            .map(|bin| {
                bin.iter()
                    .map(|size| pools.get_mut(size).and_then(Vec::pop))
                    .collect::<Option<Vec<T>>>()
            })
            .collect()
    }
}
