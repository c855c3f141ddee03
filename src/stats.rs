use std::{alloc::Layout, collections::HashMap};

use crate::BlockLayout;

/// Block accounting, for diagnosing leaks and the like.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats
{
    /// Blocks allocated by `Shared::with` and friends.
    pub allocated: u64,

    /// Blocks whose last strong and weak reference are gone.
    pub freed: u64,

    /// Payloads dropped because their strong count reached zero.
    pub payloads_released: u64,

    /// Blocks with at least one strong reference, by layout.
    pub live_by_layout: HashMap<BlockLayout, usize>,

    /// Blocks kept around only by `Weak` observers, by layout.
    pub expired_by_layout: HashMap<BlockLayout, usize>,
}

#[allow(dead_code)]
impl Stats
{
    fn sum_sizes(map: &HashMap<BlockLayout, usize>) -> usize
    {
        let mut res = 0;
        for (layout, amount) in map {
            res += Layout::from(*layout).size() * amount;
        }
        res
    }

    /// Number of blocks whose payload is still reachable.
    pub fn live_blocks(&self) -> usize { self.live_by_layout.values().sum() }

    /// Memory size of blocks whose payload is still reachable.
    pub fn live_heap_size(&self) -> usize { Self::sum_sizes(&self.live_by_layout) }

    /// Number of emptied blocks waiting on their last `Weak`.
    pub fn expired_blocks(&self) -> usize { self.expired_by_layout.values().sum() }

    /// Memory size of emptied blocks waiting on their last `Weak`.
    pub fn expired_heap_size(&self) -> usize { Self::sum_sizes(&self.expired_by_layout) }

    /// Blocks not yet freed, live or expired.
    pub fn outstanding_blocks(&self) -> usize { self.live_blocks() + self.expired_blocks() }

    pub(crate) fn merge(&mut self, other: &Stats)
    {
        self.allocated += other.allocated;
        self.freed += other.freed;
        self.payloads_released += other.payloads_released;
        for (layout, n) in &other.live_by_layout {
            *self.live_by_layout.entry(*layout).or_default() += n;
        }
        for (layout, n) in &other.expired_by_layout {
            *self.expired_by_layout.entry(*layout).or_default() += n;
        }
    }
}
