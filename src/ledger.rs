use std::{cell::RefCell, collections::HashMap};

use log::{debug, warn};

use crate::{BlockLayout, Stats};

struct LocalLedger
{
    stats: Stats,
}

thread_local! {
    static LEDGER: RefCell<LocalLedger> = RefCell::new(LocalLedger { stats: Stats::default() });
}

fn bump(map: &mut HashMap<BlockLayout, usize>, layout: BlockLayout) { *map.entry(layout).or_default() += 1; }

fn drop_one(map: &mut HashMap<BlockLayout, usize>, layout: BlockLayout)
{
    let remaining = match map.get_mut(&layout) {
        Some(n) => {
            *n -= 1;
            *n
        }
        None => {
            warn!("ledger has no outstanding block of {layout:?}");
            return;
        }
    };
    if remaining == 0 {
        map.remove(&layout);
    }
}

impl LocalLedger
{
    fn allocation(&mut self, layout: BlockLayout)
    {
        self.stats.allocated += 1;
        bump(&mut self.stats.live_by_layout, layout);
    }

    fn payload_release(&mut self, layout: BlockLayout)
    {
        self.stats.payloads_released += 1;
        drop_one(&mut self.stats.live_by_layout, layout);
        bump(&mut self.stats.expired_by_layout, layout);
    }

    fn free(&mut self, layout: BlockLayout)
    {
        self.stats.freed += 1;
        drop_one(&mut self.stats.expired_by_layout, layout);
    }
}

impl Drop for LocalLedger
{
    fn drop(&mut self)
    {
        let outstanding = self.stats.outstanding_blocks();
        if outstanding > 0 {
            warn!("thread exiting with {outstanding} outstanding blocks");
        }
        #[cfg(feature = "global")]
        {
            debug!(
                "folding thread ledger into global ledger ({} allocated, {} freed)",
                self.stats.allocated, self.stats.freed
            );
            global::fold(&self.stats);
        }
        #[cfg(not(feature = "global"))]
        debug!(
            "discarding thread ledger ({} allocated, {} freed)",
            self.stats.allocated, self.stats.freed
        );
    }
}

// Blocks dropped from other thread-local destructors may outlive the ledger;
// their accounting is lost rather than panicking.
fn with_ledger(f: impl FnOnce(&mut LocalLedger))
{
    let _ = LEDGER.try_with(|ledger| f(&mut ledger.borrow_mut()));
}

pub(crate) fn record_allocation(layout: BlockLayout) { with_ledger(|l| l.allocation(layout)) }

pub(crate) fn record_payload_release(layout: BlockLayout) { with_ledger(|l| l.payload_release(layout)) }

pub(crate) fn record_free(layout: BlockLayout) { with_ledger(|l| l.free(layout)) }

/// Snapshot of the block accounting of the calling thread.
pub fn thread_local_stats() -> Stats
{
    LEDGER
        .try_with(|ledger| ledger.borrow().stats.clone())
        .unwrap_or_default()
}

#[cfg(feature = "global")]
mod global
{
    use lazy_static::lazy_static;
    use parking_lot::{Mutex, RawMutex};

    use crate::Stats;

    type GlobalGuard = lock_api::MutexGuard<'static, RawMutex, Stats>;

    lazy_static! {
        static ref GLOBAL_LEDGER: Mutex<Stats> = Mutex::new(Stats::default());
    }

    fn lock() -> GlobalGuard { GLOBAL_LEDGER.lock() }

    pub(super) fn fold(stats: &Stats) { lock().merge(stats) }

    pub(super) fn snapshot() -> Stats { lock().clone() }
}

/// Block accounting of every thread that has exited so far.
///
/// A thread's ledger is folded in when the thread ends, so the calling
/// thread's own activity is not included; see `thread_local_stats`.
#[cfg(feature = "global")]
pub fn global_stats() -> Stats { global::snapshot() }
