//! Bounded plan cache.
//!
//! Process-scoped mapping from [`PlanKey`] to a live [`Plan`], with LRU
//! eviction to cap native resource consumption. The index mutex is held only
//! for bookkeeping; kernel planning and plan execution run outside it.
//! Concurrent misses on the same key collapse into a single kernel build:
//! the first caller installs a `Building` slot and later callers wait on a
//! condvar until it resolves.
//!
//! Eviction never destroys a plan mid-execution. A victim is retired
//! (removed from the index, new executions refused) and its native resource
//! is released when the last `Arc` drops, i.e. after every in-flight
//! execution has finished. [`PlanCache::clear`] additionally waits for that
//! drain so teardown only returns once all native destroys have happened.

use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::kernel::{FftError, Kernel};
use crate::num::{Complex, Float};
use crate::plan::{slice_alignment, Plan, PlanKey, MAX_PLANNED_ALIGN};

enum Slot<T: Float> {
    Ready { plan: Arc<Plan<T>>, last_used: u64 },
    Building,
}

struct Index<T: Float> {
    entries: HashMap<PlanKey, Slot<T>>,
    tick: u64,
}

/// Keyed cache of built plans with bounded-size LRU eviction.
pub struct PlanCache<T: Float> {
    kernel: Arc<dyn Kernel<T>>,
    capacity: usize,
    index: Mutex<Index<T>>,
    build_cv: Condvar,
}

impl<T: Float> PlanCache<T> {
    pub fn new(kernel: Arc<dyn Kernel<T>>, capacity: usize) -> Self {
        Self {
            kernel,
            capacity,
            index: Mutex::new(Index {
                entries: HashMap::new(),
                tick: 0,
            }),
            build_cv: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live plans currently cached.
    pub fn len(&self) -> usize {
        let index = self.lock_index();
        index
            .entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_index(&self) -> MutexGuard<'_, Index<T>> {
        match self.index.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Return the live plan for `key`, building it if absent.
    ///
    /// `sample_in`/`sample_out` are representative buffers handed to the
    /// kernel planner on a miss; they are not retained. With capacity 0 no
    /// plan can ever be admitted and the call fails with
    /// [`FftError::CacheCapacityExceeded`].
    pub fn get_or_build(
        &self,
        key: PlanKey,
        sample_in: &[Complex<T>],
        sample_out: &[Complex<T>],
    ) -> Result<Arc<Plan<T>>, FftError> {
        if self.capacity == 0 {
            return Err(FftError::CacheCapacityExceeded);
        }
        let mut index = self.lock_index();
        loop {
            let inner = &mut *index;
            match inner.entries.get_mut(&key) {
                Some(Slot::Ready { plan, last_used }) => {
                    let plan = Arc::clone(plan);
                    inner.tick += 1;
                    *last_used = inner.tick;
                    crate::vlog!("cache: hit {:?}", key.shape.extents());
                    return Ok(plan);
                }
                Some(Slot::Building) => {
                    index = match self.build_cv.wait(index) {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                }
                None => break,
            }
        }
        crate::vlog!("cache: miss {:?}", key.shape.extents());
        index.entries.insert(key.clone(), Slot::Building);
        drop(index);

        // single-flight: exactly this caller runs the kernel planner
        let built = self.kernel.plan(
            &key.shape,
            key.direction,
            key.flags,
            key.placement,
            sample_in,
            sample_out,
        );
        let inner = match built {
            Ok(inner) => inner,
            Err(err) => {
                let mut index = self.lock_index();
                index.entries.remove(&key);
                self.build_cv.notify_all();
                return Err(err);
            }
        };

        let align = if key.flags.unaligned() {
            1
        } else {
            // cap at the vector width so heap allocations with incidentally
            // stronger alignment do not poison the plan
            slice_alignment(sample_in)
                .min(slice_alignment(sample_out))
                .min(MAX_PLANNED_ALIGN)
        };
        let plan = Arc::new(Plan::new(key.clone(), inner, align));

        let mut index = self.lock_index();
        let mut victims = Vec::new();
        while self.ready_count(&index) >= self.capacity {
            match self.pop_lru(&mut index) {
                Some(victim) => victims.push(victim),
                None => break,
            }
        }
        index.tick += 1;
        let now = index.tick;
        index.entries.insert(
            key,
            Slot::Ready {
                plan: Arc::clone(&plan),
                last_used: now,
            },
        );
        self.build_cv.notify_all();
        drop(index);

        for victim in victims {
            crate::vlog!("cache: evict {:?}", victim.key().shape.extents());
            victim.retire();
        }
        Ok(plan)
    }

    fn ready_count(&self, index: &Index<T>) -> usize {
        index
            .entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    fn pop_lru(&self, index: &mut Index<T>) -> Option<Arc<Plan<T>>> {
        let key = index
            .entries
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready { last_used, .. } => Some((key.clone(), *last_used)),
                Slot::Building => None,
            })
            .min_by_key(|&(_, last_used)| last_used)
            .map(|(key, _)| key)?;
        match index.entries.remove(&key) {
            Some(Slot::Ready { plan, .. }) => Some(plan),
            _ => None,
        }
    }

    /// Retire and remove the plan for `key`, if cached.
    ///
    /// Used when external wisdom changed and a cached plan is stale. The
    /// native destroy is deferred until in-flight executions drain.
    pub fn invalidate(&self, key: &PlanKey) -> bool {
        let removed = {
            let mut index = self.lock_index();
            match index.entries.get(key) {
                Some(Slot::Ready { .. }) => match index.entries.remove(key) {
                    Some(Slot::Ready { plan, .. }) => Some(plan),
                    _ => None,
                },
                _ => None,
            }
        };
        match removed {
            Some(plan) => {
                crate::vlog!("cache: invalidate {:?}", key.shape.extents());
                plan.retire();
                true
            }
            None => false,
        }
    }

    /// Retire every cached plan and wait for in-flight executions to drain.
    ///
    /// Idempotent; pending builds are allowed to finish before their entry
    /// is torn down so the index never loses a `Building` slot.
    pub fn clear(&self) {
        let plans: Vec<Arc<Plan<T>>> = {
            let mut index = self.lock_index();
            while index
                .entries
                .values()
                .any(|slot| matches!(slot, Slot::Building))
            {
                index = match self.build_cv.wait(index) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
            index
                .entries
                .drain()
                .filter_map(|(_, slot)| match slot {
                    Slot::Ready { plan, .. } => Some(plan),
                    Slot::Building => None,
                })
                .collect()
        };
        for plan in &plans {
            plan.retire();
        }
        for plan in &plans {
            plan.wait_idle();
        }
        // native resources are released here as the collected Arcs drop,
        // unless an outside holder still executes against a plan; its
        // resource then drops with that holder's Arc
    }
}
