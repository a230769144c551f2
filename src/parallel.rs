//! Thread barrier and inter-process halo exchange (spec §5 "Concurrency &
//! resource model"). Grounded in `src/executor.rs`'s `mpsc`-based
//! command/reactor channel pair, generalized here from a single command
//! channel to a bidirectional per-neighbor halo transport.
//!
//! No MPI crate is fabricated: none of the five retrieved repos depends on
//! one, so [`ChannelProcessGroup`] shows what an inter-process transport
//! built on `std::sync::mpsc` within one OS process would look like. It is
//! exercised only by this module's own tests: [`crate::simulation::Simulation::run`]
//! rejects any `mpi_parallel_dim` other than `(1, 1, 1)` because
//! [`crate::grid::GridSpace`] has no multi-process sub-box decomposition to
//! hand it real neighbor boundaries, so `ChannelProcessGroup` is not wired
//! into the driver. See `DESIGN.md` for the scope boundary this draws.

use std::sync::{
    Arc,
    Barrier,
    mpsc,
};

use crate::error::{
    FdtdError,
    Result,
};

/// Wraps [`std::sync::Barrier`]: the thread-level suspension point spec §5
/// names twice per step (after `updateH`/`correctH` and after
/// `updateE`/`correctE`), plus a third use after `record` (spec §4.4 step
/// 14). One barrier is shared by every thread task within a process.
#[derive(Debug, Clone)]
pub struct ThreadBarrier {
    inner: Arc<Barrier>,
}

impl ThreadBarrier {
    pub fn new(thread_count: usize) -> Self {
        Self { inner: Arc::new(Barrier::new(thread_count.max(1))) }
    }

    /// Blocks until every thread sharing this barrier has called `wait`.
    pub fn wait(&self) {
        self.inner.wait();
    }
}

/// One process's view of the hybrid P-process x T-thread scheduling model
/// (spec §5). `halo_exchange` is the one potentially-suspending, potentially-
/// fallible operation; everything else about a process group is metadata.
pub trait ProcessGroup: Send + Sync + std::fmt::Debug {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Process-level suspension point (spec §4.4 steps 4, 6, 12).
    fn barrier(&self);

    /// Exchanges the one-cell halo of tangential H components on every face
    /// this process does not own the global boundary of (spec §5 "Halo
    /// exchange"). `outgoing` holds this process's boundary-adjacent cells
    /// keyed by neighbor rank; the return value holds what each neighbor
    /// sent back, same keying.
    fn halo_exchange(&self, outgoing: Vec<(usize, Vec<f64>)>) -> Result<Vec<(usize, Vec<f64>)>>;
}

/// P = 1: every exchange is a no-op, matching spec §5's "a process that
/// owns the global boundary on a face skips that exchange" taken to its
/// single-process limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcessGroup;

impl ProcessGroup for SingleProcessGroup {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn halo_exchange(&self, _outgoing: Vec<(usize, Vec<f64>)>) -> Result<Vec<(usize, Vec<f64>)>> {
        Ok(Vec::new())
    }
}

/// P > 1 within one OS process: `mpsc` channels stand in for the
/// inter-process transport a real deployment would route over MPI. Every
/// member of the group holds a sender to every other member and a receiver
/// for its own inbox, so `halo_exchange` can post all sends before blocking
/// on all the receives it's expecting, matching spec §5's "after posting,
/// the master waits on all requests" ordering.
#[derive(Debug)]
pub struct ChannelProcessGroup {
    rank: usize,
    size: usize,
    senders: Vec<mpsc::Sender<(usize, Vec<f64>)>>,
    receiver: mpsc::Receiver<(usize, Vec<f64>)>,
    barrier: ThreadBarrier,
}

impl ChannelProcessGroup {
    /// Builds one [`ChannelProcessGroup`] per rank in `[0, size)`, each
    /// wired with a channel to every other rank and sharing one barrier.
    pub fn new_ring(size: usize) -> Result<Vec<Self>> {
        if size == 0 {
            return Err(FdtdError::ProcessProductMismatch { product: 0, processes: 0 });
        }

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::channel::<(usize, Vec<f64>)>()).unzip();
        let barrier = ThreadBarrier::new(size);

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| Ok(Self { rank, size, senders: senders.clone(), receiver, barrier: barrier.clone() }))
            .collect()
    }
}

impl ProcessGroup for ChannelProcessGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }

    fn halo_exchange(&self, outgoing: Vec<(usize, Vec<f64>)>) -> Result<Vec<(usize, Vec<f64>)>> {
        for (neighbor, payload) in outgoing {
            self.senders[neighbor]
                .send((self.rank, payload))
                .map_err(|err| FdtdError::HaloExchangeFailed { reason: err.to_string() })?;
        }

        self.barrier();

        let mut incoming = Vec::new();
        while let Ok((sender_rank, payload)) = self.receiver.try_recv() {
            incoming.push((sender_rank, payload));
        }
        Ok(incoming)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn single_process_group_never_exchanges() {
        let group = SingleProcessGroup;
        assert_eq!(group.size(), 1);
        assert!(group.halo_exchange(vec![(0, vec![1.0])]).unwrap().is_empty());
    }

    #[test]
    fn thread_barrier_releases_every_waiter() {
        let barrier = ThreadBarrier::new(3);
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || barrier.wait())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn channel_process_group_exchanges_ring_neighbors() {
        let groups = ChannelProcessGroup::new_ring(2).unwrap();
        let mut handles = Vec::new();
        for (rank, group) in groups.into_iter().enumerate() {
            handles.push(thread::spawn(move || {
                let neighbor = 1 - rank;
                let sent = vec![(neighbor, vec![rank as f64])];
                group.halo_exchange(sent).unwrap()
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], vec![(1usize, vec![1.0])]);
        assert_eq!(results[1], vec![(0usize, vec![0.0])]);
    }
}
