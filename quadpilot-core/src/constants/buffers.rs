//! Buffer Sizes
//!
//! Fixed capacities for per-tick storage. Nothing in the tick path allocates.

/// Maximum samples of one sensor type collected within a single tick.
///
/// At 1 kHz IMU sampling and a 20 ms control period a tick sees 20 samples;
/// 32 leaves headroom for bursty reads.
///
/// Memory: 32 × 24 bytes (IMU) ≈ 768 bytes per sensor sequence
pub const MAX_SAMPLES_PER_TICK: usize = 32;

/// Slots in the snapshot hand-off queue.
///
/// `heapless::spsc::Queue<_, N>` holds N-1 items, so 4 buffers three
/// snapshots between an acquisition thread and the control loop.
pub const HANDOFF_QUEUE_CAPACITY: usize = 4;
