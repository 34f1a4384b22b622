//! Implementations for the NoiseBank state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, warn};
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

// Internal
use super::{NoiseBankError, NoiseMode, NoiseParams, PregenStd, SamplingStd};
use crate::batch::{ControlBatch, ControlSequence};

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Guards the diagnostic noise dump, which may happen at most once per
/// process no matter how many banks are created.
static NOISE_DUMPED: AtomicBool = AtomicBool::new(false);

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Supplies perturbation batches for the optimizer, see the module docs for
/// the operating modes.
pub struct NoiseBank {
    params: NoiseParams,

    /// State shared with the background worker. All access to the noise
    /// buffers goes through this one mutex/condvar pair.
    shared: Arc<Shared>,

    worker: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<Buffers>,
    cond: Condvar,
}

/// The noise buffers and everything the worker needs to regenerate them.
struct Buffers {
    vx: Array2<f32>,
    vy: Array2<f32>,
    wz: Array2<f32>,

    bank: Option<Bank>,

    rng: ChaCha8Rng,
    dist_vx: Normal<f32>,
    dist_vy: Normal<f32>,
    dist_wz: Normal<f32>,

    mode: NoiseMode,
    holonomic: bool,

    /// Consumer has finished with the current buffers, worker may regenerate.
    ready: bool,

    /// Cleared on shutdown. The worker checks this at its single blocking
    /// wait point and after every regeneration.
    active: bool,
}

/// The pre-generated circular bank.
enum Bank {
    /// One store drawn with the vx standard deviation, all axes served from
    /// it. The index advances once per axis fetch, as in a flat ring buffer.
    SharedStd { store: Array3<f32>, idx: usize },

    /// One store per active axis, each drawn with its own standard deviation.
    /// The index advances once per cycle.
    PerAxisStd {
        vx: Array3<f32>,
        vy: Option<Array3<f32>>,
        wz: Array3<f32>,
        idx: usize,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl NoiseBank {
    /// Create a new noise bank and generate its first noise batch.
    ///
    /// In background mode this also spawns the worker thread. In pregenerated
    /// mode the whole bank is drawn here, so construction is the slow path
    /// and every cycle afterwards is an index advance plus a copy.
    pub fn new(
        params: &NoiseParams,
        std: SamplingStd,
        batch_size: usize,
        time_steps: usize,
        holonomic: bool,
    ) -> Result<Self, NoiseBankError> {
        if params.mode == NoiseMode::Pregenerated && params.pregenerate_size == 0 {
            return Err(NoiseBankError::EmptyBank);
        }

        let rng = if params.seed != 0 {
            ChaCha8Rng::seed_from_u64(params.seed)
        } else {
            ChaCha8Rng::from_entropy()
        };

        let mut buffers = Buffers {
            vx: Array2::zeros((batch_size, time_steps)),
            vy: Array2::zeros((batch_size, time_steps)),
            wz: Array2::zeros((batch_size, time_steps)),
            bank: None,
            rng,
            dist_vx: new_dist(std.vx, "vx")?,
            dist_vy: new_dist(std.vy, "vy")?,
            dist_wz: new_dist(std.wz, "wz")?,
            mode: params.mode,
            holonomic,
            ready: false,
            active: true,
        };

        match params.mode {
            NoiseMode::Pregenerated => {
                buffers.redraw_bank(params.pregenerate_size, params.pregen_std);
            }
            _ => buffers.regenerate(),
        }

        if params.dump_first_slice && !NOISE_DUMPED.swap(true, Ordering::SeqCst) {
            let slice = match buffers.bank {
                Some(Bank::SharedStd { ref store, .. }) => store.index_axis(Axis(0), 0),
                Some(Bank::PerAxisStd { ref vx, .. }) => vx.index_axis(Axis(0), 0),
                None => buffers.vx.view(),
            };
            match dump_noise_slice(&slice, &params.dump_dir, std.vx) {
                Ok(path) => info!("Dumped first noise slice to {:?}", path),
                Err(e) => warn!("Could not dump first noise slice: {}", e),
            }
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(buffers),
            cond: Condvar::new(),
        });

        let worker = match params.mode {
            NoiseMode::Background => {
                let worker_shared = shared.clone();
                Some(thread::spawn(move || worker_thread(worker_shared)))
            }
            _ => None,
        };

        Ok(Self {
            params: params.clone(),
            shared,
            worker,
        })
    }

    /// Write the current noise batch added to the nominal sequence into the
    /// perturbed control batch.
    ///
    /// In pregenerated mode this advances the bank index and copies out the
    /// next slices first. The holonomic linear Y axis is only populated when
    /// the bank was created holonomic.
    pub fn apply_noised_controls(
        &self,
        sequence: &ControlSequence,
        controls: &mut ControlBatch,
    ) -> Result<(), NoiseBankError> {
        let mut buf = self
            .shared
            .state
            .lock()
            .map_err(|_| NoiseBankError::LockPoisoned)?;

        if buf.vx.dim() != controls.cvx.dim() {
            return Err(NoiseBankError::ShapeMismatch(
                buf.vx.dim(),
                controls.cvx.dim(),
            ));
        }

        if buf.mode == NoiseMode::Pregenerated {
            buf.advance_bank();
        }

        Zip::from(&mut controls.cvx)
            .and(&buf.vx)
            .and_broadcast(&sequence.vx)
            .for_each(|c, &n, &s| *c = n + s);
        Zip::from(&mut controls.cwz)
            .and(&buf.wz)
            .and_broadcast(&sequence.wz)
            .for_each(|c, &n, &s| *c = n + s);
        if buf.holonomic {
            Zip::from(&mut controls.cvy)
                .and(&buf.vy)
                .and_broadcast(&sequence.vy)
                .for_each(|c, &n, &s| *c = n + s);
        }

        Ok(())
    }

    /// Signal that the current noise batch has been consumed and the next one
    /// may be generated.
    ///
    /// In background mode this wakes the worker and returns immediately so
    /// generation overlaps the rest of the cycle. In on-demand mode the next
    /// batch is drawn synchronously here. In pregenerated mode this is a
    /// no-op, the bank index advances on the next apply.
    pub fn signal_regenerate(&self) -> Result<(), NoiseBankError> {
        match self.params.mode {
            NoiseMode::Background => {
                {
                    let mut buf = self
                        .shared
                        .state
                        .lock()
                        .map_err(|_| NoiseBankError::LockPoisoned)?;
                    buf.ready = true;
                }
                self.shared.cond.notify_all();
            }
            NoiseMode::OnDemand => {
                let mut buf = self
                    .shared
                    .state
                    .lock()
                    .map_err(|_| NoiseBankError::LockPoisoned)?;
                buf.regenerate();
            }
            NoiseMode::Pregenerated => (),
        }

        Ok(())
    }

    /// Reset the bank for the given sampling configuration.
    ///
    /// Zeros the currently-held noise buffers at the new shape, reseeds the
    /// random engine when a fixed seed is configured, and depending on the
    /// mode either redraws the bank, marks the worker ready to regenerate, or
    /// redraws synchronously. Guarantees that no iteration consumes stale
    /// noise after a dimensionality change.
    pub fn reset(
        &mut self,
        std: SamplingStd,
        batch_size: usize,
        time_steps: usize,
        holonomic: bool,
    ) -> Result<(), NoiseBankError> {
        {
            let mut buf = self
                .shared
                .state
                .lock()
                .map_err(|_| NoiseBankError::LockPoisoned)?;

            buf.vx = Array2::zeros((batch_size, time_steps));
            buf.vy = Array2::zeros((batch_size, time_steps));
            buf.wz = Array2::zeros((batch_size, time_steps));
            buf.dist_vx = new_dist(std.vx, "vx")?;
            buf.dist_vy = new_dist(std.vy, "vy")?;
            buf.dist_wz = new_dist(std.wz, "wz")?;
            buf.holonomic = holonomic;
            if self.params.seed != 0 {
                buf.rng = ChaCha8Rng::seed_from_u64(self.params.seed);
            }

            match self.params.mode {
                NoiseMode::Pregenerated => {
                    buf.redraw_bank(self.params.pregenerate_size, self.params.pregen_std)
                }
                NoiseMode::OnDemand => buf.regenerate(),
                NoiseMode::Background => buf.ready = true,
            }
        }

        if self.params.mode == NoiseMode::Background {
            self.shared.cond.notify_all();
        }

        Ok(())
    }

    /// Stop the background worker and wait for it to exit.
    ///
    /// Returns only once the worker thread has fully stopped; no buffer
    /// mutation can be observed afterwards. Safe to call in any mode and more
    /// than once.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Ok(mut buf) = self.shared.state.lock() {
                buf.active = false;
                buf.ready = true;
            }
            self.shared.cond.notify_all();
            if handle.join().is_err() {
                warn!("Noise bank worker thread panicked during shutdown");
            }
        }
    }

    /// Clone out the current noise buffers, for diagnostics and tests.
    pub fn snapshot(&self) -> Result<(Array2<f32>, Array2<f32>, Array2<f32>), NoiseBankError> {
        let buf = self
            .shared
            .state
            .lock()
            .map_err(|_| NoiseBankError::LockPoisoned)?;
        Ok((buf.vx.clone(), buf.vy.clone(), buf.wz.clone()))
    }
}

impl Drop for NoiseBank {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Buffers {
    /// Fill the noise buffers with fresh samples, or with the next bank
    /// slices in pregenerated mode.
    fn regenerate(&mut self) {
        if self.bank.is_some() {
            self.advance_bank();
            return;
        }

        let Buffers {
            ref mut rng,
            ref mut vx,
            ref mut vy,
            ref mut wz,
            dist_vx,
            dist_vy,
            dist_wz,
            holonomic,
            ..
        } = *self;

        for v in vx.iter_mut() {
            *v = dist_vx.sample(rng);
        }
        for v in wz.iter_mut() {
            *v = dist_wz.sample(rng);
        }
        if holonomic {
            for v in vy.iter_mut() {
                *v = dist_vy.sample(rng);
            }
        }
    }

    /// Copy the next bank slices into the noise buffers.
    fn advance_bank(&mut self) {
        let Buffers {
            ref mut bank,
            ref mut vx,
            ref mut vy,
            ref mut wz,
            holonomic,
            ..
        } = *self;

        match bank {
            Some(Bank::SharedStd { store, idx }) => {
                let size = store.len_of(Axis(0));
                *idx = (*idx + 1) % size;
                vx.assign(&store.index_axis(Axis(0), *idx));
                *idx = (*idx + 1) % size;
                wz.assign(&store.index_axis(Axis(0), *idx));
                if holonomic {
                    *idx = (*idx + 1) % size;
                    vy.assign(&store.index_axis(Axis(0), *idx));
                }
            }
            Some(Bank::PerAxisStd {
                vx: bank_vx,
                vy: bank_vy,
                wz: bank_wz,
                idx,
            }) => {
                let size = bank_vx.len_of(Axis(0));
                *idx = (*idx + 1) % size;
                vx.assign(&bank_vx.index_axis(Axis(0), *idx));
                wz.assign(&bank_wz.index_axis(Axis(0), *idx));
                // The lateral store is only ever drawn for holonomic banks
                if let Some(bank_vy) = bank_vy {
                    vy.assign(&bank_vy.index_axis(Axis(0), *idx));
                }
            }
            None => (),
        }
    }

    /// Draw the whole pre-generated bank.
    fn redraw_bank(&mut self, pregenerate_size: usize, pregen_std: PregenStd) {
        let (batch_size, time_steps) = self.vx.dim();
        let shape = (pregenerate_size, batch_size, time_steps);

        self.bank = Some(match pregen_std {
            PregenStd::Shared => Bank::SharedStd {
                store: draw_store(&mut self.rng, &self.dist_vx, shape),
                idx: 0,
            },
            PregenStd::PerAxis => Bank::PerAxisStd {
                vx: draw_store(&mut self.rng, &self.dist_vx, shape),
                vy: if self.holonomic {
                    Some(draw_store(&mut self.rng, &self.dist_vy, shape))
                } else {
                    None
                },
                wz: draw_store(&mut self.rng, &self.dist_wz, shape),
                idx: 0,
            },
        });
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The background worker loop.
///
/// Blocks on the condition variable until the consumer signals that the
/// current buffers have been consumed, then regenerates. Shutdown clears the
/// active flag and wakes the worker, which exits without doing any further
/// generation work.
fn worker_thread(shared: Arc<Shared>) {
    let mut buf = match shared.state.lock() {
        Ok(guard) => guard,
        Err(_) => return,
    };

    loop {
        while !buf.ready {
            buf = match shared.cond.wait(buf) {
                Ok(guard) => guard,
                Err(_) => return,
            };
        }
        buf.ready = false;

        if !buf.active {
            break;
        }

        buf.regenerate();

        if !buf.active {
            break;
        }
    }
}

fn new_dist(std: f32, axis: &'static str) -> Result<Normal<f32>, NoiseBankError> {
    if !std.is_finite() || std < 0.0 {
        return Err(NoiseBankError::InvalidStd(axis));
    }
    Normal::new(0.0, std).map_err(|_| NoiseBankError::InvalidStd(axis))
}

fn draw_store(
    rng: &mut ChaCha8Rng,
    dist: &Normal<f32>,
    shape: (usize, usize, usize),
) -> Array3<f32> {
    let mut store = Array3::zeros(shape);
    for v in store.iter_mut() {
        *v = dist.sample(rng);
    }
    store
}

/// Write one noise slice as CSV for offline inspection, one row per batch
/// entry. Returns the path written.
fn dump_noise_slice(
    slice: &ArrayView2<f32>,
    dump_dir: &str,
    std_vx: f32,
) -> Result<PathBuf, NoiseBankError> {
    let path = PathBuf::from(dump_dir).join(format!("mppi_noises_vx_{}.csv", std_vx));

    let mut writer = csv::Writer::from_path(&path).map_err(NoiseBankError::DumpError)?;
    for row in slice.rows() {
        let record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(path)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    fn test_params(mode: NoiseMode, seed: u64) -> NoiseParams {
        NoiseParams {
            mode,
            seed,
            pregenerate_size: 4,
            pregen_std: PregenStd::Shared,
            dump_first_slice: false,
            dump_dir: "/tmp".into(),
        }
    }

    #[test]
    fn test_on_demand_shape_and_stats() {
        let bank = NoiseBank::new(
            &test_params(NoiseMode::OnDemand, 42),
            SamplingStd::default(),
            2000,
            56,
            false,
        )
        .unwrap();

        let (vx, vy, wz) = bank.snapshot().unwrap();
        assert_eq!(vx.dim(), (2000, 56));
        assert_eq!(wz.dim(), (2000, 56));

        // Not holonomic, so vy must not be populated
        assert!(vy.iter().all(|&v| v == 0.0));

        // Sample statistics over 112k draws should be close to configured
        let n = vx.len() as f32;
        let mean = vx.sum() / n;
        let var = vx.mapv(|v| (v - mean) * (v - mean)).sum() / n;
        assert!(mean.abs() < 0.01, "mean = {}", mean);
        assert!((var.sqrt() - 0.2).abs() < 0.01, "std = {}", var.sqrt());

        let wz_mean = wz.sum() / n;
        let wz_var = wz.mapv(|v| (v - wz_mean) * (v - wz_mean)).sum() / n;
        assert!((wz_var.sqrt() - 0.4).abs() < 0.02, "std = {}", wz_var.sqrt());
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let params = test_params(NoiseMode::OnDemand, 7);
        let bank_a =
            NoiseBank::new(&params, SamplingStd::default(), 32, 8, true).unwrap();
        let bank_b =
            NoiseBank::new(&params, SamplingStd::default(), 32, 8, true).unwrap();

        let (avx, avy, awz) = bank_a.snapshot().unwrap();
        let (bvx, bvy, bwz) = bank_b.snapshot().unwrap();
        assert_eq!(avx, bvx);
        assert_eq!(avy, bvy);
        assert_eq!(awz, bwz);

        // And the streams stay locked together across regeneration
        bank_a.signal_regenerate().unwrap();
        bank_b.signal_regenerate().unwrap();
        assert_eq!(bank_a.snapshot().unwrap().0, bank_b.snapshot().unwrap().0);
    }

    #[test]
    fn test_entropy_seed_differs() {
        let params = test_params(NoiseMode::OnDemand, 0);
        let bank_a =
            NoiseBank::new(&params, SamplingStd::default(), 32, 8, false).unwrap();
        let bank_b =
            NoiseBank::new(&params, SamplingStd::default(), 32, 8, false).unwrap();

        assert_ne!(bank_a.snapshot().unwrap().0, bank_b.snapshot().unwrap().0);
    }

    #[test]
    fn test_pregenerated_wraps_after_visiting_every_slot() {
        let params = NoiseParams {
            pregenerate_size: 3,
            ..test_params(NoiseMode::Pregenerated, 13)
        };
        let bank = NoiseBank::new(&params, SamplingStd::default(), 4, 5, false).unwrap();

        let mut seq = ControlSequence::default();
        seq.reset(5);
        let mut controls = ControlBatch::default();
        controls.reset(4, 5);

        // Two fetches per cycle (vx, wz) against a bank of 3 gives a period
        // of 3 cycles over which every slot is visited
        let mut slices = Vec::new();
        for _ in 0..6 {
            bank.apply_noised_controls(&seq, &mut controls).unwrap();
            bank.signal_regenerate().unwrap();
            slices.push(bank.snapshot().unwrap().0);
        }

        assert_ne!(slices[0], slices[1]);
        assert_ne!(slices[1], slices[2]);
        assert_ne!(slices[0], slices[2]);
        assert_eq!(slices[0], slices[3]);
        assert_eq!(slices[1], slices[4]);
        assert_eq!(slices[2], slices[5]);
    }

    #[test]
    fn test_pregenerated_per_axis_period() {
        let params = NoiseParams {
            pregenerate_size: 2,
            pregen_std: PregenStd::PerAxis,
            ..test_params(NoiseMode::Pregenerated, 13)
        };
        let bank = NoiseBank::new(&params, SamplingStd::default(), 4, 5, false).unwrap();

        let mut seq = ControlSequence::default();
        seq.reset(5);
        let mut controls = ControlBatch::default();
        controls.reset(4, 5);

        let mut slices = Vec::new();
        for _ in 0..4 {
            bank.apply_noised_controls(&seq, &mut controls).unwrap();
            slices.push(bank.snapshot().unwrap().0);
        }

        assert_ne!(slices[0], slices[1]);
        assert_eq!(slices[0], slices[2]);
        assert_eq!(slices[1], slices[3]);
    }

    #[test]
    fn test_pregenerated_per_axis_lateral_store() {
        let params = NoiseParams {
            pregenerate_size: 2,
            pregen_std: PregenStd::PerAxis,
            ..test_params(NoiseMode::Pregenerated, 29)
        };

        let mut seq = ControlSequence::default();
        seq.reset(5);
        let mut controls = ControlBatch::default();
        controls.reset(4, 5);

        // A holonomic bank serves the lateral axis from its own store
        let bank = NoiseBank::new(&params, SamplingStd::default(), 4, 5, true).unwrap();
        bank.apply_noised_controls(&seq, &mut controls).unwrap();
        let (vx, vy, _) = bank.snapshot().unwrap();
        assert!(vy.iter().any(|&v| v != 0.0));
        assert_ne!(vx, vy);

        // A non-holonomic one never touches it
        let bank = NoiseBank::new(&params, SamplingStd::default(), 4, 5, false).unwrap();
        bank.apply_noised_controls(&seq, &mut controls).unwrap();
        let (_, vy, _) = bank.snapshot().unwrap();
        assert!(vy.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_applied_controls_are_sequence_plus_noise() {
        let bank = NoiseBank::new(
            &test_params(NoiseMode::OnDemand, 3),
            SamplingStd::default(),
            8,
            4,
            false,
        )
        .unwrap();

        let mut seq = ControlSequence::default();
        seq.reset(4);
        seq.vx.fill(0.5);

        let mut controls = ControlBatch::default();
        controls.reset(8, 4);
        bank.apply_noised_controls(&seq, &mut controls).unwrap();

        let (vx, _, _) = bank.snapshot().unwrap();
        for b in 0..8 {
            for t in 0..4 {
                let expected = 0.5 + vx[[b, t]];
                assert!((controls.cvx[[b, t]] - expected).abs() < 1e-6);
            }
        }

        // Non-holonomic platforms must not see lateral noise
        assert!(controls.cvy.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bank = NoiseBank::new(
            &test_params(NoiseMode::OnDemand, 3),
            SamplingStd::default(),
            8,
            4,
            false,
        )
        .unwrap();

        let mut seq = ControlSequence::default();
        seq.reset(6);
        let mut controls = ControlBatch::default();
        controls.reset(16, 6);

        assert!(matches!(
            bank.apply_noised_controls(&seq, &mut controls),
            Err(NoiseBankError::ShapeMismatch(_, _))
        ));
    }

    #[test]
    fn test_reset_matches_fresh_bank() {
        let params = test_params(NoiseMode::OnDemand, 21);
        let mut bank =
            NoiseBank::new(&params, SamplingStd::default(), 16, 8, false).unwrap();

        // Advance the stream, then reset: a fixed seed is reseeded so the
        // stream matches a freshly-initialised bank
        bank.signal_regenerate().unwrap();
        bank.reset(SamplingStd::default(), 16, 8, false).unwrap();

        let fresh = NoiseBank::new(&params, SamplingStd::default(), 16, 8, false).unwrap();
        assert_eq!(bank.snapshot().unwrap().0, fresh.snapshot().unwrap().0);
    }

    #[test]
    fn test_reset_changes_shape() {
        let params = test_params(NoiseMode::OnDemand, 21);
        let mut bank =
            NoiseBank::new(&params, SamplingStd::default(), 16, 8, false).unwrap();

        bank.reset(SamplingStd::default(), 4, 2, false).unwrap();
        assert_eq!(bank.snapshot().unwrap().0.dim(), (4, 2));
    }

    #[test]
    fn test_background_regenerates() {
        let bank = NoiseBank::new(
            &test_params(NoiseMode::Background, 5),
            SamplingStd::default(),
            16,
            8,
            false,
        )
        .unwrap();

        let initial = bank.snapshot().unwrap().0;
        bank.signal_regenerate().unwrap();

        // The worker regenerates asynchronously, poll for the change
        let mut changed = false;
        for _ in 0..100 {
            if bank.snapshot().unwrap().0 != initial {
                changed = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(changed, "worker never regenerated the noise buffers");
    }

    #[test]
    fn test_background_shutdown_stops_worker() {
        let mut bank = NoiseBank::new(
            &test_params(NoiseMode::Background, 5),
            SamplingStd::default(),
            64,
            16,
            false,
        )
        .unwrap();

        bank.signal_regenerate().unwrap();
        bank.shutdown();

        // No buffer mutation may be observable after shutdown returns
        let after = bank.snapshot().unwrap().0;
        bank.signal_regenerate().unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(bank.snapshot().unwrap().0, after);

        // Shutdown is idempotent
        bank.shutdown();
    }

    #[test]
    fn test_dump_noise_slice_roundtrip() {
        let slice = Array2::from_shape_fn((3, 4), |(b, t)| (b * 4 + t) as f32);
        let dir = std::env::temp_dir();
        let path =
            dump_noise_slice(&slice.view(), dir.to_str().unwrap(), 0.25).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[1].get(2).unwrap(), "6");

        std::fs::remove_file(path).unwrap();
    }
}
