use crate::engine::{ClockPhase, Session, Snapshot};
use crate::input::{InputRouter, KeySource};
use anyhow::{anyhow, bail};
use log::{debug, info, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::sync::mpsc::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum ControlMsg {
    Stop,
}

/// What the frame hook wants the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    /// End the turn: the session is finished and the loop exits.
    Finish,
}

/// Runs a session frame by frame on its own thread.
///
/// The loop thread owns the session for the whole turn; key events and the
/// per-frame update are applied one after another on that thread.
#[derive(Debug)]
pub struct Driver<K: KeySource> {
    fps: u32,
    verbose: bool,
    keys: Arc<K>,
    running: AtomicBool,
    control_tx: Mutex<Option<Sender<ControlMsg>>>,
    worker_handle: Mutex<Option<JoinHandle<Session>>>,
}

impl<K: KeySource + 'static> Driver<K> {
    pub fn new(keys: K, fps: u32, verbose: bool) -> Self {
        Self {
            fps: fps.max(1),
            verbose,
            keys: Arc::new(keys),
            running: AtomicBool::new(false),
            control_tx: Mutex::new(None),
            worker_handle: Mutex::new(None),
        }
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// True from the moment `play` accepts a session until its loop has been
    /// joined, by `play` itself, [`Driver::wait`] or [`Driver::stop`].
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the game loop for `session`.
    ///
    /// `on_frame` sees a snapshot after every frame and decides when the turn
    /// is over. With `join` the call blocks and hands the session back once
    /// the loop exits; otherwise use [`Driver::wait`] or [`Driver::stop`].
    /// Only one loop runs per driver at a time.
    pub fn play<F>(&self, session: Session, on_frame: F, join: bool) -> anyhow::Result<Option<Session>>
    where
        F: FnMut(&Snapshot) -> FrameControl + Send + 'static,
    {
        if session.notes().is_empty() {
            bail!("No chart loaded..!")
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            bail!("Game loop already running..!")
        }

        let handle = {
            let Ok(mut wh) = self.worker_handle.lock() else {
                self.running.store(false, Ordering::SeqCst);
                bail!("Failed to lock worker handle..!")
            };
            let Ok(mut ctl) = self.control_tx.lock() else {
                self.running.store(false, Ordering::SeqCst);
                bail!("Failed to lock control_tx..!")
            };

            let keys = Arc::clone(&self.keys);
            let (tx, rx) = mpsc::channel::<ControlMsg>();
            let frame = Duration::from_secs_f64(1.0 / f64::from(self.fps));
            let verbose = self.verbose;

            *ctl = Some(tx);
            let handle = thread::spawn(move || run_loop(session, keys, rx, frame, on_frame, verbose));

            if !join {
                *wh = Some(handle);
                return Ok(None);
            }
            handle
        };

        let joined = handle.join();
        self.release();

        let session = joined.map_err(|_| anyhow!("Game loop thread panicked..!"))?;
        Ok(Some(session))
    }

    /// Blocks until a detached loop exits on its own.
    pub fn wait(&self) -> anyhow::Result<Option<Session>> {
        let handle = {
            let Ok(mut lock) = self.worker_handle.lock() else {
                bail!("Failed to lock worker_handle..!")
            };
            lock.take()
        };

        let Some(handle) = handle else {
            return Ok(None);
        };

        let joined = handle.join();
        self.release();

        let session = joined.map_err(|_| anyhow!("Game loop thread panicked..!"))?;
        Ok(Some(session))
    }

    /// Stops the loop. No frame runs after this returns.
    ///
    /// A detached loop is joined here and its session returned. A loop that
    /// `play` is joining hands its session back to that caller instead, so
    /// this only waits for it to exit.
    pub fn stop(&self) -> anyhow::Result<Option<Session>> {
        let tx = {
            let Ok(mut lock) = self.control_tx.lock() else {
                bail!("Failed to lock control_tx..!")
            };
            lock.take()
        };

        let Some(tx) = tx else {
            bail!("No game loop is running..!")
        };
        let _ = tx.send(ControlMsg::Stop);

        let handle = {
            let Ok(mut lock) = self.worker_handle.lock() else {
                bail!("Failed to lock worker_handle..!")
            };
            lock.take()
        };

        if let Some(handle) = handle {
            let joined = handle.join();
            self.release();

            let session = joined.map_err(|_| anyhow!("Game loop thread panicked..!"))?;
            debug!("Game loop thread joined..!");
            info!("Stopped game loop thread..!");
            return Ok(Some(session));
        }

        while self.is_running() {
            spin_sleep::sleep(Duration::from_millis(1));
        }
        info!("Stopped joined game loop..!");

        Ok(None)
    }

    fn release(&self) {
        if let Ok(mut ctl) = self.control_tx.lock() {
            ctl.take();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Seconds since the previous frame. The first frame of a loop gets zero so
/// the clock never jumps by the time spent before the loop started.
fn frame_dt(last_frame: Option<Instant>, frame_start: Instant) -> f64 {
    last_frame
        .map(|t| frame_start.duration_since(t).as_secs_f64())
        .unwrap_or(0.0)
}

fn run_loop<K, F>(
    mut session: Session,
    keys: Arc<K>,
    ctrl_rx: mpsc::Receiver<ControlMsg>,
    frame: Duration,
    mut on_frame: F,
    verbose: bool,
) -> Session
where
    K: KeySource,
    F: FnMut(&Snapshot) -> FrameControl,
{
    #[cfg(all(target_os = "windows", feature = "wininput"))]
    {
        use ::windows::Win32::System::Threading::{
            GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_HIGHEST,
        };
        unsafe {
            let h = GetCurrentThread();
            let ok = SetThreadPriority(h, THREAD_PRIORITY_HIGHEST);

            if ok.is_ok() {
                debug!("Game loop thread priority set to HIGHEST..!");
            } else {
                warn!("Failed to set game loop thread priority..!");
            }
        }
    }

    if let Err(why) = keys.reset() {
        warn!("Failed to reset key source: {:?}", why);
    }

    if matches!(session.phase(), ClockPhase::Idle | ClockPhase::Finished) {
        if let Err(why) = session.start() {
            warn!("Failed to start session: {}", why);
        }
    }

    let mut router = InputRouter::new(&session.config().lane_keys);
    let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
    let mut last_frame: Option<Instant> = None;
    let mut frames: u64 = 0;

    loop {
        if ctrl_rx.try_recv().is_ok() {
            router.release_all();
            warn!(
                "Game loop stopped via control message after {} frames at {:.3}s..!",
                frames,
                session.clock().time()
            );
            break;
        }

        let frame_start = Instant::now();
        let dt = frame_dt(last_frame, frame_start);
        last_frame = Some(frame_start);

        session.update(dt);

        match keys.poll(session.phase(), session.clock().time()) {
            Ok(events) => {
                for event in events {
                    let Some(hit) = router.handle(event, &mut session) else {
                        continue;
                    };

                    if verbose {
                        info!(
                            "{:8} | at {:>9.3}s | delta {:>+7.3}s | +{:<4} | combo {}",
                            hit.judgement.label(),
                            session.clock().time(),
                            hit.delta,
                            hit.gained,
                            hit.combo
                        );
                    }
                }
            }
            Err(why) => warn!("Input error at {:.3}s | why: {:?}", session.clock().time(), why),
        }

        let snapshot = session.snapshot(router.lanes_active());
        if on_frame(&snapshot) == FrameControl::Finish {
            router.release_all();
            if let Err(why) = session.finish() {
                warn!("Failed to finish session: {}", why);
            }
            break;
        }

        frames += 1;
        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            sleeper.sleep(frame - elapsed);
        }
    }

    info!("Game loop finished after {} frames..!", frames);
    session
}
