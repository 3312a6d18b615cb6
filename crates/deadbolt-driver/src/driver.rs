//! The door driver: one worker, four sensors, one queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, error, info, trace, warn};

use deadbolt_core::constants::{
    BUTTON_HOLD_WINDOW, BUZZER_HOLD, COMMAND_WAIT_TIMEOUT, LOCK_PULSE_WIDTH,
    OCCUPANCY_LOCK_AFTER, SHUTDOWN_GRACE, TOPIC_ALARM, TOPIC_BOLT, TOPIC_BUTTON, TOPIC_FRAME,
    TOPIC_OCCUPANTS, UNLOCK_PULSE_WIDTH,
};
use deadbolt_core::{Error, Result};
use deadbolt_hardware::{Edge, EdgeInput, OutputDevice};

use crate::command::{CommandKind, DoorCommand};
use crate::queue::{CommandQueue, CommandStream, WaitOutcome};
use crate::telemetry::TelemetryBus;

/// The door's peripherals, handed over to [`DoorDriver::start`].
///
/// Input polarity: a high frame sensor means the door stands open, a high
/// bolt sensor means the bolt is thrown, a high button means pressed.
#[derive(Debug)]
pub struct DoorHardware<O, I> {
    pub unlock_solenoid: O,
    pub lock_solenoid: O,
    pub buzzer: O,
    pub frame_sensor: I,
    pub bolt_sensor: I,
    pub button: I,
}

/// Driver configuration supplied at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Inbound telemetry topic carrying the space occupancy count.
    pub occupancy_topic: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            occupancy_topic: TOPIC_OCCUPANTS.to_string(),
        }
    }
}

/// State shared between the worker and the sensor tasks.
///
/// The two booleans mirror independently observed sensors; they are not
/// mutually exclusive during transitions. The two timers are the only
/// cross-task mutable state besides the queue.
#[derive(Debug)]
struct SharedState {
    door_open: AtomicBool,
    bolt_locked: AtomicBool,
    button_hold_since: Mutex<Option<Instant>>,
    occupancy_zero_since: Mutex<Option<Instant>>,
}

/// Drives the physical door.
///
/// Construction reads the live sensor levels, spawns the single worker task
/// that owns every actuator, and wires one task per sensor plus the
/// occupancy subscription. The public methods only enqueue; they never
/// block and are safe from any task.
///
/// # Examples
///
/// ```
/// use deadbolt_driver::{DoorDriver, DoorHardware, DriverConfig, InMemoryBus};
/// use deadbolt_hardware::Level;
/// use deadbolt_hardware::mock::{MockInput, MockOutput};
///
/// #[tokio::main]
/// async fn main() -> deadbolt_core::Result<()> {
///     let (unlock_solenoid, _) = MockOutput::new("unlock");
///     let (lock_solenoid, _) = MockOutput::new("lock");
///     let (buzzer, _) = MockOutput::new("buzzer");
///     let (frame_sensor, _frame) = MockInput::new("frame", Level::Low);
///     let (bolt_sensor, _bolt) = MockInput::new("bolt", Level::Low);
///     let (button, _button) = MockInput::new("button", Level::Low);
///
///     let driver = DoorDriver::start(
///         DoorHardware {
///             unlock_solenoid,
///             lock_solenoid,
///             buzzer,
///             frame_sensor,
///             bolt_sensor,
///             button,
///         },
///         InMemoryBus::new(),
///         DriverConfig::default(),
///     )
///     .await?;
///
///     driver.unlock(Some("alice"), false);
///     driver.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DoorDriver {
    queue: CommandQueue,
    shared: Arc<SharedState>,
    worker: JoinHandle<()>,
    sensors: JoinSet<()>,
}

impl DoorDriver {
    /// Read the initial door state from the live sensors and bring up the
    /// worker and sensor tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if either the frame or bolt sensor cannot be read.
    pub async fn start<O, I, B>(
        hardware: DoorHardware<O, I>,
        bus: B,
        config: DriverConfig,
    ) -> Result<Self>
    where
        O: OutputDevice + 'static,
        I: EdgeInput + 'static,
        B: TelemetryBus + Clone + 'static,
    {
        let DoorHardware {
            unlock_solenoid,
            lock_solenoid,
            buzzer,
            frame_sensor,
            bolt_sensor,
            button,
        } = hardware;

        let door_open = frame_sensor
            .level()
            .await
            .map_err(|e| Error::hardware(format!("frame sensor: {e}")))?
            .is_high();
        let bolt_locked = bolt_sensor
            .level()
            .await
            .map_err(|e| Error::hardware(format!("bolt sensor: {e}")))?
            .is_high();

        let shared = Arc::new(SharedState {
            door_open: AtomicBool::new(door_open),
            bolt_locked: AtomicBool::new(bolt_locked),
            button_hold_since: Mutex::new(None),
            occupancy_zero_since: Mutex::new(None),
        });

        let (queue, stream) = CommandQueue::channel();
        let occupancy_feed = bus.subscribe(&config.occupancy_topic);

        let worker = Worker {
            unlock_solenoid,
            lock_solenoid,
            buzzer,
            bus: bus.clone(),
            shared: shared.clone(),
            stream,
        };
        let worker = tokio::spawn(worker.run());

        let mut sensors = JoinSet::new();
        sensors.spawn(watch_button(
            button,
            shared.clone(),
            queue.clone(),
            bus.clone(),
        ));
        sensors.spawn(watch_frame(
            frame_sensor,
            shared.clone(),
            queue.clone(),
            bus.clone(),
        ));
        sensors.spawn(watch_bolt(bolt_sensor, shared.clone(), bus));
        sensors.spawn(watch_occupancy(occupancy_feed, shared.clone()));

        info!(door_open, bolt_locked, "door driver started");
        Ok(Self {
            queue,
            shared,
            worker,
            sensors,
        })
    }

    /// Enqueue a lock request.
    pub fn lock(&self, requester: Option<&str>, force: bool) {
        self.queue
            .push(DoorCommand::lock(requester.map(str::to_string), force));
    }

    /// Enqueue an unlock request.
    pub fn unlock(&self, requester: Option<&str>, force: bool) {
        self.queue
            .push(DoorCommand::unlock(requester.map(str::to_string), force));
    }

    /// Enqueue a lock-after-grace request (always forced).
    pub fn lock_shutdown(&self) {
        self.queue.push(DoorCommand::lock_shutdown());
    }

    /// Ask the worker to stop after its current command (always forced).
    ///
    /// Cooperative: a handler already running finishes first.
    pub fn stop(&self) {
        self.queue.push(DoorCommand::stop());
    }

    /// Stop the worker, wait for it, and tear down the sensor tasks.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Err(e) = self.worker.await {
            error!(error = %e, "door worker ended abnormally");
        }
        self.sensors.abort_all();
        while self.sensors.join_next().await.is_some() {}
        info!("door driver shut down");
    }

    /// Last observed door-frame state.
    #[must_use]
    pub fn is_door_open(&self) -> bool {
        self.shared.door_open.load(Ordering::SeqCst)
    }

    /// Last observed bolt state.
    #[must_use]
    pub fn is_bolt_locked(&self) -> bool {
        self.shared.bolt_locked.load(Ordering::SeqCst)
    }
}

/// The single task allowed to touch the actuators.
struct Worker<O, B> {
    unlock_solenoid: O,
    lock_solenoid: O,
    buzzer: O,
    bus: B,
    shared: Arc<SharedState>,
    stream: CommandStream,
}

/// Write an actuator line, logging instead of failing.
///
/// Peripheral writes are assumed to succeed in this design; a failure is
/// logged and the state machine carries on.
async fn set_line<O: OutputDevice>(output: &mut O, name: &str, active: bool) {
    if let Err(e) = output.set_active(active).await {
        error!(output = name, active, error = %e, "actuator write failed");
    }
}

impl<O, B> Worker<O, B>
where
    O: OutputDevice,
    B: TelemetryBus,
{
    async fn run(mut self) {
        debug!("door worker running");
        loop {
            match self.stream.next(COMMAND_WAIT_TIMEOUT).await {
                WaitOutcome::TimedOut => self.check_occupancy_failsafe().await,
                WaitOutcome::Closed => {
                    warn!("command queue closed, door worker exiting");
                    break;
                }
                WaitOutcome::Command(cmd) => {
                    info!(
                        kind = %cmd.kind,
                        requester = cmd.requester_label(),
                        issued_at = %cmd.issued_at,
                        "door command",
                    );
                    // Coalescing: an unforced command only drives hardware
                    // when nothing newer is queued behind it. This keeps a
                    // burst of toggles from chattering the relays; the last
                    // command wins.
                    if !(self.stream.is_empty() || cmd.force) {
                        debug!(kind = %cmd.kind, "superseded by a newer command, skipped");
                        continue;
                    }
                    match cmd.kind {
                        CommandKind::Unlock => self.unlock().await,
                        CommandKind::Lock => self.lock().await,
                        CommandKind::LockShutdown => self.lock_after_grace().await,
                        CommandKind::Stop => {
                            info!("stop command, door worker exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Pulse the unlock solenoid and hold the buzzer for the courtesy
    /// window, both measured from unlock start.
    async fn unlock(&mut self) {
        self.shared.occupancy_zero_since.lock().take();

        let started = Instant::now();
        set_line(&mut self.buzzer, "buzzer", true).await;
        set_line(&mut self.unlock_solenoid, "unlock solenoid", true).await;
        sleep(UNLOCK_PULSE_WIDTH).await;
        set_line(&mut self.unlock_solenoid, "unlock solenoid", false).await;
        sleep_until(started + BUZZER_HOLD).await;
        set_line(&mut self.buzzer, "buzzer", false).await;
    }

    /// Pulse the lock solenoid, unless the door stands open.
    async fn lock(&mut self) {
        if self.shared.door_open.load(Ordering::SeqCst) {
            debug!("door stands open, lock pulse suppressed");
            return;
        }
        set_line(&mut self.lock_solenoid, "lock solenoid", true).await;
        sleep(LOCK_PULSE_WIDTH).await;
        set_line(&mut self.lock_solenoid, "lock solenoid", false).await;
    }

    /// Wait out the grace period, then lock if the door is still closed.
    async fn lock_after_grace(&mut self) {
        sleep(SHUTDOWN_GRACE).await;
        if self.shared.door_open.load(Ordering::SeqCst) {
            debug!("door reopened during the grace period, auto-lock abandoned");
            return;
        }
        self.lock().await;
    }

    /// Emergency lock: runs on queue-wait timeouts only. If the space has
    /// reported zero occupants past the threshold while the door sits
    /// closed and unlocked, announce it and throw the bolt.
    async fn check_occupancy_failsafe(&mut self) {
        let expired = {
            let since = self.shared.occupancy_zero_since.lock();
            matches!(*since, Some(t) if t.elapsed() > OCCUPANCY_LOCK_AFTER)
        };
        if !expired {
            return;
        }
        if self.shared.bolt_locked.load(Ordering::SeqCst)
            || self.shared.door_open.load(Ordering::SeqCst)
        {
            return;
        }

        warn!("space empty past the threshold with the door unlocked, locking");
        self.bus
            .publish(TOPIC_ALARM, "door unlocked with nobody present, locking now")
            .await;
        self.lock().await;
        self.shared.occupancy_zero_since.lock().take();
    }
}

async fn watch_button<I, B>(
    mut button: I,
    shared: Arc<SharedState>,
    queue: CommandQueue,
    bus: B,
) where
    I: EdgeInput,
    B: TelemetryBus,
{
    loop {
        let edge = match button.next_edge().await {
            Ok(edge) => edge,
            Err(e) => {
                debug!(error = %e, "button input closed");
                return;
            }
        };
        match edge {
            Edge::Rising => {
                bus.publish(TOPIC_BUTTON, "pressed").await;
                if shared.bolt_locked.load(Ordering::SeqCst) {
                    queue.push(DoorCommand::unlock(None, false));
                } else {
                    // Already unlocked: the press arms the auto-lock hold
                    // window instead.
                    *shared.button_hold_since.lock() = Some(Instant::now());
                }
            }
            Edge::Falling => bus.publish(TOPIC_BUTTON, "released").await,
        }
    }
}

async fn watch_frame<I, B>(
    mut frame: I,
    shared: Arc<SharedState>,
    queue: CommandQueue,
    bus: B,
) where
    I: EdgeInput,
    B: TelemetryBus,
{
    loop {
        let edge = match frame.next_edge().await {
            Ok(edge) => edge,
            Err(e) => {
                debug!(error = %e, "frame input closed");
                return;
            }
        };
        match edge {
            Edge::Rising => {
                shared.door_open.store(true, Ordering::SeqCst);
                bus.publish(TOPIC_FRAME, "open").await;
                // Reopening cancels a pending auto-lock.
                shared.button_hold_since.lock().take();
            }
            Edge::Falling => {
                shared.door_open.store(false, Ordering::SeqCst);
                bus.publish(TOPIC_FRAME, "closed").await;
                let armed = {
                    let mut hold = shared.button_hold_since.lock();
                    match *hold {
                        Some(t) if t.elapsed() <= BUTTON_HOLD_WINDOW => {
                            *hold = None;
                            true
                        }
                        _ => false,
                    }
                };
                if armed {
                    queue.push(DoorCommand::lock_shutdown());
                }
            }
        }
    }
}

async fn watch_bolt<I, B>(mut bolt: I, shared: Arc<SharedState>, bus: B)
where
    I: EdgeInput,
    B: TelemetryBus,
{
    loop {
        let edge = match bolt.next_edge().await {
            Ok(edge) => edge,
            Err(e) => {
                debug!(error = %e, "bolt input closed");
                return;
            }
        };
        match edge {
            Edge::Rising => {
                shared.bolt_locked.store(true, Ordering::SeqCst);
                bus.publish(TOPIC_BOLT, "locked").await;
            }
            Edge::Falling => {
                shared.bolt_locked.store(false, Ordering::SeqCst);
                bus.publish(TOPIC_BOLT, "unlocked").await;
            }
        }
    }
}

async fn watch_occupancy(mut feed: mpsc::UnboundedReceiver<String>, shared: Arc<SharedState>) {
    while let Some(payload) = feed.recv().await {
        match payload.trim().parse::<i64>() {
            Ok(0) => {
                let mut since = shared.occupancy_zero_since.lock();
                // Keep the original mark: periodic re-publishes of the same
                // zero count must not restart the window.
                if since.is_none() {
                    *since = Some(Instant::now());
                }
            }
            Ok(_) => {
                shared.occupancy_zero_since.lock().take();
            }
            Err(_) => trace!(%payload, "unparseable occupancy payload ignored"),
        }
    }
    debug!("occupancy feed closed");
}
