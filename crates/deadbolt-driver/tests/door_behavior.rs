//! End-to-end driver behavior against mock hardware and an in-memory bus.
//!
//! Every test runs on the paused Tokio clock, so pulse widths, grace
//! periods, and the occupancy threshold elapse instantly and
//! deterministically.

use std::time::Duration;

use tokio::time::sleep;

use deadbolt_core::constants::{
    TOPIC_ALARM, TOPIC_BOLT, TOPIC_BUTTON, TOPIC_FRAME, TOPIC_OCCUPANTS,
};
use deadbolt_driver::{DoorDriver, DoorHardware, DriverConfig, InMemoryBus, TelemetryBus};
use deadbolt_hardware::Level;
use deadbolt_hardware::mock::{MockInput, MockInputHandle, MockOutput, MockOutputHandle};

/// Lets pending sensor tasks observe an edge before the test proceeds.
const SETTLE: Duration = Duration::from_millis(10);

struct Rig {
    driver: DoorDriver,
    bus: InMemoryBus,
    unlock: MockOutputHandle,
    lock: MockOutputHandle,
    buzzer: MockOutputHandle,
    frame: MockInputHandle,
    bolt: MockInputHandle,
    button: MockInputHandle,
}

impl Rig {
    /// Door closed, bolt unlocked, button released.
    async fn start() -> Self {
        Self::start_with(Level::Low, Level::Low).await
    }

    async fn start_with(frame_level: Level, bolt_level: Level) -> Self {
        let (unlock_solenoid, unlock) = MockOutput::new("unlock solenoid");
        let (lock_solenoid, lock) = MockOutput::new("lock solenoid");
        let (buzzer_out, buzzer) = MockOutput::new("buzzer");
        let (frame_sensor, frame) = MockInput::new("frame", frame_level);
        let (bolt_sensor, bolt) = MockInput::new("bolt", bolt_level);
        let (button_in, button) = MockInput::new("button", Level::Low);

        let bus = InMemoryBus::new();
        let driver = DoorDriver::start(
            DoorHardware {
                unlock_solenoid,
                lock_solenoid,
                buzzer: buzzer_out,
                frame_sensor,
                bolt_sensor,
                button: button_in,
            },
            bus.clone(),
            DriverConfig::default(),
        )
        .await
        .expect("driver start");

        Self {
            driver,
            bus,
            unlock,
            lock,
            buzzer,
            frame,
            bolt,
            button,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn initial_state_comes_from_the_sensors() {
    let rig = Rig::start_with(Level::High, Level::High).await;
    assert!(rig.driver.is_door_open());
    assert!(rig.driver.is_bolt_locked());

    let rig = Rig::start().await;
    assert!(!rig.driver.is_door_open());
    assert!(!rig.driver.is_bolt_locked());
}

#[tokio::test(start_paused = true)]
async fn burst_of_unforced_commands_coalesces_to_the_last() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), false);
    rig.driver.unlock(Some("bob"), false);
    rig.driver.lock(Some("carol"), false);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.unlock.activation_count(), 0);
    assert_eq!(rig.buzzer.activation_count(), 0);
    assert_eq!(rig.lock.activation_count(), 1);
    assert_eq!(rig.lock.history(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn forced_command_executes_despite_a_queued_successor() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), true);
    rig.driver.lock(Some("bob"), false);
    sleep(Duration::from_secs(6)).await;

    assert_eq!(rig.unlock.activation_count(), 1);
    assert_eq!(rig.lock.activation_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn drained_queue_means_every_command_runs() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), false);
    sleep(Duration::from_secs(6)).await;
    rig.driver.unlock(Some("alice"), false);
    sleep(Duration::from_secs(6)).await;

    assert_eq!(rig.unlock.activation_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn unlock_pulse_and_buzzer_window_timing() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), false);

    sleep(Duration::from_millis(100)).await;
    assert!(rig.unlock.is_active(), "solenoid energized mid-pulse");
    assert!(rig.buzzer.is_active(), "buzzer sounds with the pulse");

    sleep(Duration::from_millis(150)).await;
    assert!(!rig.unlock.is_active(), "pulse ends at 200ms");
    assert!(rig.buzzer.is_active(), "buzzer outlasts the pulse");

    sleep(Duration::from_millis(5050)).await;
    assert!(!rig.buzzer.is_active(), "buzzer window is five seconds");
    assert_eq!(rig.buzzer.history(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn lock_is_suppressed_while_the_door_stands_open() {
    let rig = Rig::start().await;

    rig.frame.set_high();
    sleep(SETTLE).await;
    assert!(rig.driver.is_door_open());

    rig.driver.lock(Some("alice"), false);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(rig.lock.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn button_press_while_locked_requests_an_unlock() {
    let rig = Rig::start_with(Level::Low, Level::High).await;
    let mut presses = rig.bus.subscribe(TOPIC_BUTTON);

    rig.button.set_high();
    sleep(SETTLE).await;
    rig.button.set_low();
    sleep(Duration::from_secs(6)).await;

    assert_eq!(rig.unlock.activation_count(), 1);
    assert_eq!(presses.try_recv().as_deref(), Ok("pressed"));
    assert_eq!(presses.try_recv().as_deref(), Ok("released"));
}

#[tokio::test(start_paused = true)]
async fn held_exit_closes_into_an_auto_lock() {
    let rig = Rig::start().await;

    // Walk out with the bolt open and press the button on the way.
    rig.frame.set_high();
    sleep(SETTLE).await;
    rig.button.set_high();
    sleep(SETTLE).await;
    rig.button.set_low();
    sleep(Duration::from_secs(30)).await;

    rig.frame.set_low();
    sleep(Duration::from_secs(4)).await;

    assert_eq!(rig.lock.activation_count(), 1, "locked after the grace period");
}

#[tokio::test(start_paused = true)]
async fn stale_button_press_does_not_auto_lock() {
    let rig = Rig::start().await;

    rig.frame.set_high();
    sleep(SETTLE).await;
    rig.button.set_high();
    sleep(SETTLE).await;
    rig.button.set_low();
    sleep(Duration::from_secs(61)).await;

    rig.frame.set_low();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(rig.lock.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn reopening_cancels_an_armed_auto_lock() {
    let rig = Rig::start().await;

    // Press with the door still closed and the bolt open: arms the window.
    rig.button.set_high();
    sleep(SETTLE).await;
    rig.button.set_low();
    sleep(SETTLE).await;

    rig.frame.set_high();
    sleep(SETTLE).await;
    rig.frame.set_low();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(rig.lock.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn door_reopened_during_grace_abandons_the_auto_lock() {
    let rig = Rig::start().await;

    rig.frame.set_high();
    sleep(SETTLE).await;
    rig.button.set_high();
    sleep(SETTLE).await;
    rig.button.set_low();
    sleep(SETTLE).await;
    rig.frame.set_low();

    // Reopen inside the three-second grace period.
    sleep(Duration::from_secs(1)).await;
    rig.frame.set_high();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(rig.lock.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_space_past_the_threshold_triggers_the_emergency_lock() {
    let rig = Rig::start().await;
    let mut alarms = rig.bus.subscribe(TOPIC_ALARM);

    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(920)).await;

    assert_eq!(rig.lock.activation_count(), 1);
    assert!(alarms.try_recv().is_ok(), "alarm announced before locking");

    // The timer is cleared once acted upon; no repeat lock.
    sleep(Duration::from_secs(1000)).await;
    assert_eq!(rig.lock.activation_count(), 1);
    assert!(alarms.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn zero_republish_does_not_restart_the_window() {
    let rig = Rig::start().await;

    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(500)).await;
    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(450)).await;

    assert_eq!(rig.lock.activation_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn repopulated_space_clears_the_emergency_window() {
    let rig = Rig::start().await;
    let mut alarms = rig.bus.subscribe(TOPIC_ALARM);

    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(500)).await;
    rig.bus.publish(TOPIC_OCCUPANTS, "3").await;
    sleep(Duration::from_secs(600)).await;

    assert_eq!(rig.lock.activation_count(), 0);
    assert!(alarms.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn malformed_occupancy_payload_is_ignored() {
    let rig = Rig::start().await;

    rig.bus.publish(TOPIC_OCCUPANTS, "banana").await;
    sleep(Duration::from_secs(950)).await;

    assert_eq!(rig.lock.activation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn emergency_lock_waits_for_the_door_to_close() {
    let rig = Rig::start().await;
    let mut alarms = rig.bus.subscribe(TOPIC_ALARM);

    rig.frame.set_high();
    sleep(SETTLE).await;
    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(950)).await;

    assert_eq!(rig.lock.activation_count(), 0);
    assert!(alarms.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn emergency_lock_skips_an_already_locked_bolt() {
    let rig = Rig::start_with(Level::Low, Level::High).await;
    let mut alarms = rig.bus.subscribe(TOPIC_ALARM);

    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(950)).await;

    assert_eq!(rig.lock.activation_count(), 0);
    assert!(alarms.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn unlock_clears_a_running_emergency_window() {
    let rig = Rig::start().await;
    let mut alarms = rig.bus.subscribe(TOPIC_ALARM);

    rig.bus.publish(TOPIC_OCCUPANTS, "0").await;
    sleep(Duration::from_secs(500)).await;
    rig.driver.unlock(Some("alice"), false);
    sleep(Duration::from_secs(500)).await;

    assert_eq!(rig.lock.activation_count(), 0);
    assert!(alarms.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn frame_and_bolt_edges_are_published() {
    let rig = Rig::start().await;
    let mut frames = rig.bus.subscribe(TOPIC_FRAME);
    let mut bolts = rig.bus.subscribe(TOPIC_BOLT);

    rig.frame.set_high();
    rig.bolt.set_high();
    sleep(SETTLE).await;
    rig.frame.set_low();
    rig.bolt.set_low();
    sleep(SETTLE).await;

    assert_eq!(frames.try_recv().as_deref(), Ok("open"));
    assert_eq!(frames.try_recv().as_deref(), Ok("closed"));
    assert_eq!(bolts.try_recv().as_deref(), Ok("locked"));
    assert_eq!(bolts.try_recv().as_deref(), Ok("unlocked"));
    assert!(!rig.driver.is_bolt_locked());
}

#[tokio::test(start_paused = true)]
async fn shutdown_finishes_a_forced_command_first() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), true);
    rig.driver.shutdown().await;

    assert_eq!(rig.unlock.activation_count(), 1);
    assert_eq!(rig.buzzer.history(), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_coalesces_pending_unforced_work() {
    let rig = Rig::start().await;

    rig.driver.unlock(Some("alice"), false);
    rig.driver.shutdown().await;

    assert_eq!(rig.unlock.activation_count(), 0);
}
