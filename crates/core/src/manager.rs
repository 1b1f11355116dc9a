//! Device manager: connection lifecycle, push-to-talk, swipes and keep-awake.
//!
//! All state and the owned [`AccessorySession`] sit behind one lock that
//! every public operation holds for its full duration, settle delays
//! included. A gesture in flight therefore blocks health checks and new
//! presses until it completes.
//!
//! PTT uses the system-control HID (power-down while active, release when
//! done). A press shorter than [`TOGGLE_THRESHOLD`] toggles; a longer hold
//! is active exactly for the hold duration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::descriptor::DescriptorType;
use crate::error::{Error, Result};
use crate::report::{touch_report, SystemControl};
use crate::session::AccessorySession;
use crate::transport::AccessoryConnector;

/// Accessory discovery / health-check cadence.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Keep-awake cadence; beats the accessory's 30 s auto-sleep.
pub const KEEP_AWAKE_INTERVAL: Duration = Duration::from_secs(25);
/// Presses shorter than this toggle PTT; longer ones hold it.
pub const TOGGLE_THRESHOLD: Duration = Duration::from_millis(300);

const WAKE_PRESS: Duration = Duration::from_millis(50);
const WAKE_SETTLE: Duration = Duration::from_millis(100);
const KEEP_AWAKE_WAKE_SETTLE: Duration = Duration::from_millis(150);
const KEEP_AWAKE_TAP_HOLD: Duration = Duration::from_millis(30);
const SWIPE_STEP_DELAY: Duration = Duration::from_millis(25);
const SWIPE_STEPS: u32 = 8;

/// Swipe row, close to the bottom edge.
pub const SWIPE_Y: u16 = 32590;
/// Keep-awake tap position (bottom-right corner).
pub const KEEP_AWAKE_TAP: (u16, u16) = (32590, 32590);

const EVENT_CAPACITY: usize = 16;

/// Connection / PTT state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    PttActive,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::PttActive => "ptt_active",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a swipe gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// Start and end X of the sweep.
    pub fn endpoints(&self) -> (u16, u16) {
        match self {
            Self::Left => (27000, 5000),
            Self::Right => (5000, 27000),
        }
    }

    /// X positions of the touch-down reports, first to last.
    pub fn points(&self) -> Vec<u16> {
        let (start, end) = self.endpoints();
        (0..=SWIPE_STEPS)
            .map(|step| interpolate(start, end, step))
            .collect()
    }
}

fn interpolate(start: u16, end: u16, step: u32) -> u16 {
    let start = i64::from(start);
    let delta = i64::from(end) - start;
    (start + delta * i64::from(step) / i64::from(SWIPE_STEPS)) as u16
}

/// Keep-awake watchdog settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepAwake {
    pub enabled: bool,
    /// Idle minutes after which the accessory may sleep; 0 = never.
    pub sleep_after_minutes: u32,
}

impl KeepAwake {
    /// Idle threshold, or `None` when the accessory should never sleep.
    pub fn idle_limit(&self) -> Option<Duration> {
        (self.sleep_after_minutes > 0)
            .then(|| Duration::from_secs(u64::from(self.sleep_after_minutes) * 60))
    }
}

impl Default for KeepAwake {
    fn default() -> Self {
        Self {
            enabled: true,
            sleep_after_minutes: 60,
        }
    }
}

/// Read-only snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub state: ConnectionState,
    pub ptt_toggled: bool,
    pub keep_awake: KeepAwake,
    pub sleeping: bool,
    pub next_swipe: SwipeDirection,
    pub serial: Option<String>,
}

/// An open session plus the two HID ids the manager drives.
struct Link {
    session: AccessorySession,
    ptt_id: u16,
    touch_id: u16,
}

struct Inner {
    link: Option<Link>,
    state: ConnectionState,
    ptt_toggled: bool,
    ptt_pressed_at: Option<Instant>,
    swipe_left: bool,
    keep_awake: KeepAwake,
    last_activity: Instant,
    sleeping: bool,
}

/// Owns the accessory connection and serializes every operation on it.
pub struct DeviceManager {
    inner: Mutex<Inner>,
    connector: Arc<dyn AccessoryConnector>,
    clock: Arc<dyn Clock>,
    serial: String,
    events: broadcast::Sender<ConnectionState>,
}

impl DeviceManager {
    /// Create a disconnected manager. `serial` filters accessories; empty
    /// accepts the first one found.
    pub fn new(
        connector: Arc<dyn AccessoryConnector>,
        clock: Arc<dyn Clock>,
        serial: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let now = clock.now();
        Self {
            inner: Mutex::new(Inner {
                link: None,
                state: ConnectionState::Disconnected,
                ptt_toggled: false,
                ptt_pressed_at: None,
                swipe_left: true,
                keep_awake: KeepAwake::default(),
                last_activity: now,
                sleeping: false,
            }),
            connector,
            clock,
            serial: serial.into(),
            events,
        }
    }

    /// Receive every state transition. Sending never blocks the manager;
    /// a lagging receiver skips intermediate values.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionState> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn status(&self) -> Status {
        let inner = self.inner.lock();
        Status {
            state: inner.state,
            ptt_toggled: inner.ptt_toggled,
            keep_awake: inner.keep_awake,
            sleeping: inner.sleeping,
            next_swipe: if inner.swipe_left {
                SwipeDirection::Left
            } else {
                SwipeDirection::Right
            },
            serial: inner
                .link
                .as_ref()
                .and_then(|l| l.session.serial().map(str::to_string)),
        }
    }

    /// Apply keep-awake settings. Takes effect on the next watchdog tick
    /// and restarts the idle timer.
    pub fn set_keep_awake(&self, settings: KeepAwake) {
        let mut inner = self.inner.lock();
        inner.keep_awake = settings;
        inner.last_activity = self.clock.now();
        inner.sleeping = false;
        info!(
            enabled = settings.enabled,
            sleep_after_minutes = settings.sleep_after_minutes,
            "Keep-awake updated"
        );
    }

    /// One poll tick: connect when disconnected, otherwise health-check.
    pub fn poll(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner.state != ConnectionState::Disconnected {
            self.health_check(inner);
            return;
        }

        match self.connect(inner) {
            Ok(()) => self.keep_awake_nudge(inner),
            Err(Error::NotFound(reason)) => debug!(%reason, "Accessory not found, will retry"),
            Err(e) => warn!(error = %e, "Connect attempt failed, will retry"),
        }
    }

    /// One keep-awake watchdog tick. Never surfaces errors.
    pub fn keep_awake_tick(&self) {
        let mut guard = self.inner.lock();
        self.keep_awake_nudge(&mut guard);
    }

    /// PTT hotkey pressed.
    pub fn ptt_down(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(link) = inner.link.as_ref() else {
            return Err(Error::NotConnected);
        };

        let now = self.clock.now();
        inner.ptt_pressed_at = Some(now);
        inner.last_activity = now;
        inner.sleeping = false;

        if inner.ptt_toggled {
            debug!("PTT already toggled on");
            return Ok(());
        }

        self.wake(link, WAKE_SETTLE);

        if let Err(e) = link
            .session
            .send_report_to(link.ptt_id, &SystemControl::PowerDown.report())
        {
            self.drop_link(inner, &e);
            return Err(e);
        }

        self.set_state(inner, ConnectionState::PttActive);
        Ok(())
    }

    /// PTT hotkey released.
    pub fn ptt_up(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(link) = inner.link.as_ref() else {
            return Err(Error::NotConnected);
        };

        let held = inner
            .ptt_pressed_at
            .map(|at| self.clock.now().saturating_duration_since(at))
            .unwrap_or(Duration::MAX);

        if held < TOGGLE_THRESHOLD && !inner.ptt_toggled {
            if inner.state == ConnectionState::PttActive {
                inner.ptt_toggled = true;
                debug!(held_ms = held.as_millis() as u64, "PTT toggled on");
            }
            return Ok(());
        }

        inner.ptt_toggled = false;
        if let Err(e) = link
            .session
            .send_report_to(link.ptt_id, &SystemControl::Release.report())
        {
            self.drop_link(inner, &e);
            return Err(e);
        }

        debug!(held_ms = held.as_millis() as u64, "PTT released");
        self.set_state(inner, ConnectionState::Connected);
        Ok(())
    }

    /// Emit one swipe gesture, alternating left and right starting with left.
    ///
    /// The direction flips once the gesture is attempted, so a failed swipe
    /// still consumes its turn.
    pub fn swipe(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(link) = inner.link.as_ref() else {
            return Err(Error::NotConnected);
        };

        inner.last_activity = self.clock.now();
        inner.sleeping = false;

        self.wake(link, WAKE_SETTLE);

        let direction = if inner.swipe_left {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        inner.swipe_left = !inner.swipe_left;

        if let Err(e) = self.send_swipe(link, direction) {
            self.drop_link(inner, &e);
            return Err(e);
        }

        info!(?direction, "Swipe sent");
        Ok(())
    }

    /// Shut down: release PTT if held, tear the session down.
    pub fn close(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(link) = inner.link.take() {
            if inner.state == ConnectionState::PttActive {
                if let Err(e) = link
                    .session
                    .send_report_to(link.ptt_id, &SystemControl::Release.report())
                {
                    warn!(error = %e, "Failed to release PTT during shutdown");
                }
            }
            link.session.close();
        }
        inner.ptt_toggled = false;
        inner.sleeping = false;
        self.set_state(inner, ConnectionState::Disconnected);
    }

    /// Poll and keep-awake loop. Returns once `cancel` fires; an operation
    /// already in flight runs to completion first.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut poll = tokio::time::interval(POLL_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut keep_awake = tokio::time::interval_at(
            tokio::time::Instant::now() + KEEP_AWAKE_INTERVAL,
            KEEP_AWAKE_INTERVAL,
        );
        keep_awake.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(serial = %self.serial, "Device manager started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = poll.tick() => self.run_blocking(Self::poll).await,
                _ = keep_awake.tick() => self.run_blocking(Self::keep_awake_tick).await,
            }
        }
        info!("Device manager stopped");
    }

    async fn run_blocking(self: &Arc<Self>, op: fn(&DeviceManager)) {
        let manager = Arc::clone(self);
        if let Err(e) = tokio::task::spawn_blocking(move || op(&manager)).await {
            warn!(error = %e, "Device manager task failed");
        }
    }

    fn connect(&self, inner: &mut Inner) -> Result<()> {
        let mut session =
            AccessorySession::open(self.connector.as_ref(), &self.serial, Arc::clone(&self.clock))?;

        let ptt_id = match session.register_descriptor(DescriptorType::SystemControl) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "PTT HID registration failed");
                session.close();
                return Err(e);
            }
        };
        let touch_id = match session.register_descriptor(DescriptorType::TouchScreen) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Touch HID registration failed");
                session.close();
                return Err(e);
            }
        };

        info!(
            serial = session.serial().unwrap_or("-"),
            ptt_id, touch_id, "R1 connected"
        );
        inner.link = Some(Link {
            session,
            ptt_id,
            touch_id,
        });
        inner.ptt_toggled = false;
        inner.last_activity = self.clock.now();
        inner.sleeping = false;
        self.set_state(inner, ConnectionState::Connected);
        Ok(())
    }

    fn health_check(&self, inner: &mut Inner) {
        let Some(link) = inner.link.as_ref() else {
            return;
        };
        if let Err(e) = link.session.ping() {
            info!(error = %e, "R1 disconnected");
            self.drop_link(inner, &e);
        }
    }

    /// Wake nudge plus a synthetic tap; a wake signal alone does not reset
    /// the accessory's own idle countdown.
    fn keep_awake_nudge(&self, inner: &mut Inner) {
        if inner.state != ConnectionState::Connected || !inner.keep_awake.enabled {
            return;
        }
        let Some(link) = inner.link.as_ref() else {
            return;
        };

        if let Some(limit) = inner.keep_awake.idle_limit() {
            let idle = self
                .clock
                .now()
                .saturating_duration_since(inner.last_activity);
            if idle >= limit {
                if !inner.sleeping {
                    inner.sleeping = true;
                    info!(
                        idle_minutes = limit.as_secs() / 60,
                        "Idle limit reached, letting the R1 sleep"
                    );
                }
                return;
            }
        }

        self.wake(link, KEEP_AWAKE_WAKE_SETTLE);

        let (x, y) = KEEP_AWAKE_TAP;
        if let Err(e) = link
            .session
            .send_report_to(link.touch_id, &touch_report(true, x, y))
        {
            debug!(error = %e, "Keep-awake touch failed");
        }
        self.clock.sleep(KEEP_AWAKE_TAP_HOLD);
        if let Err(e) = link
            .session
            .send_report_to(link.touch_id, &touch_report(false, x, y))
        {
            debug!(error = %e, "Keep-awake lift failed");
        }
    }

    /// Best-effort wake-up press on the PTT channel.
    fn wake(&self, link: &Link, settle: Duration) {
        if let Err(e) = link
            .session
            .send_report_to(link.ptt_id, &SystemControl::WakeUp.report())
        {
            debug!(error = %e, "Wake press failed");
            return;
        }
        self.clock.sleep(WAKE_PRESS);
        if let Err(e) = link
            .session
            .send_report_to(link.ptt_id, &SystemControl::Release.report())
        {
            debug!(error = %e, "Wake release failed");
        }
        self.clock.sleep(settle);
    }

    fn send_swipe(&self, link: &Link, direction: SwipeDirection) -> Result<()> {
        let points = direction.points();
        let last = points.len() - 1;
        for (step, &x) in points.iter().enumerate() {
            link.session
                .send_report_to(link.touch_id, &touch_report(true, x, SWIPE_Y))
                .map_err(|e| Error::Transfer(format!("swipe step {step}: {e}")))?;
            if step < last {
                self.clock.sleep(SWIPE_STEP_DELAY);
            }
        }

        let (_, end) = direction.endpoints();
        link.session
            .send_report_to(link.touch_id, &touch_report(false, end, SWIPE_Y))
            .map_err(|e| Error::Transfer(format!("swipe lift: {e}")))
    }

    /// Tear down after a failed transfer or ping and go Disconnected.
    fn drop_link(&self, inner: &mut Inner, cause: &Error) {
        warn!(error = %cause, "USB error, will reconnect");
        if let Some(link) = inner.link.take() {
            link.session.close();
        }
        inner.ptt_toggled = false;
        inner.sleeping = false;
        self.set_state(inner, ConnectionState::Disconnected);
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        if inner.state == state {
            return;
        }
        inner.state = state;
        info!(%state, "Device state changed");
        // Err only means nobody is subscribed.
        let _ = self.events.send(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aoa::requests;
    use crate::clock::mock::ManualClock;
    use crate::transport::mock::MockBus;

    const PTT: u16 = 1;
    const TOUCH: u16 = 2;

    fn manager_on(bus: &Arc<MockBus>) -> (Arc<DeviceManager>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let manager = Arc::new(DeviceManager::new(bus.clone(), clock.clone(), ""));
        (manager, clock)
    }

    /// A connected manager with the connect-time traffic cleared.
    fn connected() -> (Arc<DeviceManager>, Arc<MockBus>, Arc<ManualClock>) {
        let bus = Arc::new(MockBus::new());
        let (manager, clock) = manager_on(&bus);
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Connected);
        bus.clear_log();
        (manager, bus, clock)
    }

    fn wake_then(report: u8) -> Vec<Vec<u8>> {
        vec![vec![3], vec![0], vec![report]]
    }

    #[test]
    fn poll_connects_and_registers_ptt_then_touch() {
        let bus = Arc::new(MockBus::new());
        let (manager, _clock) = manager_on(&bus);
        let mut events = manager.subscribe();

        manager.poll();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(events.try_recv().unwrap(), ConnectionState::Connected);
        let registers: Vec<(u16, u16)> = bus
            .sent()
            .iter()
            .filter(|r| r.request == requests::REGISTER_HID)
            .map(|r| (r.value, r.index))
            .collect();
        assert_eq!(
            registers,
            vec![
                (PTT, DescriptorType::SystemControl.bytes().len() as u16),
                (TOUCH, DescriptorType::TouchScreen.bytes().len() as u16),
            ]
        );
    }

    #[test]
    fn connect_immediately_nudges_keep_awake() {
        let bus = Arc::new(MockBus::new());
        let (manager, _clock) = manager_on(&bus);
        manager.poll();
        assert_eq!(bus.events_for(PTT), vec![vec![3], vec![0]]);
        assert_eq!(bus.events_for(TOUCH).len(), 2);
    }

    #[test]
    fn poll_on_empty_bus_stays_disconnected() {
        let bus = Arc::new(MockBus::empty());
        let (manager, _clock) = manager_on(&bus);
        manager.poll();
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn registration_failure_aborts_connect() {
        let bus = Arc::new(MockBus::new());
        let (manager, _clock) = manager_on(&bus);
        let mut events = manager.subscribe();
        bus.fail_request(requests::SET_HID_REPORT_DESC);

        manager.poll();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(events.try_recv().is_err());

        bus.clear_failures();
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(bus.opens(), 2);
    }

    #[test]
    fn connected_poll_pings_instead_of_reopening() {
        let (manager, bus, _clock) = connected();
        manager.poll();
        manager.poll();
        assert_eq!(bus.opens(), 1);
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn failed_health_check_disconnects_and_clears_toggle() {
        let (manager, bus, _clock) = connected();
        manager.ptt_down().unwrap();
        manager.ptt_up().unwrap();
        assert!(manager.status().ptt_toggled);

        let mut events = manager.subscribe();
        bus.set_ping_fails(true);
        manager.poll();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.status().ptt_toggled);
        assert_eq!(events.try_recv().unwrap(), ConnectionState::Disconnected);
    }

    #[test]
    fn reconnects_after_unplug() {
        let (manager, bus, _clock) = connected();
        bus.unplug();
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        bus.plug();
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(bus.opens(), 2);
    }

    #[test]
    fn short_press_toggles_on_and_second_short_press_toggles_off() {
        let (manager, bus, _clock) = connected();

        manager.ptt_down().unwrap();
        assert_eq!(manager.state(), ConnectionState::PttActive);
        manager.ptt_up().unwrap();
        assert_eq!(manager.state(), ConnectionState::PttActive);
        assert!(manager.status().ptt_toggled);
        assert_eq!(bus.events_for(PTT), wake_then(1));

        bus.clear_log();
        manager.ptt_down().unwrap();
        assert!(bus.sent().is_empty());
        manager.ptt_up().unwrap();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(!manager.status().ptt_toggled);
        assert_eq!(bus.events_for(PTT), vec![vec![0]]);
    }

    #[test]
    fn long_hold_releases_on_key_up() {
        let (manager, bus, clock) = connected();
        manager.ptt_down().unwrap();
        clock.advance(Duration::from_millis(500));
        manager.ptt_up().unwrap();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(!manager.status().ptt_toggled);
        let mut expected = wake_then(1);
        expected.push(vec![0]);
        assert_eq!(bus.events_for(PTT), expected);
    }

    #[test]
    fn long_hold_releases_even_when_toggled() {
        let (manager, _bus, clock) = connected();
        manager.ptt_down().unwrap();
        manager.ptt_up().unwrap();
        assert!(manager.status().ptt_toggled);

        manager.ptt_down().unwrap();
        clock.advance(TOGGLE_THRESHOLD);
        manager.ptt_up().unwrap();

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(!manager.status().ptt_toggled);
    }

    #[test]
    fn ptt_transfer_failure_disconnects_and_returns_error() {
        let (manager, bus, _clock) = connected();
        let mut events = manager.subscribe();
        // wake press + wake release succeed, power-down fails
        bus.fail_after(2);

        assert!(manager.ptt_down().is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(events.try_recv().unwrap(), ConnectionState::Disconnected);
        assert!(matches!(manager.ptt_up(), Err(Error::NotConnected)));
    }

    #[test]
    fn operations_while_disconnected_fail_without_traffic() {
        let bus = Arc::new(MockBus::empty());
        let (manager, _clock) = manager_on(&bus);
        assert!(matches!(manager.ptt_down(), Err(Error::NotConnected)));
        assert!(matches!(manager.ptt_up(), Err(Error::NotConnected)));
        assert!(matches!(manager.swipe(), Err(Error::NotConnected)));
        assert_eq!(manager.status().next_swipe, SwipeDirection::Left);
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn swipe_points_interpolate_in_eight_steps() {
        assert_eq!(
            SwipeDirection::Left.points(),
            vec![27000, 24250, 21500, 18750, 16000, 13250, 10500, 7750, 5000]
        );
        assert_eq!(
            SwipeDirection::Right.points(),
            vec![5000, 7750, 10500, 13250, 16000, 18750, 21500, 24250, 27000]
        );
    }

    #[test]
    fn swipe_sends_nine_touches_and_a_lift() {
        let (manager, bus, clock) = connected();
        let before = clock.slept();
        manager.swipe().unwrap();

        let touches = bus.events_for(TOUCH);
        assert_eq!(touches.len(), 10);
        for (report, x) in touches.iter().zip(SwipeDirection::Left.points()) {
            assert_eq!(report[..], touch_report(true, x, SWIPE_Y));
        }
        assert_eq!(touches[9][..], touch_report(false, 5000, SWIPE_Y));
        assert_eq!(bus.events_for(PTT), vec![vec![3], vec![0]]);
        assert_eq!(
            clock.slept() - before,
            WAKE_PRESS + WAKE_SETTLE + SWIPE_STEP_DELAY * SWIPE_STEPS
        );
    }

    #[test]
    fn swipes_alternate_starting_left() {
        let (manager, bus, _clock) = connected();
        let mut starts = Vec::new();
        for _ in 0..4 {
            bus.clear_log();
            manager.swipe().unwrap();
            let first = bus.events_for(TOUCH)[0].clone();
            starts.push(u16::from_le_bytes([first[1], first[2]]));
        }
        assert_eq!(starts, vec![27000, 5000, 27000, 5000]);
    }

    #[test]
    fn failed_swipe_still_flips_direction() {
        let (manager, bus, _clock) = connected();
        // wake pair succeeds, first touch fails
        bus.fail_after(2);
        assert!(manager.swipe().is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        bus.clear_failures();
        manager.poll();
        assert_eq!(manager.state(), ConnectionState::Connected);
        bus.clear_log();

        manager.swipe().unwrap();
        let first = bus.events_for(TOUCH)[0].clone();
        assert_eq!(u16::from_le_bytes([first[1], first[2]]), 5000);
    }

    #[test]
    fn keep_awake_nudge_wakes_then_taps_corner() {
        let (manager, bus, clock) = connected();
        let before = clock.slept();
        manager.keep_awake_tick();

        assert_eq!(bus.events_for(PTT), vec![vec![3], vec![0]]);
        let (x, y) = KEEP_AWAKE_TAP;
        assert_eq!(
            bus.events_for(TOUCH),
            vec![
                touch_report(true, x, y).to_vec(),
                touch_report(false, x, y).to_vec()
            ]
        );
        assert_eq!(
            clock.slept() - before,
            WAKE_PRESS + KEEP_AWAKE_WAKE_SETTLE + KEEP_AWAKE_TAP_HOLD
        );
    }

    #[test]
    fn keep_awake_is_silent_while_ptt_active() {
        let (manager, bus, _clock) = connected();
        manager.ptt_down().unwrap();
        bus.clear_log();
        manager.keep_awake_tick();
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn keep_awake_is_silent_when_disabled() {
        let (manager, bus, _clock) = connected();
        manager.set_keep_awake(KeepAwake {
            enabled: false,
            sleep_after_minutes: 60,
        });
        manager.keep_awake_tick();
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn keep_awake_is_silent_when_disconnected() {
        let bus = Arc::new(MockBus::empty());
        let (manager, _clock) = manager_on(&bus);
        manager.keep_awake_tick();
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn idle_limit_lets_device_sleep_until_activity() {
        let (manager, bus, clock) = connected();
        manager.set_keep_awake(KeepAwake {
            enabled: true,
            sleep_after_minutes: 60,
        });
        clock.advance(Duration::from_secs(61 * 60));

        manager.keep_awake_tick();
        manager.keep_awake_tick();
        assert!(bus.sent().is_empty());
        assert!(manager.status().sleeping);

        manager.swipe().unwrap();
        assert!(!manager.status().sleeping);
        bus.clear_log();
        manager.keep_awake_tick();
        assert_eq!(bus.events_for(TOUCH).len(), 2);
    }

    #[test]
    fn idle_limit_boundary_is_inclusive() {
        let (manager, bus, clock) = connected();
        manager.set_keep_awake(KeepAwake {
            enabled: true,
            sleep_after_minutes: 30,
        });
        clock.advance(Duration::from_secs(30 * 60));
        manager.keep_awake_tick();
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn zero_threshold_never_sleeps() {
        let (manager, bus, clock) = connected();
        manager.set_keep_awake(KeepAwake {
            enabled: true,
            sleep_after_minutes: 0,
        });
        clock.advance(Duration::from_secs(10 * 3600));
        manager.keep_awake_tick();
        assert!(!manager.status().sleeping);
        assert_eq!(bus.events_for(TOUCH).len(), 2);
    }

    #[test]
    fn settings_change_clears_sleeping() {
        let (manager, _bus, clock) = connected();
        clock.advance(Duration::from_secs(2 * 3600));
        manager.keep_awake_tick();
        assert!(manager.status().sleeping);

        manager.set_keep_awake(KeepAwake::default());
        assert!(!manager.status().sleeping);
    }

    #[test]
    fn keep_awake_failures_are_swallowed() {
        let (manager, bus, _clock) = connected();
        bus.fail_request(requests::SEND_HID_EVENT);
        manager.keep_awake_tick();
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn close_releases_active_ptt_and_unregisters() {
        let (manager, bus, _clock) = connected();
        manager.ptt_down().unwrap();
        bus.clear_log();

        manager.close();

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        let sent = bus.sent();
        assert_eq!(sent[0].request, requests::SEND_HID_EVENT);
        assert_eq!(sent[0].data, vec![0]);
        let unregistered: Vec<u16> = sent
            .iter()
            .filter(|r| r.request == requests::UNREGISTER_HID)
            .map(|r| r.value)
            .collect();
        assert_eq!(unregistered, vec![TOUCH, PTT]);
    }

    #[test]
    fn status_reports_serial_when_connected() {
        let (manager, _bus, _clock) = connected();
        let status = manager.status();
        assert_eq!(status.serial.as_deref(), Some("R1MOCK0001"));
        assert_eq!(status.keep_awake, KeepAwake::default());
    }

    #[test]
    fn state_display_strings() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::PttActive.to_string(), "ptt_active");
    }

    #[tokio::test]
    async fn run_connects_and_stops_on_cancel() {
        let bus = Arc::new(MockBus::new());
        let (manager, _clock) = manager_on(&bus);
        let mut events = manager.subscribe();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(Arc::clone(&manager).run(cancel.clone()));
        assert_eq!(events.recv().await.unwrap(), ConnectionState::Connected);

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(bus.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_retrying_on_empty_bus() {
        let bus = Arc::new(MockBus::empty());
        let (manager, _clock) = manager_on(&bus);
        let mut events = manager.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&manager).run(cancel.clone()));

        tokio::time::sleep(POLL_INTERVAL * 3).await;
        bus.plug();
        assert_eq!(events.recv().await.unwrap(), ConnectionState::Connected);

        cancel.cancel();
        task.await.unwrap();
    }
}
