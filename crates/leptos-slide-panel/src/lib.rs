//! Leptos Slide Panel
//!
//! Open/close lifecycle for a slide-in detail panel.
//!
//! Opening is two-phase: the payload is mounted with the panel closed, two
//! animation frames pass so the closed state is painted, then the open flag
//! flips and the CSS transition runs. Closing keeps the payload until the
//! transition has finished, then clears it.
//!
//! Every delayed step carries the epoch it was scheduled under. A newer
//! `select` or `close` bumps the epoch, so a late callback from an abandoned
//! transition can never touch the current selection.

use leptos::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Default close transition duration, must match the panel CSS
pub const CLOSE_DELAY_MS: u32 = 200;

/// Frames to wait before starting the open transition
pub const OPEN_FRAMES: u32 = 2;

/// Lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected
    Idle,
    /// Payload mounted, panel still visually closed
    Opening,
    Open,
    /// Sliding out, payload kept for the animation
    Closing,
}

/// What the view renders
#[derive(Clone, Debug, PartialEq)]
pub struct PanelState<T> {
    pub selected: Option<T>,
    pub is_open: bool,
    pub is_closing: bool,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            selected: None,
            is_open: false,
            is_closing: false,
        }
    }
}

/// Stamp for a scheduled transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Epoch(u64);

/// Pure lifecycle state machine
#[derive(Debug)]
pub struct PanelMachine<T> {
    phase: Phase,
    selected: Option<T>,
    epoch: u64,
}

impl<T> Default for PanelMachine<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            selected: None,
            epoch: 0,
        }
    }
}

impl<T: Clone> PanelMachine<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> PanelState<T> {
        PanelState {
            selected: self.selected.clone(),
            is_open: self.phase == Phase::Open,
            is_closing: self.phase == Phase::Closing,
        }
    }

    /// Any phase → Opening. The returned epoch must be passed to
    /// `frames_elapsed` once the closed state has been painted.
    pub fn select(&mut self, record: T) -> Epoch {
        self.epoch += 1;
        self.selected = Some(record);
        self.phase = Phase::Opening;
        Epoch(self.epoch)
    }

    /// Opening → Open, if `epoch` is still current
    pub fn frames_elapsed(&mut self, epoch: Epoch) -> bool {
        if epoch.0 != self.epoch || self.phase != Phase::Opening {
            return false;
        }
        self.phase = Phase::Open;
        true
    }

    /// Open (or still Opening) → Closing. `None` if there is nothing to close.
    pub fn close(&mut self) -> Option<Epoch> {
        match self.phase {
            Phase::Open | Phase::Opening => {
                self.epoch += 1;
                self.phase = Phase::Closing;
                Some(Epoch(self.epoch))
            }
            Phase::Idle | Phase::Closing => None,
        }
    }

    /// Closing → Idle, if `epoch` is still current
    pub fn close_elapsed(&mut self, epoch: Epoch) -> bool {
        if epoch.0 != self.epoch || self.phase != Phase::Closing {
            return false;
        }
        self.phase = Phase::Idle;
        self.selected = None;
        true
    }
}

/// Cooperative deferral primitives
pub trait Scheduler {
    /// Run `f` after `frames` animation frames
    fn after_frames(&self, frames: u32, f: Box<dyn FnOnce()>);
    /// Run `f` after `ms` milliseconds
    fn after_ms(&self, ms: u32, f: Box<dyn FnOnce()>);
}

/// `requestAnimationFrame` and `setTimeout`
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

fn request_frames(frames: u32, f: Box<dyn FnOnce()>) {
    if frames == 0 {
        f();
        return;
    }
    let Some(win) = web_sys::window() else {
        log::warn!("[PANEL] no window, running frame callback immediately");
        f();
        return;
    };
    request_or_run(Box::new(move || request_frames(frames - 1, f)), |next| {
        let cb = Closure::once_into_js(move || next());
        win.request_animation_frame(cb.unchecked_ref()).map(|_| ())
    });
}

/// Hand `f` to `request`. If the request is refused, run `f` right away so
/// the panel cannot stall in `Opening`.
fn request_or_run<E: std::fmt::Debug>(
    f: Box<dyn FnOnce()>,
    request: impl FnOnce(Box<dyn FnOnce()>) -> Result<(), E>,
) {
    let slot = Rc::new(Cell::new(Some(f)));
    let pending = slot.clone();
    let queued: Box<dyn FnOnce()> = Box::new(move || {
        if let Some(f) = pending.take() {
            f();
        }
    });
    if let Err(e) = request(queued) {
        log::warn!("[PANEL] frame request failed ({:?}), running callback now", e);
        if let Some(f) = slot.take() {
            f();
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn after_frames(&self, frames: u32, f: Box<dyn FnOnce()>) {
        request_frames(frames, f);
    }

    fn after_ms(&self, ms: u32, f: Box<dyn FnOnce()>) {
        gloo_timers::callback::Timeout::new(ms, f).forget();
    }
}

struct FrameTask {
    remaining: u32,
    f: Box<dyn FnOnce()>,
}

struct TimerTask {
    due: u64,
    f: Box<dyn FnOnce()>,
}

/// Scheduler driven by hand, for tests and non-browser hosts
#[derive(Default)]
pub struct ManualScheduler {
    frames: RefCell<Vec<FrameTask>>,
    timers: RefCell<Vec<TimerTask>>,
    now: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one animation frame
    pub fn next_frame(&self) {
        let tasks = std::mem::take(&mut *self.frames.borrow_mut());
        let mut ready = Vec::new();
        for mut task in tasks {
            task.remaining -= 1;
            if task.remaining == 0 {
                ready.push(task.f);
            } else {
                self.frames.borrow_mut().push(task);
            }
        }
        for f in ready {
            f();
        }
    }

    /// Move the clock forward, running timers that come due in order
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due_idx = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| t.due)
                    .map(|(i, _)| i);
                due_idx.map(|i| timers.remove(i))
            };
            match next {
                Some(task) => {
                    self.now.set(task.due.max(self.now.get()));
                    (task.f)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }

    /// Callbacks not yet run
    pub fn pending(&self) -> usize {
        self.frames.borrow().len() + self.timers.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn after_frames(&self, frames: u32, f: Box<dyn FnOnce()>) {
        if frames == 0 {
            f();
            return;
        }
        self.frames.borrow_mut().push(FrameTask { remaining: frames, f });
    }

    fn after_ms(&self, ms: u32, f: Box<dyn FnOnce()>) {
        let due = self.now.get() + u64::from(ms);
        self.timers.borrow_mut().push(TimerTask { due, f });
    }
}

/// Drives a `PanelMachine` through a `Scheduler`, publishing each new state
pub struct PanelController<T, S> {
    machine: Rc<RefCell<PanelMachine<T>>>,
    scheduler: Rc<S>,
    close_delay_ms: u32,
    on_change: Rc<dyn Fn(PanelState<T>)>,
}

impl<T, S> Clone for PanelController<T, S> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            scheduler: self.scheduler.clone(),
            close_delay_ms: self.close_delay_ms,
            on_change: self.on_change.clone(),
        }
    }
}

impl<T: Clone + 'static, S: Scheduler + 'static> PanelController<T, S> {
    pub fn new(scheduler: Rc<S>, close_delay_ms: u32, on_change: impl Fn(PanelState<T>) + 'static) -> Self {
        Self {
            machine: Rc::new(RefCell::new(PanelMachine::new())),
            scheduler,
            close_delay_ms,
            on_change: Rc::new(on_change),
        }
    }

    pub fn state(&self) -> PanelState<T> {
        self.machine.borrow().state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.borrow().phase()
    }

    fn publish(&self) {
        let state = self.machine.borrow().state();
        (self.on_change)(state);
    }

    /// Show `record`, collapsing first if another record is on screen
    pub fn select(&self, record: T) {
        let epoch = self.machine.borrow_mut().select(record);
        self.publish();

        let this = self.clone();
        self.scheduler.after_frames(
            OPEN_FRAMES,
            Box::new(move || {
                let opened = this.machine.borrow_mut().frames_elapsed(epoch);
                if opened {
                    this.publish();
                } else {
                    log::debug!("[PANEL] open for {:?} superseded", epoch);
                }
            }),
        );
    }

    /// Slide out, then clear the payload
    pub fn close(&self) {
        let Some(epoch) = self.machine.borrow_mut().close() else {
            return;
        };
        self.publish();

        let this = self.clone();
        self.scheduler.after_ms(
            self.close_delay_ms,
            Box::new(move || {
                let cleared = this.machine.borrow_mut().close_elapsed(epoch);
                if cleared {
                    this.publish();
                } else {
                    log::debug!("[PANEL] clear for {:?} superseded", epoch);
                }
            }),
        );
    }
}

/// Panel handle for components
pub struct SlidePanel<T: Send + Sync + 'static> {
    pub state: ReadSignal<PanelState<T>>,
    controller: StoredValue<PanelController<T, BrowserScheduler>, LocalStorage>,
}

impl<T: Send + Sync + 'static> Clone for SlidePanel<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for SlidePanel<T> {}

impl<T: Clone + Send + Sync + 'static> SlidePanel<T> {
    pub fn select(&self, record: T) {
        self.controller.with_value(|c| c.select(record));
    }

    pub fn close(&self) {
        self.controller.with_value(|c| c.close());
    }
}

/// Create a panel whose state lives in a signal
pub fn use_slide_panel<T: Clone + Send + Sync + 'static>(close_delay_ms: u32) -> SlidePanel<T> {
    let (state, set_state) = signal(PanelState::<T>::default());
    let controller = PanelController::new(Rc::new(BrowserScheduler), close_delay_ms, move |next| {
        set_state.set(next);
    });
    SlidePanel {
        state,
        controller: StoredValue::new_local(controller),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<PanelState<&'static str>>>>;

    fn controller() -> (PanelController<&'static str, ManualScheduler>, Rc<ManualScheduler>, Log) {
        let scheduler = Rc::new(ManualScheduler::new());
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let ctl = PanelController::new(scheduler.clone(), CLOSE_DELAY_MS, move |s| sink.borrow_mut().push(s));
        (ctl, scheduler, log)
    }

    #[test]
    fn test_refused_frame_request_runs_callback() {
        let ran = Rc::new(Cell::new(0));
        let counter = ran.clone();
        request_or_run(Box::new(move || counter.set(counter.get() + 1)), |_queued| Err("no frames"));
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn test_accepted_frame_request_waits_for_frame() {
        let ran = Rc::new(Cell::new(0));
        let counter = ran.clone();
        let held: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
        let holder = held.clone();
        request_or_run(Box::new(move || counter.set(counter.get() + 1)), move |queued| {
            *holder.borrow_mut() = Some(queued);
            Ok::<(), ()>(())
        });
        assert_eq!(ran.get(), 0);

        let frame = held.borrow_mut().take();
        if let Some(frame) = frame {
            frame();
        }
        assert_eq!(ran.get(), 1);
    }

    fn open(selected: &'static str) -> PanelState<&'static str> {
        PanelState { selected: Some(selected), is_open: true, is_closing: false }
    }

    #[test]
    fn test_machine_full_cycle() {
        let mut m = PanelMachine::new();
        assert_eq!(m.phase(), Phase::Idle);

        let e = m.select("a");
        assert_eq!(m.state(), PanelState { selected: Some("a"), is_open: false, is_closing: false });
        assert!(m.frames_elapsed(e));
        assert_eq!(m.state(), open("a"));

        let e = m.close().unwrap();
        assert_eq!(m.state(), PanelState { selected: Some("a"), is_open: false, is_closing: true });
        assert!(m.close_elapsed(e));
        assert_eq!(m.state(), PanelState::default());
    }

    #[test]
    fn test_machine_close_when_idle_is_noop() {
        let mut m = PanelMachine::<&str>::new();
        assert!(m.close().is_none());
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_machine_stale_epochs_ignored() {
        let mut m = PanelMachine::new();
        let open_a = m.select("a");
        m.frames_elapsed(open_a);
        let close_a = m.close().unwrap();
        let open_b = m.select("b");

        assert!(!m.close_elapsed(close_a));
        assert!(!m.frames_elapsed(open_a));
        assert_eq!(m.state().selected, Some("b"));
        assert!(m.frames_elapsed(open_b));
    }

    #[test]
    fn test_open_waits_two_frames() {
        let (ctl, sched, _) = controller();
        ctl.select("a");
        assert_eq!(ctl.phase(), Phase::Opening);

        sched.next_frame();
        assert_eq!(ctl.phase(), Phase::Opening);
        assert!(!ctl.state().is_open);

        sched.next_frame();
        assert_eq!(ctl.state(), open("a"));
    }

    #[test]
    fn test_reselect_before_open_completes() {
        let (ctl, sched, log) = controller();
        ctl.select("a");
        sched.next_frame();
        ctl.select("b");
        sched.next_frame();
        sched.next_frame();
        sched.next_frame();

        assert_eq!(ctl.state(), open("b"));
        // "a" was never shown open
        assert!(log.borrow().iter().all(|s| !(s.is_open && s.selected == Some("a"))));
    }

    #[test]
    fn test_switching_collapses_before_reopening() {
        let (ctl, sched, log) = controller();
        ctl.select("a");
        sched.next_frame();
        sched.next_frame();
        log.borrow_mut().clear();

        ctl.select("b");
        assert_eq!(
            log.borrow()[0],
            PanelState { selected: Some("b"), is_open: false, is_closing: false }
        );
        sched.next_frame();
        sched.next_frame();
        assert_eq!(log.borrow().last(), Some(&open("b")));
    }

    #[test]
    fn test_close_keeps_payload_until_delay() {
        let (ctl, sched, _) = controller();
        ctl.select("a");
        sched.next_frame();
        sched.next_frame();

        ctl.close();
        let state = ctl.state();
        assert!(!state.is_open && state.is_closing);
        assert_eq!(state.selected, Some("a"));

        sched.advance(u64::from(CLOSE_DELAY_MS) - 1);
        assert_eq!(ctl.state().selected, Some("a"));
        sched.advance(1);
        assert_eq!(ctl.state(), PanelState::default());
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[test]
    fn test_stale_close_timer_does_not_clear_new_selection() {
        let (ctl, sched, _) = controller();
        ctl.select("a");
        sched.next_frame();
        sched.next_frame();

        ctl.close();
        sched.advance(100);
        ctl.select("b");
        sched.next_frame();
        // Old clear timer fires after the new panel is open
        sched.advance(500);
        sched.next_frame();

        assert_eq!(ctl.state(), open("b"));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_close_during_opening_cancels_open() {
        let (ctl, sched, _) = controller();
        ctl.select("a");
        sched.next_frame();
        ctl.close();
        sched.next_frame();
        assert!(!ctl.state().is_open);

        sched.advance(u64::from(CLOSE_DELAY_MS));
        assert_eq!(ctl.state(), PanelState::default());
    }

    #[test]
    fn test_double_close_single_clear() {
        let (ctl, sched, log) = controller();
        ctl.select("a");
        sched.next_frame();
        sched.next_frame();
        ctl.close();
        ctl.close();
        assert_eq!(sched.pending(), 1);
        sched.advance(u64::from(CLOSE_DELAY_MS));
        assert_eq!(log.borrow().last(), Some(&PanelState::default()));
    }
}
