use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::difficulty::Difficulty;
use crate::feedback::{Cue, Feedback, Silent};
use crate::scheduler::DelayScheduler;
use crate::scoring::{is_new_best, Scorer, DEFAULT_EARLY_PENALTY};
use crate::session::{ClockTick, SessionClock, SessionConfig, SessionState};
use crate::summary::SessionSummary;

pub const COUNTDOWN_STEP_MS: u64 = 1_000;
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;
pub const DEFAULT_NEXT_ROUND_DELAY_MS: u64 = 700;
pub const READY_VIBRATION_MS: u64 = 120;
pub const EARLY_VIBRATION_MS: u64 = 60;

pub const WELCOME_MESSAGE: &str = "Click START to begin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    EarlyClick,
    OnTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Countdown,
    Waiting,
    Ready,
    Resolved(Outcome),
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelShape {
    Square,
    Circle,
    Diamond,
}

const SHAPES: [PanelShape; 3] = [PanelShape::Square, PanelShape::Circle, PanelShape::Diamond];

/// Outcome of one resolved round. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// None iff the click came early
    pub reaction_ms: Option<u64>,
    pub outcome: Outcome,
    pub difficulty: Difficulty,
    /// Points awarded, or the penalty as a negative number
    pub points: i64,
    pub timestamp: DateTime<Local>,
}

/// What a front end needs to draw the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSnapshot {
    pub phase: RoundPhase,
    pub message: String,
    pub countdown: u32,
    pub reaction_ms: Option<u64>,
    pub shape: PanelShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Phase(PhaseSnapshot),
    RoundResolved(RoundResult),
    NewBest(u64),
    SessionTick { seconds_remaining: u32 },
    SessionEnded(SessionSummary),
}

pub type Listener = Box<dyn FnMut(&EngineEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub session: SessionConfig,
    pub countdown_secs: u32,
    pub next_round_delay_ms: u64,
    pub early_penalty: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            next_round_delay_ms: DEFAULT_NEXT_ROUND_DELAY_MS,
            early_penalty: DEFAULT_EARLY_PENALTY,
        }
    }
}

/// Deferred work owned by the scheduler slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    CountdownStep,
    BecomeReady,
    NextRound,
}

/// The round engine: phase machine, delay scheduler, session clock and scorer.
///
/// Everything runs on the caller's thread. The caller drives time by calling
/// [`Engine::tick`] regularly and forwards panel input to [`Engine::on_click`].
pub struct Engine<C: Clock> {
    config: EngineConfig,
    clock: C,
    phase: RoundPhase,
    message: String,
    countdown: u32,
    shape: PanelShape,
    difficulty: Difficulty,
    ready_at_ms: Option<u64>,
    last_reaction_ms: Option<u64>,
    best_ms: Option<u64>,
    scheduler: DelayScheduler<Deferred>,
    session: SessionClock,
    session_active: bool,
    resume_session: bool,
    scorer: Scorer,
    results: Vec<RoundResult>,
    shape_rng: StdRng,
    feedback: Box<dyn Feedback>,
    muted: bool,
    listeners: Vec<Listener>,
}

impl<C: Clock> Engine<C> {
    pub fn new(config: EngineConfig, clock: C) -> Self {
        Self::build(
            config,
            clock,
            DelayScheduler::from_entropy(),
            StdRng::from_entropy(),
        )
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(config: EngineConfig, clock: C, seed: u64) -> Self {
        Self::build(
            config,
            clock,
            DelayScheduler::seeded(seed),
            StdRng::seed_from_u64(seed.rotate_left(17)),
        )
    }

    fn build(
        config: EngineConfig,
        clock: C,
        scheduler: DelayScheduler<Deferred>,
        shape_rng: StdRng,
    ) -> Self {
        Self {
            phase: RoundPhase::Idle,
            message: WELCOME_MESSAGE.to_string(),
            countdown: config.countdown_secs,
            shape: PanelShape::Square,
            difficulty: config.session.difficulty,
            ready_at_ms: None,
            last_reaction_ms: None,
            best_ms: None,
            scheduler,
            session: SessionClock::new(config.session.duration_secs),
            session_active: false,
            resume_session: false,
            scorer: Scorer::new(config.early_penalty),
            results: Vec::new(),
            shape_rng,
            feedback: Box::new(Silent),
            muted: false,
            listeners: Vec::new(),
            config,
            clock,
        }
    }

    /// Cancels all pending work and drops every listener.
    pub fn destroy(mut self) {
        self.scheduler.cancel_pending();
        self.session.stop();
        self.listeners.clear();
        log::debug!("engine destroyed in phase {:?}", self.phase);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_feedback(&mut self, feedback: Box<dyn Feedback>) {
        self.feedback = feedback;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Applies from the next armed wait.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Seeds the best time known to the caller's records.
    pub fn set_best_time(&mut self, best_ms: Option<u64>) {
        self.best_ms = best_ms;
    }

    // --- session lifecycle ---

    pub fn start_session(&mut self, config: SessionConfig) {
        self.scheduler.cancel_pending();
        self.difficulty = config.difficulty;
        self.session.set_duration(config.duration_secs);
        self.session.start(self.clock.now_ms());
        self.session_active = true;
        self.resume_session = false;
        self.results.clear();
        log::info!(
            "session started: {}s at {}",
            config.duration_secs,
            config.difficulty
        );

        self.phase = RoundPhase::Idle;
        self.start_round();
    }

    pub fn end_session(&mut self) {
        self.scheduler.cancel_pending();
        self.session.stop();
        self.phase = RoundPhase::Idle;
        self.ready_at_ms = None;
        self.message = "Session ended - view summary".to_string();
        self.emit_phase();
        self.finish_session();
    }

    fn finish_session(&mut self) {
        if !self.session_active {
            return;
        }
        self.session_active = false;
        self.resume_session = false;
        let summary = self.summary();
        log::info!(
            "session ended: score {} over {} rounds",
            summary.score,
            summary.rounds
        );
        self.emit(EngineEvent::SessionEnded(summary));
    }

    /// Cancels everything and returns to the welcome screen without a summary.
    pub fn reset(&mut self) {
        self.scheduler.cancel_pending();
        self.session.stop();
        self.session_active = false;
        self.resume_session = false;
        self.phase = RoundPhase::Idle;
        self.ready_at_ms = None;
        self.last_reaction_ms = None;
        self.message = WELCOME_MESSAGE.to_string();
        self.emit_phase();
    }

    // --- round state machine ---

    /// Starts a round from `Idle` or `Resolved`. Any other phase is a no-op.
    pub fn start_round(&mut self) -> bool {
        if !matches!(self.phase, RoundPhase::Idle | RoundPhase::Resolved(_)) {
            log::debug!("start_round ignored in {:?}", self.phase);
            return false;
        }

        self.scheduler.cancel_pending();
        self.last_reaction_ms = None;
        self.ready_at_ms = None;
        self.countdown = self.config.countdown_secs;
        self.shape = *SHAPES
            .choose(&mut self.shape_rng)
            .unwrap_or(&PanelShape::Square);
        self.phase = RoundPhase::Countdown;
        self.message = "Get ready...".to_string();

        if self.countdown == 0 {
            self.enter_waiting();
        } else {
            let now = self.clock.now_ms();
            self.scheduler
                .arm_after(COUNTDOWN_STEP_MS, Deferred::CountdownStep, now);
            self.emit_phase();
        }
        true
    }

    /// One countdown step; at zero the round moves to `Waiting`.
    pub fn advance_countdown(&mut self) {
        if self.phase != RoundPhase::Countdown {
            return;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.enter_waiting();
        } else {
            let now = self.clock.now_ms();
            self.scheduler
                .arm_after(COUNTDOWN_STEP_MS, Deferred::CountdownStep, now);
            self.emit_phase();
        }
    }

    fn enter_waiting(&mut self) {
        self.phase = RoundPhase::Waiting;
        self.message = "Wait for GREEN...".to_string();
        let now = self.clock.now_ms();
        self.scheduler
            .arm(self.difficulty.delay_range(), Deferred::BecomeReady, now);
        log::debug!("armed ready trigger due at {:?}", self.scheduler.due_at());
        self.emit_phase();
    }

    fn become_ready(&mut self) {
        if self.phase != RoundPhase::Waiting {
            return;
        }
        self.phase = RoundPhase::Ready;
        self.ready_at_ms = Some(self.clock.now_ms());
        self.message = "CLICK NOW!".to_string();
        self.feedback.vibrate(READY_VIBRATION_MS);
        self.play(Cue::Ready);
        self.emit_phase();
    }

    /// Resolves a panel click against the current phase.
    pub fn on_click(&mut self) -> Option<RoundResult> {
        match self.phase {
            RoundPhase::Waiting => Some(self.resolve_early()),
            RoundPhase::Ready => Some(self.resolve_on_time()),
            _ => None,
        }
    }

    fn resolve_early(&mut self) -> RoundResult {
        self.scheduler.cancel_pending();
        self.session.record_miss(self.scorer.penalty());

        let result = RoundResult {
            reaction_ms: None,
            outcome: Outcome::EarlyClick,
            difficulty: self.difficulty,
            points: -(self.scorer.penalty() as i64),
            timestamp: Local::now(),
        };

        self.phase = RoundPhase::Idle;
        self.message = "Too early!".to_string();
        self.feedback.vibrate(EARLY_VIBRATION_MS);
        self.play(Cue::Early);
        self.publish(result.clone());
        result
    }

    fn resolve_on_time(&mut self) -> RoundResult {
        let now = self.clock.now_ms();
        let reaction_ms = now.saturating_sub(self.ready_at_ms.unwrap_or(now));
        let points = self.scorer.score(reaction_ms, self.difficulty);
        self.session.record_hit(points);

        let result = RoundResult {
            reaction_ms: Some(reaction_ms),
            outcome: Outcome::OnTime,
            difficulty: self.difficulty,
            points: points as i64,
            timestamp: Local::now(),
        };

        self.phase = RoundPhase::Resolved(Outcome::OnTime);
        self.ready_at_ms = None;
        self.last_reaction_ms = Some(reaction_ms);
        self.message = format!("Nice! {} ms", reaction_ms);
        self.play(Cue::Click);
        self.publish(result.clone());

        if is_new_best(Some(reaction_ms), self.best_ms) {
            self.best_ms = Some(reaction_ms);
            log::info!("new best time: {} ms", reaction_ms);
            self.feedback.celebrate();
            self.emit(EngineEvent::NewBest(reaction_ms));
        }

        if self.session.is_running() {
            self.scheduler
                .arm_after(self.config.next_round_delay_ms, Deferred::NextRound, now);
        }
        result
    }

    fn publish(&mut self, result: RoundResult) {
        self.results.push(result.clone());
        self.emit_phase();
        self.emit(EngineEvent::RoundResolved(result));
    }

    // --- pause ---

    /// Suspends the round and the session clock. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        if self.phase == RoundPhase::Paused {
            return false;
        }
        self.scheduler.cancel_pending();
        self.resume_session = self.session.is_running();
        self.session.pause();
        self.ready_at_ms = None;
        self.phase = RoundPhase::Paused;
        self.message = "Paused".to_string();
        self.emit_phase();
        true
    }

    /// Leaves `Paused` for `Idle`. The session clock continues if it was
    /// running; the round is not re-armed.
    pub fn resume(&mut self) -> bool {
        if self.phase != RoundPhase::Paused {
            return false;
        }
        if self.resume_session {
            self.session.resume(self.clock.now_ms());
            self.resume_session = false;
        }
        self.phase = RoundPhase::Idle;
        self.message = if self.session.is_running() {
            "Press START for the next round".to_string()
        } else {
            WELCOME_MESSAGE.to_string()
        };
        self.emit_phase();
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.phase == RoundPhase::Paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    // --- time ---

    /// Delivers any due trigger and advances the session clock.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        if let Some((_, deferred)) = self.scheduler.poll(now) {
            match deferred {
                Deferred::CountdownStep => self.advance_countdown(),
                Deferred::BecomeReady => self.become_ready(),
                Deferred::NextRound => {
                    self.start_round();
                }
            }
        }

        match self.session.poll(now) {
            ClockTick::Idle => {}
            ClockTick::Running(seconds_remaining) => {
                self.emit(EngineEvent::SessionTick { seconds_remaining })
            }
            ClockTick::Expired => {
                self.emit(EngineEvent::SessionTick {
                    seconds_remaining: 0,
                });
                self.scheduler.cancel_pending();
                self.ready_at_ms = None;
                self.phase = RoundPhase::Idle;
                self.message = "Session ended - view summary".to_string();
                self.emit_phase();
                self.finish_session();
            }
        }
    }

    // --- accessors ---

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn shape(&self) -> PanelShape {
        self.shape
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn last_reaction_ms(&self) -> Option<u64> {
        self.last_reaction_ms
    }

    pub fn best_time(&self) -> Option<u64> {
        self.best_ms
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_results(&self.results, self.session.state().score)
    }

    /// Deadline of the pending trigger, if any.
    pub fn pending_due_ms(&self) -> Option<u64> {
        self.scheduler.due_at()
    }

    pub fn pending(&self) -> Option<Deferred> {
        self.scheduler.pending_payload().copied()
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        PhaseSnapshot {
            phase: self.phase,
            message: self.message.clone(),
            countdown: self.countdown,
            reaction_ms: self.last_reaction_ms,
            shape: self.shape,
        }
    }

    fn play(&mut self, cue: Cue) {
        if !self.muted {
            self.feedback.play(cue);
        }
    }

    fn emit_phase(&mut self) {
        log::debug!("phase -> {:?} ({})", self.phase, self.message);
        let snapshot = self.snapshot();
        self.emit(EngineEvent::Phase(snapshot));
    }

    fn emit(&mut self, event: EngineEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::RecordingFeedback;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_at(start_ms: u64) -> (Engine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_ms);
        let engine = Engine::with_seed(EngineConfig::default(), clock.clone(), 11);
        (engine, clock)
    }

    fn record_events(engine: &mut Engine<ManualClock>) -> Rc<RefCell<Vec<EngineEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));
        events
    }

    /// Steps the countdown through to `Waiting`.
    fn run_countdown(engine: &mut Engine<ManualClock>, clock: &ManualClock) {
        while engine.phase() == RoundPhase::Countdown {
            clock.advance(COUNTDOWN_STEP_MS);
            engine.tick();
        }
        assert_eq!(engine.phase(), RoundPhase::Waiting);
    }

    fn fire_ready(engine: &mut Engine<ManualClock>, clock: &ManualClock) {
        let due = engine.pending_due_ms().expect("ready trigger armed");
        clock.set(due);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Ready);
    }

    #[test]
    fn new_engine_is_idle() {
        let (engine, _) = engine_at(0);
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert_eq!(engine.message(), WELCOME_MESSAGE);
        assert!(engine.pending().is_none());
        assert!(!engine.session().is_running);
    }

    #[test]
    fn start_round_runs_countdown_then_waits() {
        let (mut engine, clock) = engine_at(0);
        assert!(engine.start_round());
        assert_eq!(engine.phase(), RoundPhase::Countdown);
        assert_eq!(engine.countdown(), 3);

        clock.advance(COUNTDOWN_STEP_MS);
        engine.tick();
        assert_eq!(engine.countdown(), 2);

        run_countdown(&mut engine, &clock);
        assert_eq!(engine.pending(), Some(Deferred::BecomeReady));
        let range = Difficulty::Easy.delay_range();
        let delay = engine.pending_due_ms().unwrap() - clock.now_ms();
        assert!(range.contains(delay));
    }

    #[test]
    fn advance_countdown_directly_reaches_waiting() {
        let (mut engine, _) = engine_at(0);
        engine.start_round();
        engine.advance_countdown();
        engine.advance_countdown();
        assert_eq!(engine.phase(), RoundPhase::Countdown);
        engine.advance_countdown();
        assert_eq!(engine.phase(), RoundPhase::Waiting);
        // ignored outside the countdown
        engine.advance_countdown();
        assert_eq!(engine.phase(), RoundPhase::Waiting);
    }

    #[test]
    fn double_start_arms_a_single_trigger() {
        let (mut engine, clock) = engine_at(0);
        let events = record_events(&mut engine);

        assert!(engine.start_round());
        assert!(!engine.start_round());

        run_countdown(&mut engine, &clock);
        clock.advance(10_000);
        engine.tick();
        clock.advance(10_000);
        engine.tick();

        let ready_count = events
            .borrow()
            .iter()
            .filter(|ev| matches!(ev, EngineEvent::Phase(s) if s.phase == RoundPhase::Ready))
            .count();
        assert_eq!(ready_count, 1);
    }

    #[test]
    fn early_click_goes_idle_without_reaction() {
        let (mut engine, clock) = engine_at(0);
        engine.start_round();
        run_countdown(&mut engine, &clock);
        clock.advance(5);

        let result = engine.on_click().expect("early click resolves");
        assert_eq!(result.outcome, Outcome::EarlyClick);
        assert_eq!(result.reaction_ms, None);
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert_eq!(engine.message(), "Too early!");

        // the ready trigger was cancelled, even once it would have been due
        assert!(engine.pending().is_none());
        clock.advance(60_000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Idle);
    }

    #[test]
    fn early_click_applies_penalty_and_resets_combo() {
        let (mut engine, clock) = engine_at(0);
        engine.start_session(SessionConfig::default());
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(100);
        engine.on_click();
        assert_eq!(engine.session().combo, 1);
        assert_eq!(engine.session().score, 10);

        clock.advance(DEFAULT_NEXT_ROUND_DELAY_MS);
        engine.tick();
        run_countdown(&mut engine, &clock);
        let result = engine.on_click().unwrap();

        assert_eq!(result.points, -5);
        assert_eq!(engine.session().score, 5);
        assert_eq!(engine.session().combo, 0);
    }

    #[test]
    fn on_time_click_measures_reaction() {
        let (mut engine, clock) = engine_at(0);
        engine.start_round();
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);

        clock.advance(250);
        let result = engine.on_click().unwrap();
        assert_eq!(result.outcome, Outcome::OnTime);
        assert_eq!(result.reaction_ms, Some(250));
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::OnTime));
        assert_eq!(engine.message(), "Nice! 250 ms");
        assert_eq!(engine.last_reaction_ms(), Some(250));
    }

    #[test]
    fn clicks_in_other_phases_are_ignored() {
        let (mut engine, clock) = engine_at(0);
        assert_eq!(engine.on_click(), None);

        engine.start_round();
        assert_eq!(engine.on_click(), None);
        assert_eq!(engine.phase(), RoundPhase::Countdown);

        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        engine.on_click();
        assert_eq!(engine.on_click(), None);

        engine.pause();
        assert_eq!(engine.on_click(), None);
        assert!(engine.results().len() == 1);
    }

    #[test]
    fn new_best_is_reported_and_celebrated() {
        let (mut engine, clock) = engine_at(0);
        let recorder = RecordingFeedback::default();
        engine.set_feedback(Box::new(recorder.clone()));
        engine.set_best_time(Some(300));
        let events = record_events(&mut engine);

        engine.start_round();
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(280);
        engine.on_click();

        assert_eq!(engine.best_time(), Some(280));
        assert!(events
            .borrow()
            .iter()
            .any(|ev| *ev == EngineEvent::NewBest(280)));
        assert_eq!(
            recorder.entries(),
            vec!["vibrate:120", "play:ready", "play:click", "celebrate"]
        );
    }

    #[test]
    fn slower_time_is_not_a_new_best() {
        let (mut engine, clock) = engine_at(0);
        engine.set_best_time(Some(200));
        let events = record_events(&mut engine);

        engine.start_round();
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(320);
        engine.on_click();

        assert_eq!(engine.best_time(), Some(200));
        assert!(!events
            .borrow()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::NewBest(_))));
    }

    #[test]
    fn muted_engine_skips_audio_but_keeps_haptics() {
        let (mut engine, clock) = engine_at(0);
        let recorder = RecordingFeedback::default();
        engine.set_feedback(Box::new(recorder.clone()));
        engine.set_muted(true);

        engine.start_round();
        run_countdown(&mut engine, &clock);
        engine.on_click();

        assert_eq!(recorder.entries(), vec!["vibrate:60"]);
    }

    #[test]
    fn session_auto_starts_next_round_after_on_time_click() {
        let (mut engine, clock) = engine_at(0);
        engine.start_session(SessionConfig::default());
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(300);
        engine.on_click();
        assert_eq!(engine.pending(), Some(Deferred::NextRound));

        clock.advance(DEFAULT_NEXT_ROUND_DELAY_MS);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Countdown);
    }

    #[test]
    fn single_round_without_session_rests_in_resolved() {
        let (mut engine, clock) = engine_at(0);
        engine.start_round();
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(300);
        engine.on_click();

        assert!(engine.pending().is_none());
        clock.advance(5_000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::OnTime));
        assert!(engine.start_round());
    }

    #[test]
    fn pause_cancels_trigger_and_clock_resume_does_not_rearm() {
        let (mut engine, clock) = engine_at(0);
        engine.start_session(SessionConfig::default());
        run_countdown(&mut engine, &clock);
        let remaining = engine.session().seconds_remaining;

        assert!(engine.pause());
        assert!(!engine.pause());
        assert_eq!(engine.phase(), RoundPhase::Paused);
        assert!(engine.pending().is_none());

        clock.advance(20_000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Paused);
        assert_eq!(engine.session().seconds_remaining, remaining);

        assert!(engine.resume());
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert!(engine.pending().is_none());
        assert!(engine.session().is_running);

        clock.advance(1_000);
        engine.tick();
        assert_eq!(engine.session().seconds_remaining, remaining - 1);
        assert!(engine.start_round());
    }

    #[test]
    fn session_expiry_ends_once_and_cancels_round() {
        let (mut engine, clock) = engine_at(0);
        let events = record_events(&mut engine);
        engine.start_session(SessionConfig {
            duration_secs: 2,
            difficulty: Difficulty::Hard,
        });

        for _ in 0..10 {
            clock.advance(1_000);
            engine.tick();
        }

        assert!(!engine.session().is_running);
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert!(engine.pending().is_none());
        let ended = events
            .borrow()
            .iter()
            .filter(|ev| matches!(ev, EngineEvent::SessionEnded(_)))
            .count();
        assert_eq!(ended, 1);

        // explicit end after expiry does not report twice
        engine.end_session();
        let ended = events
            .borrow()
            .iter()
            .filter(|ev| matches!(ev, EngineEvent::SessionEnded(_)))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn end_session_reports_summary() {
        let (mut engine, clock) = engine_at(0);
        let events = record_events(&mut engine);
        engine.start_session(SessionConfig::default());
        run_countdown(&mut engine, &clock);
        fire_ready(&mut engine, &clock);
        clock.advance(400);
        engine.on_click();
        engine.end_session();

        let summary = events.borrow().iter().find_map(|ev| match ev {
            EngineEvent::SessionEnded(s) => Some(s.clone()),
            _ => None,
        });
        assert_matches!(summary, Some(SessionSummary { rounds: 1, on_time: 1, .. }));
        assert!(engine.pending().is_none());
    }

    #[test]
    fn reset_returns_to_welcome() {
        let (mut engine, clock) = engine_at(0);
        engine.start_session(SessionConfig::default());
        run_countdown(&mut engine, &clock);
        engine.reset();

        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert_eq!(engine.message(), WELCOME_MESSAGE);
        assert!(engine.pending().is_none());
        assert!(!engine.session().is_running);
        assert!(!engine.session_active());
    }

    #[test]
    fn zero_countdown_goes_straight_to_waiting() {
        let clock = ManualClock::new(0);
        let config = EngineConfig {
            countdown_secs: 0,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_seed(config, clock, 3);
        engine.start_round();
        assert_eq!(engine.phase(), RoundPhase::Waiting);
    }

    #[test]
    fn difficulty_change_applies_to_next_wait() {
        let (mut engine, clock) = engine_at(0);
        engine.set_difficulty(Difficulty::Hard);
        engine.start_round();
        run_countdown(&mut engine, &clock);
        assert_eq!(engine.difficulty(), Difficulty::Hard);
        let delay = engine.pending_due_ms().unwrap() - clock.now_ms();
        assert!(Difficulty::Hard.delay_range().contains(delay));
    }
}
