use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

/// Audio cues fired on phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    Ready,
    Early,
    Click,
}

/// Fire-and-forget sensory side effects the engine triggers.
///
/// Every method defaults to a no-op so front ends only implement what the
/// platform supports.
pub trait Feedback {
    fn play(&mut self, _cue: Cue) {}
    fn vibrate(&mut self, _duration_ms: u64) {}
    fn celebrate(&mut self) {}
}

/// No feedback at all
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Feedback for Silent {}

/// Terminal feedback: the bell stands in for audio, celebrations are handed
/// to the UI through a shared counter.
#[derive(Debug, Default, Clone)]
pub struct TerminalFeedback {
    celebrations: Rc<Cell<u32>>,
}

impl TerminalFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter bumped on every celebrate request; clone it before handing the
    /// feedback to the engine.
    pub fn celebrations(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.celebrations)
    }
}

impl Feedback for TerminalFeedback {
    fn play(&mut self, cue: Cue) {
        log::debug!("cue {}", cue);
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn vibrate(&mut self, duration_ms: u64) {
        log::debug!("haptics unsupported in terminal ({} ms)", duration_ms);
    }

    fn celebrate(&mut self) {
        self.celebrations.set(self.celebrations.get() + 1);
    }
}

/// Records every call, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingFeedback {
    pub log: Rc<std::cell::RefCell<Vec<String>>>,
}

impl RecordingFeedback {
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Feedback for RecordingFeedback {
    fn play(&mut self, cue: Cue) {
        self.log.borrow_mut().push(format!("play:{}", cue));
    }

    fn vibrate(&mut self, duration_ms: u64) {
        self.log.borrow_mut().push(format!("vibrate:{}", duration_ms));
    }

    fn celebrate(&mut self) {
        self.log.borrow_mut().push("celebrate".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_ids_are_lowercase() {
        assert_eq!(Cue::Ready.to_string(), "ready");
        assert_eq!(Cue::Early.to_string(), "early");
        assert_eq!(Cue::Click.to_string(), "click");
    }

    #[test]
    fn terminal_feedback_counts_celebrations() {
        let mut feedback = TerminalFeedback::new();
        let counter = feedback.celebrations();
        feedback.celebrate();
        feedback.celebrate();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn recording_feedback_keeps_order() {
        let recorder = RecordingFeedback::default();
        let mut boxed: Box<dyn Feedback> = Box::new(recorder.clone());
        boxed.play(Cue::Ready);
        boxed.vibrate(120);
        boxed.celebrate();
        assert_eq!(
            recorder.entries(),
            vec!["play:ready", "vibrate:120", "celebrate"]
        );
    }
}
