use crate::classify::{classify, Classification};
use crate::escalation::{EscalationMethod, MethodStack};
use crate::inject::inject_commands;
use crate::keys::{tap, SCANCODE_ESCAPE};
use crate::quiescence::{QuiescenceDetector, QuiescenceState, FIRST_POLL_MS, POLL_INTERVAL_MS};
use crate::{RemoteDesktop, SessionResult};
use rdpwn_gfx::{Canvas, PixelBlock};
use rdpwn_timing::{TimerId, Timers};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Grace period between firing a method and classifying the screen.
pub const CLASSIFY_GRACE_MS: u64 = 1000;
pub const CLOSE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    Poll,
    Classify,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { method: EscalationMethod },
    Exhausted,
}

// Idle --update--> AwaitingQuiescence
// AwaitingQuiescence --poll, still busy--> AwaitingQuiescence (re-arm poll)
// AwaitingQuiescence --poll, settled--> AwaitingClassification(method)
//     fires `method`, snapshots `before` into the pending canvas,
//     arms the classify timer
// AwaitingClassification --classify, prompt--> Finished(Success)
//     types the commands, arms the close timer
// AwaitingClassification --classify, no prompt, methods left--> AwaitingQuiescence
//     pending becomes `before`, taps Escape, re-arms the poll
// AwaitingClassification --classify, no prompt, none left--> Finished(Exhausted)
//     arms the close timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    AwaitingQuiescence,
    AwaitingClassification { method: EscalationMethod },
    Finished(Outcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub method: EscalationMethod,
    pub fired_at_ms: u64,
    pub classified_at_ms: u64,
    pub classification: Classification,
}

#[derive(Debug)]
pub struct EscalationSequencer {
    state: SequencerState,
    methods: MethodStack,
    commands: Vec<String>,
    before: Canvas,
    /// Canvas collecting updates since the last method fired. Present exactly
    /// while a classification is pending.
    pending: Option<Canvas>,
    last_after: Option<Canvas>,
    quiescence: QuiescenceDetector,
    fired_at: u64,
    classify_timer: Option<TimerId>,
    close_timer: Option<TimerId>,
    close_scheduled: bool,
    attempts: Vec<Attempt>,
    command_events_sent: usize,
}

impl EscalationSequencer {
    pub fn new(width: u32, height: u32, methods: MethodStack, commands: Vec<String>) -> Self {
        Self {
            state: SequencerState::Idle,
            methods,
            commands,
            before: Canvas::new(width, height),
            pending: None,
            last_after: None,
            quiescence: QuiescenceDetector::new(),
            fired_at: 0,
            classify_timer: None,
            close_timer: None,
            close_scheduled: false,
            attempts: Vec::new(),
            command_events_sent: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            SequencerState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn remaining_methods(&self) -> usize {
        self.methods.remaining()
    }

    pub fn command_events_sent(&self) -> usize {
        self.command_events_sent
    }

    pub fn before(&self) -> &Canvas {
        &self.before
    }

    pub fn after(&self) -> Option<&Canvas> {
        self.pending.as_ref().or(self.last_after.as_ref())
    }

    pub fn poll_armed(&self) -> bool {
        self.quiescence.is_armed()
    }

    pub fn on_pixels<T>(
        &mut self,
        now: u64,
        block: &PixelBlock,
        dest_x: u32,
        dest_y: u32,
        timers: &mut T,
    ) -> SessionResult<()>
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        self.active_canvas_mut().paste_block(block, dest_x, dest_y)?;
        self.quiescence.record_update(now);

        match self.state {
            SequencerState::Idle => {
                self.state = SequencerState::AwaitingQuiescence;
                self.arm_poll(now, FIRST_POLL_MS, timers);
            }
            SequencerState::AwaitingQuiescence if !self.quiescence.is_armed() => {
                self.arm_poll(now, FIRST_POLL_MS, timers);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn on_timer<R, T>(
        &mut self,
        now: u64,
        timer: SessionTimer,
        client: &mut R,
        timers: &mut T,
    ) -> SessionResult<()>
    where
        R: RemoteDesktop + ?Sized,
        T: Timers<SessionTimer> + ?Sized,
    {
        match timer {
            SessionTimer::Poll => self.on_poll(now, client, timers),
            SessionTimer::Classify => self.on_classify(now, client, timers),
            SessionTimer::Close => {
                self.close_timer = None;
                debug!("closing session");
                client.close()
            }
        }
    }

    pub fn on_close<T>(&mut self, timers: &mut T)
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        if let Some(id) = self.quiescence.reset() {
            timers.cancel(id);
        }
        if let Some(id) = self.classify_timer.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.close_timer.take() {
            timers.cancel(id);
        }
    }

    fn on_poll<R, T>(&mut self, now: u64, client: &mut R, timers: &mut T) -> SessionResult<()>
    where
        R: RemoteDesktop + ?Sized,
        T: Timers<SessionTimer> + ?Sized,
    {
        if self.state != SequencerState::AwaitingQuiescence {
            return Ok(());
        }
        match self.quiescence.poll(now) {
            QuiescenceState::Accumulating => {
                self.arm_poll(now, POLL_INTERVAL_MS, timers);
                Ok(())
            }
            QuiescenceState::Settled => self.fire_next_method(now, client, timers),
        }
    }

    fn fire_next_method<R, T>(
        &mut self,
        now: u64,
        client: &mut R,
        timers: &mut T,
    ) -> SessionResult<()>
    where
        R: RemoteDesktop + ?Sized,
        T: Timers<SessionTimer> + ?Sized,
    {
        let Some(method) = self.methods.pop_next() else {
            warn!("no escalation methods configured");
            self.finish(now, Outcome::Exhausted, timers);
            return Ok(());
        };

        debug!(%method, "screen settled, firing escalation method");
        client.send_all(&method.key_events())?;
        self.pending = Some(self.before.copy());
        self.fired_at = now;
        self.state = SequencerState::AwaitingClassification { method };
        let id = timers.schedule_after(now, CLASSIFY_GRACE_MS, SessionTimer::Classify);
        self.classify_timer = Some(id);
        Ok(())
    }

    fn on_classify<R, T>(&mut self, now: u64, client: &mut R, timers: &mut T) -> SessionResult<()>
    where
        R: RemoteDesktop + ?Sized,
        T: Timers<SessionTimer> + ?Sized,
    {
        let SequencerState::AwaitingClassification { method } = self.state else {
            return Ok(());
        };
        self.classify_timer = None;
        let Some(after) = self.pending.take() else {
            return Ok(());
        };

        let classification = classify(&self.before, &after);
        debug!(
            %method,
            dark_before = classification.before.dark,
            dark_after = classification.after.dark,
            light_before = classification.before.light,
            light_after = classification.after.light,
            ratio = classification.ratio,
            "classified screen"
        );
        self.attempts.push(Attempt {
            method,
            fired_at_ms: self.fired_at,
            classified_at_ms: now,
            classification,
        });

        if classification.target_reached {
            info!(%method, "prompt detected");
            self.command_events_sent = inject_commands(client, self.commands.as_slice())?;
            self.last_after = Some(after);
            self.finish(now, Outcome::Success { method }, timers);
            return Ok(());
        }

        warn!(%method, "no prompt");
        let Some(next) = self.methods.peek_next() else {
            warn!("escalation methods exhausted, closing without sending commands");
            self.last_after = Some(after);
            self.finish(now, Outcome::Exhausted, timers);
            return Ok(());
        };

        debug!(%next, "trying next method");
        self.before = after;
        client.send_all(&tap(SCANCODE_ESCAPE))?;
        self.state = SequencerState::AwaitingQuiescence;
        if let Some(id) = self.quiescence.reset() {
            timers.cancel(id);
        }
        // The reset may repaint nothing, so silence is measured from here.
        self.quiescence.record_update(now);
        self.arm_poll(now, POLL_INTERVAL_MS, timers);
        Ok(())
    }

    fn finish<T>(&mut self, now: u64, outcome: Outcome, timers: &mut T)
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        self.state = SequencerState::Finished(outcome);
        if let Some(id) = self.quiescence.reset() {
            timers.cancel(id);
        }
        if let Some(id) = self.classify_timer.take() {
            timers.cancel(id);
        }
        if !self.close_scheduled {
            self.close_scheduled = true;
            let id = timers.schedule_after(now, CLOSE_DELAY_MS, SessionTimer::Close);
            self.close_timer = Some(id);
        }
    }

    fn arm_poll<T>(&mut self, now: u64, delay: u64, timers: &mut T)
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        let id = timers.schedule_after(now, delay, SessionTimer::Poll);
        self.quiescence.set_armed(id);
    }

    fn active_canvas_mut(&mut self) -> &mut Canvas {
        match (&mut self.pending, &mut self.last_after) {
            (Some(canvas), _) => canvas,
            (None, Some(canvas)) => canvas,
            (None, None) => &mut self.before,
        }
    }
}
