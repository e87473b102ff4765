use crate::escalation::MethodStack;
use crate::sequencer::{Attempt, EscalationSequencer, Outcome, SessionTimer};
use crate::{RemoteDesktop, SessionResult, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use rdpwn_gfx::{Canvas, TileCodec, TileDecoder, TileUpdate};
use rdpwn_timing::Timers;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<String>,
    pub save: bool,
}

impl SessionContext {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            commands,
            save: false,
        }
    }
}

#[derive(Debug)]
pub struct ClosedSession<R> {
    pub client: R,
    pub outcome: Option<Outcome>,
    pub attempts: Vec<Attempt>,
    pub command_events_sent: usize,
    /// Populated only when the context asked for the canvases to be saved.
    pub initial: Option<Canvas>,
    pub final_canvas: Option<Canvas>,
}

pub struct Session<R, C> {
    client: R,
    decoder: TileDecoder<C>,
    sequencer: EscalationSequencer,
    save: bool,
}

impl<R: RemoteDesktop, C: TileCodec> Session<R, C> {
    pub fn new(context: SessionContext, client: R, codec: C) -> Self {
        Self::with_methods(context, MethodStack::default(), client, codec)
    }

    pub fn with_methods(context: SessionContext, methods: MethodStack, client: R, codec: C) -> Self {
        Self {
            client,
            decoder: TileDecoder::new(codec),
            sequencer: EscalationSequencer::new(
                context.width,
                context.height,
                methods,
                context.commands,
            ),
            save: context.save,
        }
    }

    pub fn client(&self) -> &R {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut R {
        &mut self.client
    }

    pub fn on_ready(&mut self) {
        debug!("session ready");
    }

    pub fn on_session_ready(&mut self) {
        debug!("desktop session ready");
    }

    pub fn on_update<T>(&mut self, now: u64, update: &TileUpdate, timers: &mut T) -> SessionResult<()>
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        let block = self.decoder.decode(update)?;
        self.sequencer
            .on_pixels(now, &block, update.left, update.top, timers)
    }

    pub fn on_timer<T>(&mut self, now: u64, timer: SessionTimer, timers: &mut T) -> SessionResult<()>
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        self.sequencer.on_timer(now, timer, &mut self.client, timers)
    }

    pub fn on_close<T>(mut self, timers: &mut T) -> ClosedSession<R>
    where
        T: Timers<SessionTimer> + ?Sized,
    {
        self.sequencer.on_close(timers);
        debug!("closed");
        let (initial, final_canvas) = if self.save {
            (
                Some(self.sequencer.before().copy()),
                self.sequencer.after().map(Canvas::copy),
            )
        } else {
            (None, None)
        };
        ClosedSession {
            outcome: self.sequencer.outcome(),
            attempts: self.sequencer.attempts().to_vec(),
            command_events_sent: self.sequencer.command_events_sent(),
            initial,
            final_canvas,
            client: self.client,
        }
    }
}
