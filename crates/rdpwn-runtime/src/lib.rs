pub mod classify;
pub mod client;
pub mod escalation;
pub mod inject;
pub mod keys;
pub mod quiescence;
pub mod replay;
pub mod sequencer;
pub mod session;

pub use classify::{classify, classify_counts, Classification, ColorCounts, PROMPT_RATIO_THRESHOLD};
pub use client::{RecordingClient, RemoteDesktop};
pub use escalation::{EscalationMethod, MethodStack};
pub use inject::{command_key_events, inject_commands, LINE_TERMINATOR};
pub use keys::KeyEvent;
pub use quiescence::{QuiescenceDetector, QuiescenceState};
pub use replay::{run_replay, ReplayClient, ReplayReport, SessionTrace, TraceCodec, TraceUpdate};
pub use sequencer::{Attempt, EscalationSequencer, Outcome, SequencerState, SessionTimer};
pub use session::{ClosedSession, Session, SessionContext};

pub use rdpwn_gfx::{Canvas, GraphicsError, TileUpdate};
pub use rdpwn_timing::{Scheduler, TimerId, Timers};

pub const DEFAULT_SCREEN_WIDTH: u32 = 1024;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 800;
pub const DEFAULT_PORT: u16 = 3389;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("tile decode failed: {0}")]
    Decode(#[from] GraphicsError),
    #[error("invalid session trace: {0}")]
    Trace(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
