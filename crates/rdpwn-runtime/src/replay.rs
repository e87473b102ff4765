use crate::keys::KeyEvent;
use crate::sequencer::{Attempt, Outcome, SessionTimer};
use crate::{RemoteDesktop, Session, SessionContext, SessionError, SessionResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rdpwn_gfx::{Canvas, Lz4TileCodec, PassthroughCodec, TileCodec, TileUpdate};
use rdpwn_timing::{Scheduler, TimerId, Timers};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SESSION_TRACE_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Deserialize, Clone)]
pub struct SessionTrace {
    pub schema_version: String,
    pub metadata: TraceMetadata,
    pub updates: Vec<TraceUpdate>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraceMetadata {
    pub title: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub codec: TraceCodec,
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraceCodec {
    #[default]
    Lz4,
    Raw,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraceUpdate {
    #[serde(default)]
    pub time_ms: Option<u64>,
    #[serde(default)]
    pub trigger_scancode: Option<u16>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub right: Option<u32>,
    #[serde(default)]
    pub bottom: Option<u32>,
    #[serde(default = "default_bits_per_pixel")]
    pub bits_per_pixel: u32,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub data: Option<String>,
    /// A single RGB565 value repeated over the tile.
    #[serde(default)]
    pub fill: Option<u16>,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_max_duration_ms() -> u64 {
    120_000
}

fn default_bits_per_pixel() -> u32 {
    16
}

impl SessionTrace {
    pub fn parse(toml_src: &str) -> Result<Self, String> {
        let trace: SessionTrace =
            toml::from_str(toml_src).map_err(|err| format!("invalid session trace: {err}"))?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != SESSION_TRACE_SCHEMA_VERSION {
            return Err(format!(
                "unsupported session trace schema version: {}",
                self.schema_version
            ));
        }
        if self.metadata.title.trim().is_empty()
            || self.metadata.width == 0
            || self.metadata.height == 0
        {
            return Err("session trace metadata is incomplete".to_string());
        }
        if self.updates.is_empty() {
            return Err("session trace updates list is empty".to_string());
        }
        for (index, update) in self.updates.iter().enumerate() {
            update.validate(
                &format!("update[{index}]"),
                self.metadata.width,
                self.metadata.height,
            )?;
        }
        Ok(())
    }
}

fn extent_end(origin: u32, len: u32) -> Option<u32> {
    len.checked_sub(1).and_then(|last| origin.checked_add(last))
}

impl TraceUpdate {
    fn edges(&self, label: &str) -> Result<(u32, u32), String> {
        let overflow = || format!("{label} tile extent overflows");
        let right = match self.right {
            Some(right) => right,
            None => extent_end(self.left, self.width).ok_or_else(overflow)?,
        };
        let bottom = match self.bottom {
            Some(bottom) => bottom,
            None => extent_end(self.top, self.height).ok_or_else(overflow)?,
        };
        Ok((right, bottom))
    }

    fn validate(&self, label: &str, screen_width: u32, screen_height: u32) -> Result<(), String> {
        match (self.time_ms, self.trigger_scancode) {
            (Some(_), Some(_)) => {
                return Err(format!("{label} sets both time_ms and trigger_scancode"))
            }
            (None, None) => return Err(format!("{label} needs time_ms or trigger_scancode")),
            (Some(_), None) if self.delay_ms.is_some() => {
                return Err(format!("{label} delay_ms is only valid with trigger_scancode"))
            }
            _ => {}
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("{label} has an empty tile"));
        }
        if self.left >= screen_width || self.top >= screen_height {
            return Err(format!(
                "{label} origin ({}, {}) is outside the {screen_width}x{screen_height} screen",
                self.left, self.top
            ));
        }
        self.edges(label)?;
        match (&self.data, self.fill) {
            (Some(_), Some(_)) => Err(format!("{label} sets both data and fill")),
            (None, None) => Err(format!("{label} needs data or fill")),
            (None, Some(_)) if self.compressed => {
                Err(format!("{label} fill cannot be compressed"))
            }
            _ => Ok(()),
        }
    }

    pub fn to_tile(&self, label: &str) -> Result<TileUpdate, String> {
        let data = match (&self.data, self.fill) {
            (Some(encoded), _) => STANDARD
                .decode(encoded.trim())
                .map_err(|err| format!("invalid base64 for {label}: {err}"))?,
            (None, Some(fill)) => fill
                .to_le_bytes()
                .repeat(self.width as usize * self.height as usize),
            (None, None) => return Err(format!("{label} needs data or fill")),
        };
        let (right, bottom) = self.edges(label)?;
        Ok(TileUpdate {
            left: self.left,
            top: self.top,
            right,
            bottom,
            width: self.width,
            height: self.height,
            bits_per_pixel: self.bits_per_pixel,
            compressed: self.compressed,
            data,
        })
    }
}

#[derive(Debug, Default)]
pub struct ReplayClient {
    sent: Vec<KeyEvent>,
    cursor: usize,
    closed: bool,
}

impl ReplayClient {
    pub fn sent(&self) -> &[KeyEvent] {
        &self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn take_new_presses(&mut self) -> Vec<u16> {
        let presses = self.sent[self.cursor..]
            .iter()
            .filter_map(|event| match event {
                KeyEvent::Scancode {
                    code, down: true, ..
                } => Some(*code),
                _ => None,
            })
            .collect();
        self.cursor = self.sent.len();
        presses
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.closed {
            return Err(SessionError::Transport("session already closed".to_string()));
        }
        Ok(())
    }
}

impl RemoteDesktop for ReplayClient {
    fn send_key_scancode(&mut self, code: u16, down: bool, extended: bool) -> SessionResult<()> {
        self.ensure_open()?;
        self.sent.push(KeyEvent::Scancode {
            code,
            down,
            extended,
        });
        Ok(())
    }

    fn send_key_unicode(&mut self, code_point: u32, down: bool) -> SessionResult<()> {
        self.ensure_open()?;
        self.sent.push(KeyEvent::Unicode { code_point, down });
        Ok(())
    }

    fn close(&mut self) -> SessionResult<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub title: String,
    pub outcome: Option<Outcome>,
    pub attempts: Vec<Attempt>,
    pub key_events_sent: usize,
    pub command_events_sent: usize,
    pub updates_applied: usize,
    pub closed_at_ms: Option<u64>,
    pub elapsed_ms: u64,
    #[serde(skip)]
    pub key_events: Vec<KeyEvent>,
    #[serde(skip)]
    pub initial: Option<Canvas>,
    #[serde(skip)]
    pub final_canvas: Option<Canvas>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Update(usize),
    Session(SessionTimer),
}

struct SessionTimers<'a>(&'a mut Scheduler<Wake>);

impl Timers<SessionTimer> for SessionTimers<'_> {
    fn schedule_after(&mut self, now: u64, delay: u64, payload: SessionTimer) -> TimerId {
        self.0.schedule_after(now, delay, Wake::Session(payload))
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.0.cancel(id)
    }
}

#[derive(Debug)]
struct Trigger {
    scancode: u16,
    delay_ms: u64,
    index: usize,
}

pub fn run_replay(trace: &SessionTrace, context: SessionContext) -> SessionResult<ReplayReport> {
    trace.validate().map_err(SessionError::Trace)?;
    if (context.width, context.height) != (trace.metadata.width, trace.metadata.height) {
        return Err(SessionError::Trace(format!(
            "trace recorded at {}x{} but session requested {}x{}",
            trace.metadata.width, trace.metadata.height, context.width, context.height
        )));
    }
    let tiles = trace
        .updates
        .iter()
        .enumerate()
        .map(|(index, update)| update.to_tile(&format!("update[{index}]")))
        .collect::<Result<Vec<_>, _>>()
        .map_err(SessionError::Trace)?;

    match trace.metadata.codec {
        TraceCodec::Lz4 => drive(trace, &tiles, context, Lz4TileCodec),
        TraceCodec::Raw => drive(trace, &tiles, context, PassthroughCodec),
    }
}

fn drive<C: TileCodec>(
    trace: &SessionTrace,
    tiles: &[TileUpdate],
    context: SessionContext,
    codec: C,
) -> SessionResult<ReplayReport> {
    let mut scheduler: Scheduler<Wake> = Scheduler::new();
    let mut triggers = Vec::new();
    for (index, update) in trace.updates.iter().enumerate() {
        match (update.time_ms, update.trigger_scancode) {
            (Some(time), _) => {
                scheduler.schedule(time, Wake::Update(index));
            }
            (None, Some(scancode)) => triggers.push(Trigger {
                scancode,
                delay_ms: update.delay_ms.unwrap_or(0),
                index,
            }),
            (None, None) => {}
        }
    }

    let mut session = Session::new(context, ReplayClient::default(), codec);
    session.on_ready();
    session.on_session_ready();

    let limit = trace.metadata.max_duration_ms;
    let mut now = 0;
    let mut updates_applied = 0;
    let mut closed_at = None;
    while let Some(due) = scheduler.next_due() {
        if due > limit {
            warn!(limit_ms = limit, "replay reached its duration cap");
            break;
        }
        let Some(event) = scheduler.pop_due(due) else {
            break;
        };
        now = event.time;
        match event.payload {
            Wake::Update(index) => {
                session.on_update(now, &tiles[index], &mut SessionTimers(&mut scheduler))?;
                updates_applied += 1;
            }
            Wake::Session(timer) => {
                session.on_timer(now, timer, &mut SessionTimers(&mut scheduler))?;
            }
        }

        for scancode in session.client_mut().take_new_presses() {
            triggers.retain(|trigger| {
                if trigger.scancode != scancode {
                    return true;
                }
                debug!(scancode, update = trigger.index, "trace update triggered");
                scheduler.schedule(now + trigger.delay_ms, Wake::Update(trigger.index));
                false
            });
        }

        if session.client().is_closed() {
            closed_at = Some(now);
            break;
        }
    }

    let closed = session.on_close(&mut SessionTimers(&mut scheduler));
    Ok(ReplayReport {
        title: trace.metadata.title.clone(),
        outcome: closed.outcome,
        attempts: closed.attempts,
        key_events_sent: closed.client.sent().len(),
        command_events_sent: closed.command_events_sent,
        updates_applied,
        closed_at_ms: closed_at,
        elapsed_ms: now,
        key_events: closed.client.sent,
        initial: closed.initial,
        final_canvas: closed.final_canvas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        schema_version = "1"

        [metadata]
        title = "login screen"
        width = 4
        height = 4
        codec = "raw"

        [[updates]]
        time_ms = 0
        left = 0
        top = 0
        width = 4
        height = 4
        fill = 0x8410
    "#;

    #[test]
    fn parse_applies_defaults() {
        let trace = SessionTrace::parse(MINIMAL).expect("parse trace");
        assert_eq!(trace.metadata.codec, TraceCodec::Raw);
        assert_eq!(trace.metadata.max_duration_ms, 120_000);
        assert_eq!(trace.updates[0].bits_per_pixel, 16);
        let tile = trace.updates[0].to_tile("update[0]").expect("tile");
        assert_eq!(tile.data.len(), 32);
        assert_eq!((tile.right, tile.bottom), (3, 3));
    }

    #[test]
    fn parse_rejects_ambiguous_timing() {
        let src = MINIMAL.replace("time_ms = 0", "time_ms = 0\n        trigger_scancode = 42");
        let err = SessionTrace::parse(&src).unwrap_err();
        assert!(err.contains("both time_ms and trigger_scancode"), "{err}");
    }

    #[test]
    fn parse_rejects_compressed_fill() {
        let src = MINIMAL.replace("fill = 0x8410", "fill = 0x8410\n        compressed = true");
        let err = SessionTrace::parse(&src).unwrap_err();
        assert!(err.contains("fill cannot be compressed"), "{err}");
    }

    #[test]
    fn parse_rejects_unknown_schema() {
        let src = MINIMAL.replace("schema_version = \"1\"", "schema_version = \"2\"");
        let err = SessionTrace::parse(&src).unwrap_err();
        assert!(err.contains("unsupported session trace schema version"), "{err}");
    }

    #[test]
    fn parse_rejects_tile_outside_screen() {
        let src = MINIMAL.replace("left = 0", "left = 4294967295");
        let err = SessionTrace::parse(&src).unwrap_err();
        assert!(err.contains("outside the 4x4 screen"), "{err}");

        let src = MINIMAL.replace("top = 0", "top = 4");
        let err = SessionTrace::parse(&src).unwrap_err();
        assert!(err.contains("update[0] origin (0, 4)"), "{err}");
    }

    #[test]
    fn tile_extent_overflow_is_an_error() {
        let trace = SessionTrace::parse(MINIMAL).expect("parse trace");
        let mut update = trace.updates[0].clone();
        update.left = u32::MAX;
        update.width = 2;
        let err = update.to_tile("update[0]").unwrap_err();
        assert!(err.contains("extent overflows"), "{err}");

        let mut trace = trace;
        trace.updates[0] = update;
        let err = run_replay(&trace, SessionContext::new(Vec::new())).unwrap_err();
        assert!(matches!(err, SessionError::Trace(_)));
    }

    #[test]
    fn replay_client_refuses_keys_after_close() {
        let mut client = ReplayClient::default();
        client.send_key_scancode(0x01, true, false).expect("send");
        client.close().expect("close");
        let err = client.send_key_unicode('a' as u32, true).unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(client.take_new_presses(), vec![0x01]);
        assert!(client.take_new_presses().is_empty());
    }

    #[test]
    fn replay_rejects_mismatched_screen() {
        let trace = SessionTrace::parse(MINIMAL).expect("parse trace");
        let err = run_replay(&trace, SessionContext::new(Vec::new())).unwrap_err();
        assert!(matches!(err, SessionError::Trace(_)));
    }
}
