use crate::keys::{tap, KeyEvent, SCANCODE_LEFT_SHIFT, SCANCODE_RIGHT_WIN, SCANCODE_U};
use serde::Serialize;
use std::fmt;

/// Shift taps sent for sticky keys. More than five, since the host only ever
/// opens one dialog.
const STICKY_KEYS_TAPS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMethod {
    StickyKeys,
    UtilityManager,
}

impl EscalationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            EscalationMethod::StickyKeys => "sticky_keys",
            EscalationMethod::UtilityManager => "utility_manager",
        }
    }

    pub fn key_events(self) -> Vec<KeyEvent> {
        match self {
            EscalationMethod::StickyKeys => (0..STICKY_KEYS_TAPS)
                .flat_map(|_| tap(SCANCODE_LEFT_SHIFT))
                .collect(),
            EscalationMethod::UtilityManager => vec![
                KeyEvent::extended(SCANCODE_RIGHT_WIN, true),
                KeyEvent::scancode(SCANCODE_U, true),
                KeyEvent::extended(SCANCODE_RIGHT_WIN, false),
                KeyEvent::scancode(SCANCODE_U, false),
            ],
        }
    }
}

impl fmt::Display for EscalationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Methods still to try, consumed from the tail: the last entry runs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStack {
    methods: Vec<EscalationMethod>,
}

impl MethodStack {
    pub fn new(methods: Vec<EscalationMethod>) -> Self {
        Self { methods }
    }

    pub fn pop_next(&mut self) -> Option<EscalationMethod> {
        self.methods.pop()
    }

    pub fn peek_next(&self) -> Option<EscalationMethod> {
        self.methods.last().copied()
    }

    pub fn remaining(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for MethodStack {
    fn default() -> Self {
        Self::new(vec![
            EscalationMethod::UtilityManager,
            EscalationMethod::StickyKeys,
        ])
    }
}
