pub const SCANCODE_ESCAPE: u16 = 0x01;
pub const SCANCODE_U: u16 = 0x16;
pub const SCANCODE_LEFT_SHIFT: u16 = 0x2a;
/// Right Windows key; sent with the extended flag.
pub const SCANCODE_RIGHT_WIN: u16 = 0x5c;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Scancode { code: u16, down: bool, extended: bool },
    Unicode { code_point: u32, down: bool },
}

impl KeyEvent {
    pub fn scancode(code: u16, down: bool) -> Self {
        KeyEvent::Scancode {
            code,
            down,
            extended: false,
        }
    }

    pub fn extended(code: u16, down: bool) -> Self {
        KeyEvent::Scancode {
            code,
            down,
            extended: true,
        }
    }

    pub fn is_down(&self) -> bool {
        match self {
            KeyEvent::Scancode { down, .. } | KeyEvent::Unicode { down, .. } => *down,
        }
    }
}

pub fn tap(code: u16) -> [KeyEvent; 2] {
    [KeyEvent::scancode(code, true), KeyEvent::scancode(code, false)]
}

pub fn type_char(ch: char) -> [KeyEvent; 2] {
    let code_point = ch as u32;
    [
        KeyEvent::Unicode {
            code_point,
            down: true,
        },
        KeyEvent::Unicode {
            code_point,
            down: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_presses_then_releases() {
        let [down, up] = tap(SCANCODE_ESCAPE);
        assert_eq!(down, KeyEvent::scancode(0x01, true));
        assert_eq!(up, KeyEvent::scancode(0x01, false));
        assert!(down.is_down());
        assert!(!up.is_down());
    }

    #[test]
    fn type_char_uses_code_point() {
        let [down, up] = type_char('é');
        assert_eq!(
            down,
            KeyEvent::Unicode {
                code_point: 0xe9,
                down: true
            }
        );
        assert!(!up.is_down());
    }
}
