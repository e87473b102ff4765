use crate::{KeyEvent, SessionResult};

pub trait RemoteDesktop {
    fn send_key_scancode(&mut self, code: u16, down: bool, extended: bool) -> SessionResult<()>;
    fn send_key_unicode(&mut self, code_point: u32, down: bool) -> SessionResult<()>;
    fn close(&mut self) -> SessionResult<()>;

    fn send(&mut self, event: KeyEvent) -> SessionResult<()> {
        match event {
            KeyEvent::Scancode {
                code,
                down,
                extended,
            } => self.send_key_scancode(code, down, extended),
            KeyEvent::Unicode { code_point, down } => self.send_key_unicode(code_point, down),
        }
    }

    fn send_all(&mut self, events: &[KeyEvent]) -> SessionResult<()> {
        for event in events {
            self.send(*event)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingClient {
    pub sent: Vec<KeyEvent>,
    pub close_calls: usize,
}

impl RemoteDesktop for RecordingClient {
    fn send_key_scancode(&mut self, code: u16, down: bool, extended: bool) -> SessionResult<()> {
        self.sent.push(KeyEvent::Scancode {
            code,
            down,
            extended,
        });
        Ok(())
    }

    fn send_key_unicode(&mut self, code_point: u32, down: bool) -> SessionResult<()> {
        self.sent.push(KeyEvent::Unicode { code_point, down });
        Ok(())
    }

    fn close(&mut self) -> SessionResult<()> {
        self.close_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::tap;

    #[test]
    fn send_all_preserves_order() {
        let mut client = RecordingClient::default();
        let events = [tap(0x2a), tap(0x01)].concat();
        client.send_all(&events).expect("send");
        assert_eq!(client.sent, events);
        assert_eq!(client.close_calls, 0);
    }
}
