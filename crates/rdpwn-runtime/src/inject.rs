use crate::keys::{type_char, KeyEvent};
use crate::{RemoteDesktop, SessionResult};

pub const LINE_TERMINATOR: &str = "\r\n";

pub fn command_key_events<S: AsRef<str>>(commands: &[S]) -> Vec<KeyEvent> {
    let mut events = Vec::new();
    for command in commands {
        for ch in command.as_ref().chars().chain(LINE_TERMINATOR.chars()) {
            events.extend(type_char(ch));
        }
    }
    events
}

pub fn inject_commands<R, S>(client: &mut R, commands: &[S]) -> SessionResult<usize>
where
    R: RemoteDesktop + ?Sized,
    S: AsRef<str>,
{
    let events = command_key_events(commands);
    client.send_all(&events)?;
    Ok(events.len())
}
