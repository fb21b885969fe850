//! Decoding of keyboard input read from a raw terminal.

use nix::errno::Errno;
use std::io::{self, Read};

use super::PromptError;

/// One decoded key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Printable character.
    Char(char),
    /// Carriage return or line feed.
    Enter,
    /// DEL, backspace or the delete key.
    Backspace,
    /// Horizontal tab.
    Tab,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Escape not followed by a known sequence.
    Escape,
    /// Ctrl+C.
    Interrupt,
    /// Anything else.
    Other,
}

/// Read one key press from `reader`.
///
/// A lone ESC blocks until the next byte arrives, since the decoder has no
/// notion of time.
pub fn read_input(reader: &mut dyn Read) -> Result<Input, PromptError> {
    let byte = read_byte(reader)?;
    let input = match byte {
        0x03 => Input::Interrupt,
        b'\r' | b'\n' => Input::Enter,
        0x7f | 0x08 => Input::Backspace,
        b'\t' => Input::Tab,
        0x1b => read_escape(reader)?,
        0x20..=0x7e => Input::Char(char::from(byte)),
        0x00..=0x1f => Input::Other,
        lead => read_utf8(reader, lead)?,
    };
    Ok(input)
}

/// Read one byte, mapping a hung-up terminal to end of input.
pub fn read_byte(reader: &mut dyn Read) -> Result<u8, PromptError> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Err(PromptError::Eof),
            Ok(_) => {
                let [byte] = buf;
                return Ok(byte);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.raw_os_error() == Some(Errno::EIO as i32) => {
                return Err(PromptError::Eof);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_escape(reader: &mut dyn Read) -> Result<Input, PromptError> {
    if read_byte(reader)? != b'[' {
        return Ok(Input::Escape);
    }
    let input = match read_byte(reader)? {
        b'A' => Input::Up,
        b'B' => Input::Down,
        b'C' => Input::Right,
        b'D' => Input::Left,
        b'3' => {
            // ESC [ 3 ~
            read_byte(reader)?;
            Input::Backspace
        }
        _ => Input::Other,
    };
    Ok(input)
}

fn read_utf8(reader: &mut dyn Read, lead: u8) -> Result<Input, PromptError> {
    let width = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Ok(Input::Other),
    };
    let mut bytes = vec![lead];
    for _ in 1..width {
        bytes.push(read_byte(reader)?);
    }
    Ok(String::from_utf8(bytes)
        .ok()
        .and_then(|text| text.chars().next())
        .map_or(Input::Other, Input::Char))
}
