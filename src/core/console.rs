//! Line-based input for playing without a MIDI controller.
//!
//! ```text
//! on 0      strike A4 (offset in semitones)
//! off 0     release it
//! up | +    volume up one step
//! down | -  volume down one step
//! quit | q
//! ```

use std::io::BufRead;

use crossbeam_channel::Sender;

use crate::core::tone::Tone;
use crate::messaging::InstrumentMessage;

pub fn parse_command(line: &str) -> Option<InstrumentMessage> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let offset = words.next().and_then(|word| word.parse::<i32>().ok());

    match (command.to_ascii_lowercase().as_str(), offset) {
        ("on", Some(offset)) => Some(InstrumentMessage::NoteOn(Tone::new(offset))),
        ("off", Some(offset)) => Some(InstrumentMessage::NoteOff(Tone::new(offset))),
        ("up" | "+", _) => Some(InstrumentMessage::VolumeUp),
        ("down" | "-", _) => Some(InstrumentMessage::VolumeDown),
        ("quit" | "q", _) => Some(InstrumentMessage::Quit),
        _ => None,
    }
}

/// Forward commands read from `input` until it ends or the bus goes away.
/// End of input counts as `Quit` when `quit_on_eof` is set, for runs where
/// the console is the only input.
pub fn read_commands(
    input: impl BufRead,
    sender: &Sender<InstrumentMessage>,
    quit_on_eof: bool,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to read console input: {}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(msg) => {
                if sender.send(msg).is_err() || msg == InstrumentMessage::Quit {
                    return;
                }
            }
            None => log::warn!("unrecognised command: {}", line.trim()),
        }
    }
    if quit_on_eof {
        sender.send(InstrumentMessage::Quit).ok();
    } else {
        log::info!("console input closed, still listening for MIDI");
    }
}
