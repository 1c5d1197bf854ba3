use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection};

use crate::core::tone::Tone;
use crate::error::{Error, Result};
use crate::messaging::InstrumentMessage;

const CLIENT_NAME: &str = "keyphone MIDI input";

/// Which control changes step the volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiBindings {
    pub volume_up_cc: u8,
    pub volume_down_cc: u8,
}

/// Handles MIDI input from connected devices
pub struct MidiInputHandler {
    connection: Option<MidiInputConnection<()>>,
    bindings: MidiBindings,
    message_sender: Sender<InstrumentMessage>,
}

impl MidiInputHandler {
    pub fn new(message_sender: Sender<InstrumentMessage>, bindings: MidiBindings) -> Self {
        Self {
            connection: None,
            bindings,
            message_sender,
        }
    }

    /// List the names of all available MIDI input ports
    pub fn list_ports() -> Vec<String> {
        match MidiInput::new(CLIENT_NAME) {
            Ok(midi_in) => midi_in
                .ports()
                .iter()
                .filter_map(|port| midi_in.port_name(port).ok())
                .collect(),
            Err(err) => {
                log::error!("Error initializing MIDI input: {}", err);
                Vec::new()
            }
        }
    }

    /// Connect to the port called `port_name`, or to the first port if `None`.
    /// Returns the name of the connected port.
    pub fn connect(&mut self, port_name: Option<&str>) -> Result<String> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|err| Error::Midi(format!("failed to create MIDI input: {}", err)))?;

        let ports = midi_in.ports();
        let port = match port_name {
            Some(name) => ports.into_iter().find(|port| {
                midi_in
                    .port_name(port)
                    .map(|candidate| candidate == name)
                    .unwrap_or(false)
            }),
            None => ports.into_iter().next(),
        }
        .ok_or_else(|| match port_name {
            Some(name) => Error::Midi(format!("MIDI port '{}' not found", name)),
            None => Error::Midi("no MIDI input ports available".to_string()),
        })?;
        let name = midi_in
            .port_name(&port)
            .map_err(|err| Error::Midi(err.to_string()))?;

        let sender = self.message_sender.clone();
        let bindings = self.bindings;
        let connection = midi_in
            .connect(
                &port,
                "keyphone-read-input",
                move |_stamp, message, _| {
                    if let Some(msg) = translate(message, &bindings) {
                        sender.send(msg).ok();
                    }
                },
                (),
            )
            .map_err(|err| Error::Midi(format!("failed to connect to MIDI port: {}", err)))?;

        log::info!("Connected to MIDI port {}", name);
        self.connection = Some(connection);
        Ok(name)
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

/// Turn a raw MIDI message into an instrument event. Channel is ignored.
pub fn translate(message: &[u8], bindings: &MidiBindings) -> Option<InstrumentMessage> {
    if message.len() < 3 {
        return None;
    }

    let status = message[0] & 0xF0;
    match status {
        0x80 => Some(InstrumentMessage::NoteOff(Tone::from_midi(message[1]))),
        0x90 => {
            let tone = Tone::from_midi(message[1]);
            // Note On with velocity 0 is a Note Off
            if message[2] == 0 {
                Some(InstrumentMessage::NoteOff(tone))
            } else {
                Some(InstrumentMessage::NoteOn(tone))
            }
        }
        0xB0 => {
            let (control, value) = (message[1], message[2]);
            if value < 64 {
                None
            } else if control == bindings.volume_up_cc {
                Some(InstrumentMessage::VolumeUp)
            } else if control == bindings.volume_down_cc {
                Some(InstrumentMessage::VolumeDown)
            } else {
                None
            }
        }
        _ => None,
    }
}
