use crossbeam_channel::{unbounded, Receiver, Sender};

use super::InstrumentMessage;
use crate::core::instrument::Instrument;
use crate::error::{Error, Result};

/// MessageBus carries events from the input threads to the instrument
pub struct MessageBus {
    sender: Sender<InstrumentMessage>,
    receiver: Receiver<InstrumentMessage>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        MessageBus { sender, receiver }
    }

    /// Get a sender that can be cloned and passed to input handlers
    pub fn sender(&self) -> Sender<InstrumentMessage> {
        self.sender.clone()
    }

    /// Dispatch messages to `instrument` until `Quit` arrives.
    ///
    /// Returns an error once the playback device is gone, since nothing
    /// played after that point would be heard.
    pub fn run(&self, instrument: &mut Instrument) -> Result<()> {
        while let Ok(msg) = self.receiver.recv() {
            if msg == InstrumentMessage::Quit {
                log::info!("quit requested");
                break;
            }
            self.handle_message(instrument, msg)?;
        }
        Ok(())
    }

    fn handle_message(&self, instrument: &mut Instrument, msg: InstrumentMessage) -> Result<()> {
        match msg {
            InstrumentMessage::NoteOn(tone) => match instrument.note_on(tone) {
                Ok(_) => {}
                Err(Error::InvalidTone(freq)) => {
                    log::warn!("ignoring {}: invalid frequency {}", tone, freq);
                }
                Err(err) => return Err(err),
            },
            InstrumentMessage::NoteOff(tone) => instrument.note_off(tone),
            InstrumentMessage::VolumeUp => {
                instrument.volume_up();
            }
            InstrumentMessage::VolumeDown => {
                instrument.volume_down();
            }
            InstrumentMessage::Quit => {}
        }
        Ok(())
    }
}
