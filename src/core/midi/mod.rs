mod input;

pub use input::{translate, MidiBindings, MidiInputHandler};

use crate::settings::Settings;

impl From<&Settings> for MidiBindings {
    fn from(settings: &Settings) -> Self {
        Self {
            volume_up_cc: settings.volume_up_cc,
            volume_down_cc: settings.volume_down_cc,
        }
    }
}
