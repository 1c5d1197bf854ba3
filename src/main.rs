use anyhow::{Context, Result};
use std::path::PathBuf;
use std::thread;

use keyphone::core::console;
use keyphone::core::midi::{MidiBindings, MidiInputHandler};
use keyphone::core::playback::CpalDevice;
use keyphone::core::Instrument;
use keyphone::messaging::MessageBus;
use keyphone::settings::Settings;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting keyphone v{}", env!("CARGO_PKG_VERSION"));

    let path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => Settings::default_path()?,
    };
    let settings = Settings::load_or_create(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    // Declared before the instrument so the stream outlives the playback worker
    let output = CpalDevice::open(settings.sample_rate, settings.channels)
        .context("failed to open audio output")?;
    let mut instrument = Instrument::new(&settings, output.writer())?;
    let bus = MessageBus::new();

    log::info!("MIDI inputs: {:?}", MidiInputHandler::list_ports());
    let mut midi = MidiInputHandler::new(bus.sender(), MidiBindings::from(&settings));
    let midi_connected = match midi.connect(settings.midi_port.as_deref()) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("{}, continuing with console input only", err);
            false
        }
    };

    // With MIDI connected, closing stdin does not end the session
    let sender = bus.sender();
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            console::read_commands(std::io::stdin().lock(), &sender, !midi_connected)
        })?;

    let result = bus.run(&mut instrument);
    midi.disconnect();
    result.context("playback stopped")
}
