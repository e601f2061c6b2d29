use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "deckclock-out";
const CONNECTION_NAME: &str = "deckclock-output-conn";

pub struct MidirEngine {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirEngine {
    /// Connects to the first output port whose name contains `device_name`,
    /// or to the first available port when no name is given.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let out_ports = midi_out.ports();
        let available: Vec<String> = out_ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();
        debug!("Available MIDI output ports: {:?}", available);

        let port = match device_name {
            Some(name) => out_ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
                .ok_or_else(|| MidiError::DeviceNotFound(name.to_string()))?,
            None => out_ports
                .first()
                .ok_or_else(|| MidiError::DeviceNotFound("no output ports".to_string()))?,
        };

        let port_name = midi_out
            .port_name(port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        info!("Connecting to MIDI output port: {}", port_name);

        let connection = midi_out
            .connect(port, CONNECTION_NAME)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        Ok(MidirEngine {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        let bytes = msg.to_bytes();
        debug!("Sending MIDI bytes to {}: {:02X?}", self.port_name, bytes);
        self.connection
            .send(&bytes)
            .map_err(|e| MidiError::SendError(e.to_string()))
    }
}

/// Names of all MIDI output ports currently visible
pub fn list_output_devices() -> Vec<String> {
    match MidiOutput::new("deckclock-port-lister") {
        Ok(midi_out) => midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect(),
        Err(_) => vec![],
    }
}
