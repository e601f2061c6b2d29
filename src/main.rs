use clap::Parser;
use crossbeam::channel::{self, RecvTimeoutError};
use deckclock::{
    cli::{validate_device, Args},
    handle_device_list, logging,
    midi::DefaultMidiEngine,
    simulation::DeckSimulation,
    ui::{create_clock_spinner, update_clock_spinner},
    ClockError, DeckClock, InMemoryHost, Settings, ThreadScheduler,
};
use dialoguer::Select;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

const STATUS_REFRESH: Duration = Duration::from_millis(100);

fn main() {
    let args = parse_command_line_arguments();

    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&format!("Configuration error: {}", e)),
    };
    args.apply_to(&mut settings);
    if let Err(e) = settings.validate() {
        exit_with_error(&e.to_string());
    }

    initialize_logging(&settings);
    log::info!(
        "Configuration loaded from {}",
        Settings::source_description(args.config.as_deref())
    );
    log::debug!("Settings: {:?}", settings);
    let devices = handle_device_list();

    if args.device_list {
        list_available_devices(&devices);
        return;
    }

    if let Some(device_name) = &settings.output_device {
        if let Err(error_msg) = validate_device(device_name, &devices) {
            exit_with_error(&error_msg);
        }
    }

    let output = choose_output_device(&settings, &devices);
    if let Err(e) = run(&args, &settings, output) {
        exit_with_error(&format!("Error: {}", e));
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn initialize_logging(settings: &Settings) {
    if let Err(e) = logging::init_logger(settings.level_filter()) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Application starting");
}

fn exit_with_error(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI output devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

/// Configured device, or an interactive pick when several ports exist
fn choose_output_device(settings: &Settings, devices: &[String]) -> Option<String> {
    if settings.output_device.is_some() {
        return settings.output_device.clone();
    }
    if devices.len() < 2 || !std::io::stdin().is_terminal() {
        return None;
    }

    match Select::new()
        .with_prompt("Select MIDI output")
        .items(devices)
        .default(0)
        .interact()
    {
        Ok(index) => devices.get(index).cloned(),
        Err(e) => {
            log::warn!("Device selection cancelled: {}", e);
            None
        }
    }
}

fn run(args: &Args, settings: &Settings, output: Option<String>) -> deckclock::Result<()> {
    let engine = DefaultMidiEngine::new(output.as_deref())?;
    println!("Connected to MIDI output: {}", engine.port_name());

    let host = InMemoryHost::new();
    let _simulation = match args.simulation_bpm()? {
        Some(bpm) => {
            let channel = settings
                .channel_list()
                .into_iter()
                .next()
                .ok_or_else(|| ClockError::InvalidConfig("no channels configured".to_string()))?;
            Some(DeckSimulation::start(host.clone(), channel, bpm))
        }
        None => {
            log::info!("No deck simulation requested; the clock will send idle messages");
            None
        }
    };

    let mut clock =
        DeckClock::from_settings(settings, Arc::new(host), engine, ThreadScheduler::new())?;

    let (stop_tx, stop_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .map_err(|e| ClockError::Signal(e.to_string()))?;

    clock.init()?;
    log::info!("Application running. Press Ctrl+C to exit...");
    println!("\nPress Ctrl+C to exit...");

    let spinner = create_clock_spinner();
    loop {
        match stop_rx.recv_timeout(STATUS_REFRESH) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                update_clock_spinner(&spinner, clock.last_report().as_ref());
            }
        }
    }
    spinner.finish_and_clear();

    clock.shutdown()?;
    log::info!("Application stopped");
    Ok(())
}
