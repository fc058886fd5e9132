use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod artnet;
mod config;
mod controller;
mod message;
mod monitor;
mod prompt;
mod ramp;
mod universe;

use config::Config;
use controller::{run_sequence, RampController};
use monitor::MonitorServer;
use prompt::Prompt;
use ramp::Phase;
use universe::DmxUniverse;

#[derive(Parser)]
#[command(name = "dmx_ramp")]
#[command(about = "Ramps a DMX channel on a lighting node over TCP\n\nWith no command: reset, then ramp up and down, pausing for enter between phases.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Lighting node address
    #[arg(long, global = true)]
    host: Option<String>,

    /// Lighting node port (monitor, artnet: listen port)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Channel byte sent with every value
    #[arg(long, global = true)]
    channel: Option<u8>,

    /// Delay after each ramp step in milliseconds
    #[arg(long, global = true)]
    step_ms: Option<u64>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Enable detailed debug (every message)
    #[arg(long, global = true)]
    ddebug: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Reset, ramp up, ramp down with prompts in between (default)
    Run,
    /// Send a single zero
    Reset,
    /// Ramp from 0 to 255
    Up,
    /// Ramp from 255 to 0
    Down,
    /// Listen like the lighting node and apply received messages to a DMX universe
    Monitor,
    /// Listen for Art-Net ArtDmx on UDP and apply universe 0
    Artnet,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let listening = matches!(self.command, Some(Command::Monitor | Command::Artnet));
        if let Some(host) = &self.host {
            if listening {
                config.monitor.host = host.clone();
            } else {
                config.controller.host = host.clone();
            }
        }
        if let Some(port) = self.port {
            match self.command {
                Some(Command::Monitor) => config.monitor.port = port,
                Some(Command::Artnet) => config.monitor.artnet_port = port,
                _ => config.controller.port = port,
            }
        }
        if let Some(channel) = self.channel {
            config.controller.channel = channel;
        }
        if let Some(step_ms) = self.step_ms {
            config.controller.step_ms = step_ms;
        }
        Ok(config)
    }
}

fn init_logging(debug: bool, ddebug: bool) {
    let level = if ddebug {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn run_monitor(config: Config, artnet: bool, stats: bool) -> Result<()> {
    let universe = Arc::new(Mutex::new(DmxUniverse::new()));
    let server = MonitorServer::new(config.monitor, Arc::clone(&universe));

    let running = server.get_running_flag();
    let result = ctrlc::set_handler(move || {
        log::info!("Shutting down...");
        running.store(false, std::sync::atomic::Ordering::Relaxed);
    });
    if let Err(e) = result {
        log::warn!("Could not set Ctrl-C handler: {}", e);
    }

    // Blocks until Ctrl-C
    if artnet {
        server.run_artnet(stats)?;
    } else {
        server.run(stats)?;
    }
    log::info!("Monitor stopped after {} messages", server.messages_received());

    let universe = universe
        .lock()
        .map_err(|_| anyhow::anyhow!("Universe lock poisoned"))?;
    for (slot, value) in universe.active_slots() {
        log::info!("slot {} = {}", slot, value);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ddebug implies debug
    let debug = cli.debug || cli.ddebug;
    init_logging(debug, cli.ddebug);

    let config = cli.load_config()?;
    log::debug!("{:?}", config);

    let controller = RampController::new(config.controller.clone());
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let stdin = io::stdin();
            let mut prompt = Prompt::new(stdin.lock(), io::stdout());
            run_sequence(&controller, &mut prompt)?;
        }
        Command::Reset => {
            controller.run_phase(Phase::Reset)?;
        }
        Command::Up => {
            controller.run_phase(Phase::RampUp)?;
        }
        Command::Down => {
            controller.run_phase(Phase::RampDown)?;
        }
        Command::Monitor => run_monitor(config, false, debug)?,
        Command::Artnet => run_monitor(config, true, debug)?,
    }

    Ok(())
}
