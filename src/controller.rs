use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::net::TcpStream;
use std::thread;

use crate::config::ControllerConfig;
use crate::message::ControlMessage;
use crate::prompt::Prompt;
use crate::ramp::Phase;

/// Sends ramp phases to the lighting node, one connection per phase
pub struct RampController {
    config: ControllerConfig,
}

impl RampController {
    pub fn new(config: ControllerConfig) -> Self {
        RampController { config }
    }

    /// Send a single zero
    pub fn reset(&self) -> Result<usize> {
        self.run_phase(Phase::Reset)
    }

    /// Send 0 through 255
    pub fn ramp_up(&self) -> Result<usize> {
        self.run_phase(Phase::RampUp)
    }

    /// Send 255 down to 0
    pub fn ramp_down(&self) -> Result<usize> {
        self.run_phase(Phase::RampDown)
    }

    /// Connect, send every value of `phase`, close. Returns the number of messages sent.
    pub fn run_phase(&self, phase: Phase) -> Result<usize> {
        let addr = self.config.addr();
        let mut stream = self.connect(&addr)?;
        log::debug!("{}: connected to {}", phase, addr);

        let delay = self.config.step_delay();
        let mut sent = 0;
        for value in phase.values() {
            let msg = ControlMessage::new(self.config.channel, value);
            let bytes = msg.encode();
            log::trace!("{} -> {:02x} {:02x}", addr, bytes[0], bytes[1]);

            stream
                .write_all(&bytes)
                .with_context(|| format!("{}: failed to send {:?} to {}", phase, msg, addr))?;
            sent += 1;

            if phase.is_ramp() {
                thread::sleep(delay);
            }
        }

        log::info!("{}: sent {} messages to {}", phase, sent, addr);
        Ok(sent)
    }

    fn connect(&self, addr: &str) -> Result<TcpStream> {
        let stream =
            TcpStream::connect(addr).with_context(|| format!("Failed to connect to {}", addr))?;
        stream
            .set_nodelay(true)
            .context("Failed to set TCP_NODELAY")?;
        Ok(stream)
    }
}

/// Reset, then ramp up and down, waiting for confirmation before each ramp
pub fn run_sequence<R: BufRead, W: Write>(
    controller: &RampController,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    controller.reset()?;
    prompt.confirm("press enter to ramp up")?;
    controller.ramp_up()?;
    prompt.confirm("press enter to ramp down")?;
    controller.ramp_down()?;
    Ok(())
}
