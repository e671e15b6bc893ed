use std::time::Duration;

use clap::Args;
use color_eyre::eyre::{Context, eyre};
use crazyradio::{Mode, Radio};
use tracing::warn;

/// Largest payload the radio can put in one packet.
const MAX_PAYLOAD: usize = 32;

/// Send numbered text packets in PTX mode.
#[derive(Args, Debug)]
pub struct Cmd {
    #[command(flatten)]
    params: crate::config::RadioParams,

    /// Text to send. Each packet gets a sequence number appended.
    #[arg(short, long, default_value = "test packet")]
    message: String,

    /// Number of packets to send (default is unlimited).
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Time between packets, in milliseconds
    #[arg(short, long = "interval_ms", default_value_t = 1000)]
    interval_ms: u64,

    /// How long to wait for the dongle to take each packet, in milliseconds
    #[arg(short, long = "timeout_ms", default_value_t = 1000)]
    timeout_ms: u64,
}

/// Build the `seq`-th packet: the message, a space, the number, and a NUL.
pub fn build_packet(message: &str, seq: u64) -> color_eyre::Result<Vec<u8>> {
    let mut packet = format!("{message} {seq}").into_bytes();
    packet.push(0);
    if packet.len() > MAX_PAYLOAD {
        return Err(eyre!(
            "Packet is {} bytes, but at most {MAX_PAYLOAD} fit in one radio packet",
            packet.len()
        ));
    }
    Ok(packet)
}

impl Cmd {
    pub fn cmd(&self, mut radio: Radio) -> color_eyre::Result<()> {
        self.params
            .configure(&mut radio)
            .wrap_err("Failed configuring the Crazyradio")?;
        radio
            .set_mode(Mode::Ptx)
            .wrap_err("Failed switching to PTX mode")?;

        let quit = crate::os_signal::quit_watch()?;
        let interval = Duration::from_millis(self.interval_ms);
        let timeout = Duration::from_millis(self.timeout_ms);

        let mut seq = 0u64;
        while !quit.requested() {
            if self.count.is_some_and(|max| seq >= max) {
                break;
            }
            let packet = build_packet(&self.message, seq)?;
            match radio.write_packet(&packet, Some(timeout)) {
                Ok(n) if n == packet.len() => println!("Sent packet {seq}"),
                Ok(n) => warn!("Packet {} only partly sent ({}/{} bytes)", seq, n, packet.len()),
                Err(e) => warn!("Radio send error: {}", e),
            }
            seq += 1;
            if !quit.sleep(interval) {
                break;
            }
        }

        radio.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packets() {
        assert_eq!(build_packet("test packet", 3).unwrap(), b"test packet 3\0");
        assert!(build_packet(&"x".repeat(40), 0).is_err());
        assert_eq!(build_packet(&"x".repeat(28), 9).unwrap().len(), 31);
    }
}
