use std::time::Duration;

use clap::Args;
use color_eyre::eyre::Context;
use crazyradio::{Mode, Radio};
use tracing::{debug, warn};

/// Consecutive failed reads before giving up on the radio.
const MAX_READ_ERRORS: u32 = 10;

/// Receive packets in PRX mode and print them to stdout.
#[derive(Args, Debug)]
pub struct Cmd {
    #[command(flatten)]
    params: crate::config::RadioParams,

    /// Number of packets to receive (default is unlimited).
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Print packets as hex instead of text
    #[arg(short = 'x', long)]
    hex: bool,

    /// How long each read waits before checking for a quit request, in ms
    #[arg(long = "poll_ms", default_value_t = 100)]
    poll_ms: u64,
}

/// Render a packet for printing. Text stops at the first NUL.
pub fn format_packet(data: &[u8], hex: bool) -> String {
    if hex {
        data.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
    } else {
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        String::from_utf8_lossy(&data[..end]).into_owned()
    }
}

impl Cmd {
    pub fn cmd(&self, mut radio: Radio) -> color_eyre::Result<()> {
        self.params
            .configure(&mut radio)
            .wrap_err("Failed configuring the Crazyradio")?;
        radio
            .set_mode(Mode::Prx)
            .wrap_err("Failed switching to PRX mode")?;

        let quit = crate::os_signal::quit_watch()?;
        let poll = Duration::from_millis(self.poll_ms.max(1));
        let mut buf = [0u8; 64];
        let mut received = 0u64;
        let mut errors = 0;

        while !quit.requested() {
            if self.count.is_some_and(|max| received >= max) {
                break;
            }
            let len = match radio.read_packet(&mut buf, Some(poll)) {
                Ok(len) => {
                    errors = 0;
                    len
                }
                Err(e) => {
                    errors += 1;
                    if errors >= MAX_READ_ERRORS {
                        return Err(e).wrap_err("Receiving keeps failing, giving up");
                    }
                    warn!("Radio receive error: {}", e);
                    continue;
                }
            };
            if len == 0 {
                continue;
            }
            received += 1;
            debug!("Packet {} is {} bytes", received, len);
            println!("{}", format_packet(&buf[..len], self.hex));
        }

        radio.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_text() {
        assert_eq!(format_packet(b"test packet 1\0junk", false), "test packet 1");
        assert_eq!(format_packet(b"no nul", false), "no nul");
        assert_eq!(format_packet(&[0x01, 0xab, 0x00], true), "01 ab 00");
        assert_eq!(format_packet(&[], true), "");
    }
}
