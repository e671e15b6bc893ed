use clap::Args;
use color_eyre::eyre::Context;
use crazyradio::{MAX_RADIO_CHANNEL, Mode, Radio};

/// Find the channels where a receiver acks a probe packet.
#[derive(Args, Debug)]
pub struct Cmd {
    #[command(flatten)]
    params: crate::config::RadioParams,

    /// First channel to try
    #[arg(long, default_value_t = 0)]
    start: u8,

    /// Last channel to try
    #[arg(long, default_value_t = MAX_RADIO_CHANNEL)]
    stop: u8,

    /// Probe packet, as hex bytes
    #[arg(long, default_value = "ff", value_parser = crate::config::parse_hex)]
    packet: ::std::vec::Vec<u8>,
}

impl Cmd {
    pub fn cmd(&self, mut radio: Radio) -> color_eyre::Result<()> {
        self.params
            .configure(&mut radio)
            .wrap_err("Failed configuring the Crazyradio")?;
        radio
            .set_mode(Mode::Ptx)
            .wrap_err("Failed switching to PTX mode")?;

        let found = radio
            .scan_channels(self.start, self.stop, &self.packet)
            .wrap_err("Channel scan failed")?;
        if found.is_empty() {
            println!("No channel acked in {}-{}", self.start, self.stop);
        }
        for channel in found {
            println!("Channel {channel} ({} MHz)", 2400 + channel as u32);
        }

        radio.close();
        Ok(())
    }
}
