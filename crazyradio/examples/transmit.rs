use std::time::Duration;

use anyhow::{Context, Result};
use crazyradio::{DataRate, Mode, log::LogLevel};

fn main() -> Result<()> {
    // Print everything up to debug level straight to stderr.
    let verbosity = LogLevel::Debug;
    crazyradio::log::set_log_method(move |level, msg| {
        if level <= verbosity {
            eprintln!("{msg}");
        }
    });

    // Optional radio index as the first argument, otherwise use the first one.
    let mut args = std::env::args();
    args.next();
    let index = args.next().map(|s| s.parse::<usize>()).transpose()?;

    eprintln!("transmit: version {}", env!("CARGO_PKG_VERSION"));

    let mut radio = crazyradio::open_radio(index).with_context(|| {
        format!(
            "could not open device: {}",
            crazyradio::last_error_string()
        )
    })?;

    println!("Found device: {}", radio.model().unwrap_or("unknown"));
    println!("Serial: {}", radio.serial().unwrap_or("unknown"));
    println!("Firmware Version: {}", radio.firmware());

    // Channel 100 at 250 kbps, transmitting
    radio.set_channel(100)?;
    radio.set_data_rate(DataRate::Kbps250)?;
    radio.set_mode(Mode::Ptx)?;

    for count in 0u64.. {
        // NUL-terminated, so C receivers can print it directly.
        let text = format!("test packet {count}");
        let mut packet = text.clone().into_bytes();
        packet.push(0);

        println!("Sending packet...");
        radio
            .write_packet(&packet, Some(Duration::from_secs(1)))
            .context("error writing")?;
        println!("Wrote packet: {text}");
        std::thread::sleep(Duration::from_secs(5));
    }
    Ok(())
}
