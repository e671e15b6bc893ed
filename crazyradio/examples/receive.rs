use anyhow::{Context, Result};
use crazyradio::{DataRate, Mode};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Optional radio index as the first argument, otherwise use the first one.
    let mut args = std::env::args();
    args.next();
    let index = args.next().map(|s| s.parse::<usize>()).transpose()?;

    eprintln!("receive: version {}", env!("CARGO_PKG_VERSION"));

    let mut radio = crazyradio::open_radio(index).with_context(|| {
        format!(
            "could not open device: {}",
            crazyradio::last_error_string()
        )
    })?;

    println!("Found device: {}", radio.model().unwrap_or("unknown"));
    println!("Serial: {}", radio.serial().unwrap_or("unknown"));
    println!("Firmware Version: {}", radio.firmware());

    // Channel 100 at 250 kbps, receiving
    radio.set_channel(100)?;
    radio.set_data_rate(DataRate::Kbps250)?;
    radio.set_mode(Mode::Prx)?;

    let mut buf = [0u8; 64];
    loop {
        let len = radio
            .read_packet(&mut buf, None)
            .context("error reading")?;
        let text = String::from_utf8_lossy(&buf[..len]);
        println!(
            "received {len} bytes of data: {}",
            text.trim_end_matches('\0')
        );
    }
}
