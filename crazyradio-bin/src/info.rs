use clap::Args;
use color_eyre::eyre::Context;
use crazyradio::{RadioDescriptor, list_radios};

/// List every attached Crazyradio.
#[derive(Args, Debug)]
pub struct Cmd {
    /// Also open each radio, to check that it can be claimed
    #[arg(short, long)]
    open: bool,
}

fn describe(index: usize, dev: &RadioDescriptor) -> String {
    format!(
        "#{index}: {} | serial {} | firmware {} | bus {:03} address {:03}",
        dev.model().unwrap_or("Crazyradio"),
        dev.serial().unwrap_or("unknown"),
        dev.firmware(),
        dev.bus_number(),
        dev.device_address(),
    )
}

impl Cmd {
    pub fn cmd(&self, filter_index: Option<usize>) -> color_eyre::Result<()> {
        println!("Binary release {}", env!("CARGO_PKG_VERSION"));

        let devices = list_radios().wrap_err("Couldn't enumerate Crazyradio devices")?;
        if devices.is_empty() {
            println!("Couldn't find any Crazyradio dongles");
            return Ok(());
        }

        let found = devices.len();
        let mut shown = false;
        for (index, dev) in devices.into_iter().enumerate() {
            if filter_index.is_some_and(|i| i != index) {
                continue;
            }
            shown = true;
            println!("{}", describe(index, &dev));
            if self.open {
                match dev.open() {
                    Ok(radio) => {
                        println!("    Opened and claimed interface");
                        radio.close();
                    }
                    Err(e) => println!("    Couldn't open: {e}"),
                }
            }
        }

        if !shown {
            if let Some(i) = filter_index {
                println!("Unable to locate Crazyradio #{i}, only {found} attached");
            }
        }
        Ok(())
    }
}
