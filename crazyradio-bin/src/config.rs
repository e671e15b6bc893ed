use std::time::Duration;

use clap::Args;
use color_eyre::eyre::{Context, eyre};
use crazyradio::{Address, DataRate, Power, Radio};

#[derive(Args, Debug, Default)]
pub struct RadioParams {
    /// Radio channel, 0-126. Frequency is 2400 MHz + channel.
    #[arg(short, long)]
    channel: Option<u8>,

    /// Data rate: 250k, 1M, or 2M
    #[arg(short = 'r', long = "rate", value_parser = parse_data_rate)]
    data_rate: Option<DataRate>,

    /// Transmit power in dBm: -18, -12, -6, or 0
    #[arg(short, long, allow_hyphen_values = true, value_parser = parse_power)]
    power: Option<Power>,

    /// 5-byte radio address, as 10 hex digits
    #[arg(short, long)]
    address: Option<Address>,

    /// Enable or disable sending/expecting acks
    #[arg(long)]
    ack: Option<bool>,

    /// Number of auto-retries when no ack is received, 0-15
    #[arg(long)]
    arc: Option<u8>,

    /// Delay before auto-retry in µs, 250-4000 in 250µs steps
    #[arg(long = "ard_us", conflicts_with = "ard_bytes")]
    ard_us: Option<u16>,

    /// Delay before auto-retry as the ack payload length in bytes, 0-32
    #[arg(long = "ard_bytes")]
    ard_bytes: Option<u8>,

    /// Timeout for configuration requests, in milliseconds
    #[arg(long = "config_timeout")]
    config_timeout_ms: Option<u64>,
}

pub fn parse_data_rate(s: &str) -> Result<DataRate, String> {
    match s.to_ascii_lowercase().as_str() {
        "250k" | "250kbps" => Ok(DataRate::Kbps250),
        "1m" | "1mbps" => Ok(DataRate::Mbps1),
        "2m" | "2mbps" => Ok(DataRate::Mbps2),
        _ => Err(format!("unknown data rate `{s}`, expected 250k, 1M, or 2M")),
    }
}

pub fn parse_power(s: &str) -> Result<Power, String> {
    match s.trim_end_matches("dBm").trim_end_matches("dbm") {
        "-18" => Ok(Power::Minus18dBm),
        "-12" => Ok(Power::Minus12dBm),
        "-6" => Ok(Power::Minus6dBm),
        "0" => Ok(Power::Zero),
        _ => Err(format!("unknown power `{s}`, expected -18, -12, -6, or 0")),
    }
}

/// Parse a hex byte string like `ff01` or `0xFF01` into raw bytes.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err(String::from("hex data must have an even number of digits"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

impl RadioParams {
    pub fn configure(&self, radio: &mut Radio) -> color_eyre::Result<()> {
        if let Some(ms) = self.config_timeout_ms {
            if ms == 0 {
                return Err(eyre!("config_timeout must be at least 1 ms"));
            }
            radio.set_config_timeout(Duration::from_millis(ms));
        }

        if let Some(channel) = self.channel {
            radio
                .set_channel(channel)
                .wrap_err("Failed setting channel")?;
        }

        if let Some(rate) = self.data_rate {
            radio
                .set_data_rate(rate)
                .wrap_err("Failed setting data rate")?;
        }

        if let Some(power) = self.power {
            radio.set_power(power).wrap_err("Failed setting power")?;
        }

        if let Some(address) = self.address {
            radio
                .set_address(address)
                .wrap_err("Failed setting address")?;
        }

        if let Some(ack) = self.ack {
            radio
                .set_ack_enable(ack)
                .wrap_err("Failed setting ack enable on/off")?;
        }

        if let Some(arc) = self.arc {
            radio.set_arc(arc).wrap_err("Failed setting retry count")?;
        }

        if let Some(us) = self.ard_us {
            radio
                .set_ard_time(us)
                .wrap_err("Failed setting retry delay")?;
        }

        if let Some(bytes) = self.ard_bytes {
            radio
                .set_ard_bytes(bytes)
                .wrap_err("Failed setting retry delay")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_rates() {
        assert_eq!(parse_data_rate("250k").unwrap(), DataRate::Kbps250);
        assert_eq!(parse_data_rate("1M").unwrap(), DataRate::Mbps1);
        assert_eq!(parse_data_rate("2Mbps").unwrap(), DataRate::Mbps2);
        assert!(parse_data_rate("3M").is_err());
    }

    #[test]
    fn powers() {
        assert_eq!(parse_power("-18").unwrap(), Power::Minus18dBm);
        assert_eq!(parse_power("-6dBm").unwrap(), Power::Minus6dBm);
        assert_eq!(parse_power("0").unwrap(), Power::Zero);
        assert!(parse_power("3").is_err());
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(parse_hex("ff").unwrap(), vec![0xFF]);
        assert_eq!(parse_hex("0x01aB").unwrap(), vec![0x01, 0xAB]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
