//! Radio parameters, with the range checks and wire encodings the firmware
//! expects.
//!
//! Everything here is checked before any USB traffic happens, so an invalid
//! setting never reaches the dongle.
use std::str::FromStr;

use crate::Error;
use crate::consts::*;

/// Over-the-air data rate.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataRate {
    /// 250 kbit/s, the longest range.
    Kbps250 = 0,
    /// 1 Mbit/s.
    Mbps1 = 1,
    /// 2 Mbit/s, the firmware default.
    #[default]
    Mbps2 = 2,
}

impl TryFrom<u16> for DataRate {
    type Error = Error;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Kbps250),
            1 => Ok(Self::Mbps1),
            2 => Ok(Self::Mbps2),
            v => Err(Error::range("data rate", 0..=2, v as u32)),
        }
    }
}

impl std::fmt::Display for DataRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kbps250 => f.write_str("250 kbps"),
            Self::Mbps1 => f.write_str("1 Mbps"),
            Self::Mbps2 => f.write_str("2 Mbps"),
        }
    }
}

/// Transmit power.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Power {
    /// -18 dBm
    Minus18dBm = 0,
    /// -12 dBm
    Minus12dBm = 1,
    /// -6 dBm
    Minus6dBm = 2,
    /// 0 dBm, the firmware default.
    #[default]
    Zero = 3,
}

impl TryFrom<u16> for Power {
    type Error = Error;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Minus18dBm),
            1 => Ok(Self::Minus12dBm),
            2 => Ok(Self::Minus6dBm),
            3 => Ok(Self::Zero),
            v => Err(Error::range("power level", 0..=3, v as u32)),
        }
    }
}

impl std::fmt::Display for Power {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minus18dBm => f.write_str("-18 dBm"),
            Self::Minus12dBm => f.write_str("-12 dBm"),
            Self::Minus6dBm => f.write_str("-6 dBm"),
            Self::Zero => f.write_str("0 dBm"),
        }
    }
}

/// Radio operating mode.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Primary transmitter. Packets written are sent, and acks are read back.
    #[default]
    Ptx = 0,
    /// Primary receiver. Received packets can be read.
    Prx = 2,
}

impl TryFrom<u16> for Mode {
    type Error = Error;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ptx),
            2 => Ok(Self::Prx),
            v => Err(Error::InvalidMode(v)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ptx => f.write_str("PTX"),
            Self::Prx => f.write_str("PRX"),
        }
    }
}

/// A 5-byte radio address, used for transmitting to or receiving from,
/// depending on the mode.
///
/// Parses from and displays as 10 hex digits. The default is `E7E7E7E7E7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 5]);

impl Default for Address {
    fn default() -> Self {
        Self([0xE7; 5])
    }
}

impl From<[u8; 5]> for Address {
    fn from(value: [u8; 5]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 5] = value
            .try_into()
            .map_err(|_| Error::InvalidParameter("Address must be exactly 5 bytes"))?;
        Ok(Self(bytes))
    }
}

impl FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if s.len() != 10 || !s.is_ascii() {
            return Err(Error::InvalidParameter(
                "Address must be exactly 10 hex digits",
            ));
        }
        let mut bytes = [0u8; 5];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = u8::from_str_radix(&s[2 * i..2 * i + 2], 16)
                .map_err(|_| Error::InvalidParameter("Address contains a non-hex digit"))?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

pub(crate) fn check_channel(channel: u8) -> Result<u16, Error> {
    if channel > MAX_CHANNEL {
        return Err(Error::range("channel", 0..=MAX_CHANNEL as u32, channel as u32));
    }
    Ok(channel as u16)
}

pub(crate) fn check_arc(count: u8) -> Result<u16, Error> {
    if count > MAX_ARC {
        return Err(Error::range("retry count", 0..=MAX_ARC as u32, count as u32));
    }
    Ok(count as u16)
}

/// Encode an auto-retry delay. The firmware waits `(n + 1) * 250` µs, so
/// delays between steps round down.
pub(crate) fn encode_ard_time(us: u16) -> Result<u16, Error> {
    if !(ARD_STEP_US..=MAX_ARD_US).contains(&us) {
        return Err(Error::range(
            "retry delay time (us)",
            ARD_STEP_US as u32..=MAX_ARD_US as u32,
            us as u32,
        ));
    }
    Ok(us / ARD_STEP_US - 1)
}

pub(crate) fn encode_ard_bytes(bytes: u8) -> Result<u16, Error> {
    if bytes > MAX_ARD_BYTES {
        return Err(Error::range(
            "retry packet size",
            0..=MAX_ARD_BYTES as u32,
            bytes as u32,
        ));
    }
    Ok(bytes as u16 | ARD_BYTES_FLAG)
}

pub(crate) fn check_scan_range(start: u8, stop: u8) -> Result<(u16, u16), Error> {
    let start = check_channel(start)?;
    let stop = check_channel(stop)?;
    if start > stop {
        return Err(Error::InvalidParameter(
            "Scan start channel is above the stop channel",
        ));
    }
    Ok((start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_range() {
        assert_eq!(check_channel(0).unwrap(), 0);
        assert_eq!(check_channel(126).unwrap(), 126);
        let err = check_channel(127).unwrap_err();
        assert!(matches!(err, Error::ValueRange { param: "channel", val: 127, .. }));
    }

    #[test]
    fn raw_conversions() {
        assert_eq!(DataRate::try_from(0).unwrap(), DataRate::Kbps250);
        assert_eq!(DataRate::try_from(2).unwrap(), DataRate::Mbps2);
        assert!(DataRate::try_from(3).is_err());

        assert_eq!(Power::try_from(3).unwrap(), Power::Zero);
        assert!(Power::try_from(4).is_err());

        assert_eq!(Mode::try_from(0).unwrap(), Mode::Ptx);
        assert_eq!(Mode::try_from(2).unwrap(), Mode::Prx);
        assert!(matches!(Mode::try_from(1), Err(Error::InvalidMode(1))));
        assert_eq!(Mode::Prx as u8, 2);
    }

    #[test]
    fn retry_count() {
        assert_eq!(check_arc(15).unwrap(), 15);
        assert!(check_arc(16).is_err());
    }

    #[test]
    fn retry_delay_time() {
        assert_eq!(encode_ard_time(250).unwrap(), 0);
        assert_eq!(encode_ard_time(500).unwrap(), 1);
        assert_eq!(encode_ard_time(600).unwrap(), 1);
        assert_eq!(encode_ard_time(4000).unwrap(), 15);
        assert!(encode_ard_time(4001).is_err());
        assert!(encode_ard_time(249).is_err());
    }

    #[test]
    fn retry_delay_bytes() {
        assert_eq!(encode_ard_bytes(0).unwrap(), 0x80);
        assert_eq!(encode_ard_bytes(32).unwrap(), 0xA0);
        assert!(encode_ard_bytes(33).is_err());
    }

    #[test]
    fn scan_range() {
        assert_eq!(check_scan_range(0, 125).unwrap(), (0, 125));
        assert_eq!(check_scan_range(7, 7).unwrap(), (7, 7));
        assert!(check_scan_range(10, 5).is_err());
        assert!(check_scan_range(0, 127).is_err());
    }

    #[test]
    fn address_parsing() {
        assert_eq!(Address::default().to_string(), "E7E7E7E7E7");
        let addr: Address = "0xE7e7E7E701".parse().unwrap();
        assert_eq!(addr, Address([0xE7, 0xE7, 0xE7, 0xE7, 0x01]));
        assert!("E7E7E7E7".parse::<Address>().is_err());
        assert!("E7E7E7E7ZZ".parse::<Address>().is_err());
        assert!(Address::try_from(&[1u8, 2, 3][..]).is_err());
        assert_eq!(
            Address::try_from(&[1u8, 2, 3, 4, 5][..]).unwrap(),
            Address([1, 2, 3, 4, 5])
        );
    }
}
