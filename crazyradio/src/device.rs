//! Find and open Crazyradio dongles.
//!
//! Dongles are found by walking the USB device list for the Crazyradio
//! vendor/product ID pair:
//!
//! ```no_run
//! # fn main() -> Result<(), crazyradio::Error> {
//! for radio in crazyradio::list_radios()? {
//!     println!(
//!         "{} (serial {}), firmware {}",
//!         radio.model().unwrap_or("Crazyradio"),
//!         radio.serial().unwrap_or("unknown"),
//!         radio.firmware(),
//!     );
//! }
//! # Ok(())
//! # }
//! ```
use crate::consts::{CRAZYRADIO_USB_PID, CRAZYRADIO_USB_VID};
use crate::{Error, Radio, error::track};

/// Firmware version, as reported in the USB device descriptor's `bcdDevice`
/// field.
///
/// The upper byte holds the major version as two BCD digits, and the lower
/// byte holds two BCD digits of minor version, so `0x0352` is version 3.52.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareVersion(pub u16);

impl FirmwareVersion {
    /// The whole version in hundredths, so `0x0352` gives 352. Nibbles that
    /// aren't valid BCD digits carry over into the next place.
    fn hundredths(&self) -> u32 {
        let bcd = self.0 as u32;
        let major = 10 * (bcd >> 12) + ((bcd >> 8) & 0xF);
        major * 100 + 10 * ((bcd >> 4) & 0xF) + (bcd & 0xF)
    }

    /// Major version number.
    pub fn major(&self) -> u16 {
        (self.hundredths() / 100) as u16
    }

    /// Minor version, as a two-digit decimal (0-99).
    pub fn minor(&self) -> u16 {
        (self.hundredths() % 100) as u16
    }

    /// The version as a single number, i.e. `3.52`.
    pub fn as_f32(&self) -> f32 {
        self.hundredths() as f32 / 100.0
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

/// A Crazyradio device descriptor, which can be opened.
///
/// These are mostly returned from calling [`list_radios`], but can also be
/// formed by trying to convert a [`nusb::DeviceInfo`] into one.
pub struct RadioDescriptor {
    info: nusb::DeviceInfo,
}

impl RadioDescriptor {
    /// Get the serial number string of this radio.
    pub fn serial(&self) -> Option<&str> {
        self.info.serial_number()
    }

    /// Get the product string of this radio.
    pub fn model(&self) -> Option<&str> {
        self.info.product_string()
    }

    /// Get the firmware version.
    pub fn firmware(&self) -> FirmwareVersion {
        FirmwareVersion(self.info.device_version())
    }

    /// USB bus number the radio is attached to.
    pub fn bus_number(&self) -> u8 {
        self.info.bus_number()
    }

    /// USB device address on its bus.
    pub fn device_address(&self) -> u8 {
        self.info.device_address()
    }

    /// Try and open this radio, claiming its interface.
    pub fn open(self) -> Result<Radio, Error> {
        track(Radio::from_descriptor(self))
    }

    pub(crate) fn info(&self) -> &nusb::DeviceInfo {
        &self.info
    }
}

impl std::fmt::Debug for RadioDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioDescriptor")
            .field("serial", &self.serial())
            .field("model", &self.model())
            .field("firmware", &self.firmware())
            .field("bus", &self.bus_number())
            .field("address", &self.device_address())
            .finish()
    }
}

/// Try and turn any [`nusb::DeviceInfo`] descriptor into a Crazyradio, failing
/// if the VID and PID don't match.
impl TryFrom<nusb::DeviceInfo> for RadioDescriptor {
    type Error = &'static str;
    fn try_from(value: nusb::DeviceInfo) -> Result<Self, Self::Error> {
        check_ids(value.vendor_id(), value.product_id())?;
        Ok(RadioDescriptor { info: value })
    }
}

fn check_ids(vid: u16, pid: u16) -> Result<(), &'static str> {
    if vid != CRAZYRADIO_USB_VID {
        Err("VID doesn't match for Crazyradio")
    } else if pid != CRAZYRADIO_USB_PID {
        Err("VID recognized, PID not recognized")
    } else {
        Ok(())
    }
}

/// List all attached Crazyradio dongles, in USB enumeration order.
pub fn list_radios() -> Result<Vec<RadioDescriptor>, Error> {
    radio_debug!("Walking usb device list");
    let devices = track(nusb::list_devices().map_err(Error::from))?;
    Ok(devices
        .filter_map(|d| {
            radio_debug!("Found device {:04x}:{:04x}", d.vendor_id(), d.product_id());
            let radio = RadioDescriptor::try_from(d).ok()?;
            radio_debug!("Found crazyradio device");
            Some(radio)
        })
        .collect())
}

/// Pick one radio out of the enumerated ones. `None` takes the first.
pub(crate) fn select<T>(devices: Vec<T>, index: Option<usize>) -> Result<T, Error> {
    let found = devices.len();
    if found == 0 {
        return Err(Error::NoDevice);
    }
    let index = index.unwrap_or(0);
    devices
        .into_iter()
        .nth(index)
        .ok_or(Error::NotEnoughDevices { index, found })
}

/// Open a Crazyradio.
///
/// With `None`, this opens the first radio found. With `Some(n)`, it opens the
/// n-th radio (counting from 0) in USB enumeration order.
///
/// Fails with [`Error::NoDevice`] if no radios are attached at all, or with
/// [`Error::NotEnoughDevices`] if there are fewer than `n + 1`.
pub fn open_radio(index: Option<usize>) -> Result<Radio, Error> {
    let chosen = track(select(list_radios()?, index))?;
    radio_debug!("Claiming this USB device");
    chosen.open()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_version() {
        let v = FirmwareVersion(0x0352);
        assert_eq!(v.major(), 3);
        assert_eq!(v.minor(), 52);
        assert_eq!(v.to_string(), "3.52");
        assert!((v.as_f32() - 3.52).abs() < 1e-5);

        let v = FirmwareVersion(0x1205);
        assert_eq!(v.major(), 12);
        assert_eq!(v.to_string(), "12.05");
        assert!((v.as_f32() - 12.05).abs() < 1e-4);

        assert!(FirmwareVersion(0x0099) < FirmwareVersion(0x0100));

        // Non-BCD nibbles carry into the next digit
        let v = FirmwareVersion(0x01A0);
        assert_eq!(v.major(), 2);
        assert_eq!(v.minor(), 0);
        assert_eq!(v.to_string(), "2.00");
        assert_eq!(v.to_string(), format!("{:.2}", v.as_f32()));

        let v = FirmwareVersion(0x00FF);
        assert_eq!(v.to_string(), "1.65");
        assert_eq!(v.to_string(), format!("{:.2}", v.as_f32()));
    }

    #[test]
    fn vid_pid_match() {
        assert!(check_ids(0x1915, 0x7777).is_ok());
        assert_eq!(
            check_ids(0x1915, 0x7778),
            Err("VID recognized, PID not recognized")
        );
        assert_eq!(
            check_ids(0x1d50, 0x7777),
            Err("VID doesn't match for Crazyradio")
        );
    }

    #[test]
    fn device_selection() {
        assert!(matches!(select::<u8>(vec![], None), Err(Error::NoDevice)));
        assert!(matches!(select::<u8>(vec![], Some(3)), Err(Error::NoDevice)));
        assert_eq!(select(vec![10, 11, 12], None).unwrap(), 10);
        assert_eq!(select(vec![10, 11, 12], Some(2)).unwrap(), 12);
        assert!(matches!(
            select(vec![10, 11], Some(2)),
            Err(Error::NotEnoughDevices { index: 2, found: 2 })
        ));
    }
}
