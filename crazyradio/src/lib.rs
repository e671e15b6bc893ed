/*!

This is a small blocking host crate for the [Crazyradio][crazyradio] 2.4 GHz
USB dongle, made using the pure-rust [`nusb`] crate for USB interfacing.

[crazyradio]: https://www.bitcraze.io/products/crazyradio-pa/

The standard entry point for this library is [`open_radio()`], which opens the
first (or the n-th) attached Crazyradio. Configure it with the `set_*` calls on
[`Radio`], pick a [`Mode`], and then move packets with
[`read_packet`][Radio::read_packet] and [`write_packet`][Radio::write_packet].

Every call is a single USB vendor request or bulk transfer. The dongle's
firmware handles acknowledgments and retries on its own, as configured through
[`set_ack_enable`][Radio::set_ack_enable], [`set_arc`][Radio::set_arc], and
[`set_ard_time`][Radio::set_ard_time].

As for what using this library looks like in practice, here's a program that
sends a packet every second on channel 100:

```no_run
use std::time::Duration;

use anyhow::Result;
use crazyradio::{DataRate, Mode};

fn main() -> Result<()> {
    let mut radio = crazyradio::open_radio(None)?;
    println!("Found device: {}", radio.model().unwrap_or("Crazyradio"));
    println!("Firmware Version: {}", radio.firmware());

    radio.set_channel(100)?;
    radio.set_data_rate(DataRate::Kbps250)?;
    radio.set_mode(Mode::Ptx)?;

    for count in 0.. {
        let packet = format!("test packet {count}");
        let sent = radio.write_packet(packet.as_bytes(), Some(Duration::from_secs(1)))?;
        println!("Wrote {sent} bytes");
        std::thread::sleep(Duration::from_secs(1));
    }
    Ok(())
}
```

All calls block. Each [`Radio`] drives its transfers on its own
single-threaded runtime, so they must not be made from inside an async
executor's worker thread; use something like `spawn_blocking` there.

Failed calls also record their error as the thread's [last
error][last_error_string], and every step is logged through [`tracing`] and
through the optional callback installed with [`log::set_log_method`].

*/

#![warn(missing_docs)]

#[macro_use]
pub mod log;
mod consts;
mod device;
mod error;
mod params;

use std::time::Duration;

use nusb::transfer::{ControlIn, ControlOut, ControlType, Queue, Recipient, RequestBuffer};

use crate::consts::*;
use crate::error::track;

pub use crate::device::{FirmwareVersion, RadioDescriptor, list_radios, open_radio};
pub use crate::error::{
    Error, ErrorKind, LastError, clear_last_error, last_error, last_error_string,
};
pub use crate::params::{Address, DataRate, Mode, Power};

/// Crazyradio USB vendor ID.
pub const VENDOR_ID: u16 = CRAZYRADIO_USB_VID;
/// Crazyradio USB product ID.
pub const PRODUCT_ID: u16 = CRAZYRADIO_USB_PID;
/// Highest valid radio channel. Channel `n` sits at `2400 + n` MHz.
pub const MAX_RADIO_CHANNEL: u8 = MAX_CHANNEL;
/// Default timeout for configuration requests.
pub const DEFAULT_CONFIG_TIMEOUT: Duration = Duration::from_millis(DEFAULT_CONFIG_TIMEOUT_MS);

/// An open Crazyradio. This is the main struct for talking to the dongle.
///
/// The USB interface is released when this is dropped, or explicitly with
/// [`close`][Radio::close].
pub struct Radio {
    interface: nusb::Interface,
    rx: RxEndpoint,
    tx: TxEndpoint,
    rt: tokio::runtime::Runtime,
    config_timeout: Duration,
    firmware: FirmwareVersion,
    serial: Option<String>,
    model: Option<String>,
}

struct RxEndpoint {
    queue: Queue<RequestBuffer>,
    spare: Vec<u8>,
}

struct TxEndpoint {
    queue: Queue<Vec<u8>>,
    spare: Vec<u8>,
}

impl Radio {
    pub(crate) fn from_descriptor(desc: RadioDescriptor) -> Result<Self, Error> {
        let info = desc.info();
        let firmware = desc.firmware();
        let serial = desc.serial().map(str::to_owned);
        let model = desc.model().map(str::to_owned);

        radio_debug!("Opening device");
        let device = info.open()?;
        radio_debug!("Claiming interface");
        let interface = device.detach_and_claim_interface(0)?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let rx = RxEndpoint {
            queue: interface.bulk_in_queue(RX_ENDPOINT_ADDRESS),
            spare: Vec::new(),
        };
        let tx = TxEndpoint {
            queue: interface.bulk_out_queue(TX_ENDPOINT_ADDRESS),
            spare: Vec::new(),
        };

        radio_info!(
            "Opened {} (serial {}), firmware {}",
            model.as_deref().unwrap_or("Crazyradio"),
            serial.as_deref().unwrap_or("unknown"),
            firmware
        );

        Ok(Self {
            interface,
            rx,
            tx,
            rt,
            config_timeout: DEFAULT_CONFIG_TIMEOUT,
            firmware,
            serial,
            model,
        })
    }

    /// Get the firmware version.
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Get the serial number string, if the device reported one.
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Get the product string, if the device reported one.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get the timeout used for configuration requests.
    pub fn config_timeout(&self) -> Duration {
        self.config_timeout
    }

    /// Set the timeout used for configuration requests. Defaults to
    /// [`DEFAULT_CONFIG_TIMEOUT`].
    pub fn set_config_timeout(&mut self, timeout: Duration) {
        self.config_timeout = timeout;
        radio_debug!("set crazyradio config timeout to {:?}", timeout);
    }

    fn send_config(
        &self,
        req: ControlRequest,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), Error> {
        radio_debug!(
            "Performing control transfer with timeout of {:?}",
            self.config_timeout
        );
        let transfer = self.interface.control_out(ControlOut {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request: req as u8,
            value,
            index,
            data,
        });
        let resp = self
            .rt
            .block_on(async { tokio::time::timeout(self.config_timeout, transfer).await })
            .map_err(|_| Error::Timeout)?
            .into_result()?;
        check_config_len(data.len(), resp.actual_length())
    }

    fn read_config(
        &self,
        req: ControlRequest,
        value: u16,
        index: u16,
        length: u16,
    ) -> Result<Vec<u8>, Error> {
        radio_debug!(
            "Performing control read with timeout of {:?}",
            self.config_timeout
        );
        let transfer = self.interface.control_in(ControlIn {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request: req as u8,
            value,
            index,
            length,
        });
        Ok(self
            .rt
            .block_on(async { tokio::time::timeout(self.config_timeout, transfer).await })
            .map_err(|_| Error::Timeout)?
            .into_result()?)
    }

    /// Set the radio channel.
    ///
    /// The nRF24LU1 provides 1 MHz channels starting at 2400 MHz. The channel
    /// must be between 0 and 126.
    pub fn set_channel(&self, channel: u8) -> Result<(), Error> {
        let channel = track(params::check_channel(channel))?;
        radio_debug!("Setting channel to {:02x}", channel);
        track(self.send_config(ControlRequest::SetRadioChannel, channel, 0, &[]))
    }

    /// Set the 5-byte radio address to transmit to or receive from, depending
    /// on the mode.
    ///
    /// The default address is `E7E7E7E7E7`.
    pub fn set_address(&self, address: Address) -> Result<(), Error> {
        let a = address.0;
        radio_debug!(
            "Setting address to {:02x} {:02x} {:02x} {:02x} {:02x}",
            a[0],
            a[1],
            a[2],
            a[3],
            a[4]
        );
        track(self.send_config(ControlRequest::SetRadioAddress, 0, 0, &a))
    }

    /// Set the over-the-air data rate.
    pub fn set_data_rate(&self, rate: DataRate) -> Result<(), Error> {
        radio_debug!("Setting data rate to {:02x}", rate as u8);
        track(self.send_config(ControlRequest::SetDataRate, rate as u16, 0, &[]))
    }

    /// Set the transmit power.
    pub fn set_power(&self, power: Power) -> Result<(), Error> {
        radio_debug!("Setting power to {:02x}", power as u8);
        track(self.send_config(ControlRequest::SetRadioPower, power as u16, 0, &[]))
    }

    /// Enable or disable automatic acknowledgment.
    pub fn set_ack_enable(&self, enable: bool) -> Result<(), Error> {
        radio_debug!("{}abling auto-ack", if enable { "en" } else { "dis" });
        track(self.send_config(ControlRequest::AckEnable, enable as u16, 0, &[]))
    }

    /// Set the auto-retry count (ARC): how many times a packet is resent when
    /// no ack comes back. Must be 0-15.
    pub fn set_arc(&self, count: u8) -> Result<(), Error> {
        let count = track(params::check_arc(count))?;
        radio_debug!("Setting arc to {}", count);
        track(self.send_config(ControlRequest::SetRadioArc, count, 0, &[]))
    }

    /// Set the auto-retry delay (ARD) as a time.
    ///
    /// The delay is 250-4000 µs, in 250 µs increments. Values in between
    /// round down to the increment below.
    pub fn set_ard_time(&self, us: u16) -> Result<(), Error> {
        let ard = track(params::encode_ard_time(us))?;
        radio_debug!("Setting ard time {:02x}", ard);
        track(self.send_config(ControlRequest::SetRadioArd, ard, 0, &[]))
    }

    /// Set the auto-retry delay (ARD) by ack payload length, in bytes.
    ///
    /// The retry delay has to cover the ack packet, so longer ack payloads
    /// need longer delays. When set by length, the firmware keeps the delay
    /// correct even if the data rate changes afterwards. Must be 0-32 bytes.
    pub fn set_ard_bytes(&self, bytes: u8) -> Result<(), Error> {
        let ard = track(params::encode_ard_bytes(bytes))?;
        radio_debug!("Setting ard bytes to {:02x}", bytes);
        track(self.send_config(ControlRequest::SetRadioArd, ard, 0, &[]))
    }

    /// Set the radio mode: transmit (PTX) or receive (PRX).
    pub fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        radio_debug!("Setting mode to {}", mode);
        track(self.send_config(ControlRequest::SetRadioMode, mode as u16, 0, &[]))
    }

    /// Turn the continuous carrier test mode on or off.
    ///
    /// While on, the radio transmits an unmodulated carrier on the current
    /// channel.
    pub fn set_cont_carrier(&self, enable: bool) -> Result<(), Error> {
        radio_debug!(
            "{}abling continuous carrier",
            if enable { "en" } else { "dis" }
        );
        track(self.send_config(ControlRequest::SetContCarrier, enable as u16, 0, &[]))
    }

    /// Sweep channels `start..=stop`, sending `packet` on each, and return the
    /// channels where the packet was acknowledged.
    ///
    /// The radio should be in PTX mode with the target's address and data
    /// rate already set.
    pub fn scan_channels(&self, start: u8, stop: u8, packet: &[u8]) -> Result<Vec<u8>, Error> {
        let (start, stop) = track(params::check_scan_range(start, stop))?;
        radio_debug!("Scanning channels {} to {}", start, stop);
        track(self.send_config(ControlRequest::ScanChannels, start, stop, packet))?;
        let found =
            track(self.read_config(ControlRequest::ScanChannels, 0, 0, SCAN_RESULT_LENGTH))?;
        track(check_scan_result(&found))?;
        Ok(found)
    }

    /// Receive a packet into `buf`. Only meaningful in PRX mode.
    ///
    /// Returns the number of bytes received. When `timeout` runs out first,
    /// this is not an error: whatever arrived before the deadline is returned,
    /// which is usually 0 bytes. A timeout of `None` waits forever.
    pub fn read_packet(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, Error> {
        track(self.read_packet_inner(buf, timeout))
    }

    fn read_packet_inner(
        &mut self,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize, Error> {
        radio_debug!("receiving {} bytes", buf.len());
        if buf.is_empty() {
            return Ok(0);
        }
        let Self { rx, rt, .. } = self;

        let req = RequestBuffer::reuse(core::mem::take(&mut rx.spare), buf.len());
        rx.queue.submit(req);
        let (completion, timed_out) = rt.block_on(async {
            if let Some(timeout) = timeout {
                if let Ok(c) = tokio::time::timeout(timeout, rx.queue.next_complete()).await {
                    return (c, false);
                }
                rx.queue.cancel_all();
            }
            (rx.queue.next_complete().await, timeout.is_some())
        });

        let data = completion.data;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        rx.spare = data;
        finish_bulk(completion.status, timed_out)?;
        radio_debug!("received {} bytes", len);
        Ok(len)
    }

    /// Send a packet. Only meaningful in PTX mode.
    ///
    /// Returns the number of bytes sent. When `timeout` runs out first, this
    /// is not an error: the number of bytes the dongle took before the
    /// deadline is returned. A timeout of `None` waits forever.
    pub fn write_packet(
        &mut self,
        data: &[u8],
        timeout: Option<Duration>,
    ) -> Result<usize, Error> {
        track(self.write_packet_inner(data, timeout))
    }

    fn write_packet_inner(
        &mut self,
        data: &[u8],
        timeout: Option<Duration>,
    ) -> Result<usize, Error> {
        radio_debug!("sending {} bytes", data.len());
        let Self { tx, rt, .. } = self;

        let mut buf = core::mem::take(&mut tx.spare);
        buf.clear();
        buf.extend_from_slice(data);
        tx.queue.submit(buf);
        let (completion, timed_out) = rt.block_on(async {
            if let Some(timeout) = timeout {
                if let Ok(c) = tokio::time::timeout(timeout, tx.queue.next_complete()).await {
                    return (c, false);
                }
                tx.queue.cancel_all();
            }
            (tx.queue.next_complete().await, timeout.is_some())
        });

        let len = completion.data.actual_length();
        tx.spare = completion.data.reuse();
        finish_bulk(completion.status, timed_out)?;
        radio_debug!("sent {} bytes", len);
        Ok(len)
    }

    /// Release the USB interface and close the device.
    pub fn close(self) {
        radio_debug!("Closing device");
        drop(self);
    }
}

fn check_config_len(expected: usize, actual: usize) -> Result<(), Error> {
    if actual != expected {
        return Err(Error::ShortTransfer { expected, actual });
    }
    Ok(())
}

/// Every channel the firmware reports back from a scan must be a real one.
fn check_scan_result(found: &[u8]) -> Result<(), Error> {
    if let Some(bad) = found.iter().find(|&&c| c > MAX_CHANNEL) {
        radio_warn!("Scan returned invalid channel {}", bad);
        return Err(Error::ReturnData);
    }
    Ok(())
}

/// A bulk transfer cancelled by our own deadline still reports what it moved.
fn finish_bulk(
    status: Result<(), nusb::transfer::TransferError>,
    timed_out: bool,
) -> Result<(), Error> {
    match status {
        Ok(()) => Ok(()),
        Err(nusb::transfer::TransferError::Cancelled) if timed_out => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use nusb::transfer::TransferError;

    use super::*;

    #[test]
    fn bulk_status() {
        assert!(finish_bulk(Ok(()), false).is_ok());
        assert!(finish_bulk(Ok(()), true).is_ok());
        assert!(finish_bulk(Err(TransferError::Cancelled), true).is_ok());
        assert!(matches!(
            finish_bulk(Err(TransferError::Cancelled), false),
            Err(Error::Transfer(TransferError::Cancelled))
        ));
        assert!(matches!(
            finish_bulk(Err(TransferError::Stall), true),
            Err(Error::Transfer(TransferError::Stall))
        ));
    }

    #[test]
    fn config_length() {
        assert!(check_config_len(5, 5).is_ok());
        assert!(check_config_len(0, 0).is_ok());
        assert!(matches!(
            check_config_len(5, 3),
            Err(Error::ShortTransfer {
                expected: 5,
                actual: 3
            })
        ));
    }

    #[test]
    fn scan_result() {
        assert!(check_scan_result(&[]).is_ok());
        assert!(check_scan_result(&[0, 80, 126]).is_ok());
        assert!(matches!(
            check_scan_result(&[2, 127]),
            Err(Error::ReturnData)
        ));
        assert!(matches!(check_scan_result(&[0xFF]), Err(Error::ReturnData)));
    }

    #[test]
    fn request_table() {
        assert_eq!(ControlRequest::SetRadioChannel as u8, 0x01);
        assert_eq!(ControlRequest::SetRadioAddress as u8, 0x02);
        assert_eq!(ControlRequest::SetDataRate as u8, 0x03);
        assert_eq!(ControlRequest::SetRadioPower as u8, 0x04);
        assert_eq!(ControlRequest::SetRadioArd as u8, 0x05);
        assert_eq!(ControlRequest::SetRadioArc as u8, 0x06);
        assert_eq!(ControlRequest::AckEnable as u8, 0x10);
        assert_eq!(ControlRequest::SetContCarrier as u8, 0x20);
        assert_eq!(ControlRequest::ScanChannels as u8, 0x21);
        assert_eq!(ControlRequest::SetRadioMode as u8, 0x22);
        assert_eq!(RX_ENDPOINT_ADDRESS & 0x80, 0x80);
        assert_eq!(TX_ENDPOINT_ADDRESS & 0x80, 0);
    }

    #[test]
    fn public_ids() {
        assert_eq!(VENDOR_ID, 0x1915);
        assert_eq!(PRODUCT_ID, 0x7777);
        assert_eq!(DEFAULT_CONFIG_TIMEOUT, Duration::from_secs(1));
    }
}
