pub const CRAZYRADIO_USB_VID: u16 = 0x1915;
pub const CRAZYRADIO_USB_PID: u16 = 0x7777;

/// Vendor requests understood by the Crazyradio firmware.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlRequest {
    SetRadioChannel = 0x01,
    SetRadioAddress = 0x02,
    SetDataRate = 0x03,
    SetRadioPower = 0x04,
    SetRadioArd = 0x05,
    SetRadioArc = 0x06,
    AckEnable = 0x10,
    SetContCarrier = 0x20,
    /// Start a scan when sent OUT, fetch the results when sent IN.
    ScanChannels = 0x21,
    SetRadioMode = 0x22,
}

pub const RX_ENDPOINT_ADDRESS: u8 = 0x81;
pub const TX_ENDPOINT_ADDRESS: u8 = 0x01;

pub const MAX_CHANNEL: u8 = 126;
pub const MAX_ARC: u8 = 15;
pub const ARD_STEP_US: u16 = 250;
pub const MAX_ARD_US: u16 = 4000;
pub const MAX_ARD_BYTES: u8 = 32;
/// Flags an ARD setting as an ack payload length instead of a delay.
pub const ARD_BYTES_FLAG: u16 = 0x80;

pub const SCAN_RESULT_LENGTH: u16 = 64;
pub const DEFAULT_CONFIG_TIMEOUT_MS: u64 = 1000;
