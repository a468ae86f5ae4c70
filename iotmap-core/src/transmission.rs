//! The unified transmission tuple.
//!
//! Protocol-specific decoders reduce every captured frame to this shape
//! before the graph layers see it. The feed is sorted ascending by
//! timestamp before any layer is built.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IoT protocol a transmission was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Zigbee,
    Btle,
    Sixlowpan,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Zigbee => "zigbee",
            Protocol::Btle => "btle",
            Protocol::Sixlowpan => "sixlowpan",
        }
    }
}

impl FromStr for Protocol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "os4i" is the CoAP-over-6LoWPAN capture suite; same addressing.
        match s.to_ascii_lowercase().as_str() {
            "zigbee" => Ok(Protocol::Zigbee),
            "btle" => Ok(Protocol::Btle),
            "sixlowpan" | "os4i" => Ok(Protocol::Sixlowpan),
            other => Err(CoreError::UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application cluster identifier carried by a transmission (1 through 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppType(u8);

impl AppType {
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidAppType(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One captured frame reduced to the unified format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    pub protocol: Protocol,
    /// Capture time, seconds.
    pub timestamp: f64,
    pub dl_src: String,
    pub dl_dst: String,
    pub nwk_src: String,
    pub nwk_dst: String,
    pub app_type: AppType,
    /// Application payload, hex-encoded by the decoder.
    pub data: String,
}
