//! Data rate parsing utilities.
//!
//! Link rates are written the way point-to-point simulators spell them:
//! "10Mbps", "0.5Mbps", "1Gbps", "64kbps" or "9600bps". Prefixes are decimal.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RATE_PATTERN: LazyLock<Regex> = LazyLock::new(||
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*([kKmMgG]?)(?:bps|b/s)\s*$").unwrap()
);

/// A link data rate in bits per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRate(u64);

impl DataRate {
    pub const fn from_bps(bps: u64) -> Self {
        DataRate(bps)
    }

    pub const fn bps(&self) -> u64 {
        self.0
    }
}

/// Error returned for a rate string that does not parse
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid data rate format: {0}")]
pub struct DataRateError(pub String);

impl FromStr for DataRate {
    type Err = DataRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RATE_PATTERN
            .captures(s)
            .ok_or_else(|| DataRateError(s.to_string()))?;

        let value: f64 = caps[1].parse().map_err(|_| DataRateError(s.to_string()))?;
        let multiplier = match &caps[2] {
            "" => 1.0,
            "k" | "K" => 1e3,
            "m" | "M" => 1e6,
            "g" | "G" => 1e9,
            _ => return Err(DataRateError(s.to_string())),
        };

        let bps = (value * multiplier).round();
        if bps < 1.0 {
            return Err(DataRateError(s.to_string()));
        }
        Ok(DataRate(bps as u64))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, scale) in [("Gbps", 1_000_000_000), ("Mbps", 1_000_000), ("kbps", 1_000)] {
            if self.0 >= scale && self.0 % scale == 0 {
                return write!(f, "{}{}", self.0 / scale, unit);
            }
        }
        write!(f, "{}bps", self.0)
    }
}

impl Serialize for DataRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_rates() {
        assert_eq!("10Mbps".parse::<DataRate>().unwrap().bps(), 10_000_000);
        assert_eq!("0.5Mbps".parse::<DataRate>().unwrap().bps(), 500_000);
        assert_eq!("1Gbps".parse::<DataRate>().unwrap().bps(), 1_000_000_000);
        assert_eq!("64kbps".parse::<DataRate>().unwrap().bps(), 64_000);
        assert_eq!("9600bps".parse::<DataRate>().unwrap().bps(), 9_600);
        assert_eq!(" 2 Mb/s ".parse::<DataRate>().unwrap().bps(), 2_000_000);

        assert!("".parse::<DataRate>().is_err());
        assert!("fast".parse::<DataRate>().is_err());
        assert!("10Tbps".parse::<DataRate>().is_err());
        assert!("0bps".parse::<DataRate>().is_err());
    }

    #[test]
    fn test_display_data_rates() {
        assert_eq!(DataRate::from_bps(10_000_000).to_string(), "10Mbps");
        assert_eq!(DataRate::from_bps(500_000).to_string(), "500kbps");
        assert_eq!(DataRate::from_bps(1_500).to_string(), "1500bps");
    }

    #[test]
    fn test_serde_as_string() {
        let rate: DataRate = serde_yaml::from_str("\"0.5Mbps\"").unwrap();
        assert_eq!(rate.bps(), 500_000);
        assert_eq!(serde_json::to_string(&rate).unwrap(), "\"500kbps\"");
    }
}
