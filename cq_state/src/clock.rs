use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time of day inside the story, stored as minutes past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockParseError {
    #[error("expected HH:MM, got {0:?}")]
    Format(String),
    #[error("time {0:?} is outside 00:00..23:59")]
    Range(String),
}

impl ClockTime {
    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self(hours * 60 + minutes))
        } else {
            None
        }
    }

    pub fn hours(self) -> u32 {
        self.0 / 60
    }

    pub fn minutes(self) -> u32 {
        self.0 % 60
    }

    pub fn minutes_since_midnight(self) -> u32 {
        self.0
    }
}

impl Default for ClockTime {
    fn default() -> Self {
        Self(8 * 60)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

impl FromStr for ClockTime {
    type Err = ClockParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (hours, minutes) = trimmed
            .split_once(':')
            .ok_or_else(|| ClockParseError::Format(raw.to_string()))?;
        let hours: u32 = hours
            .parse()
            .map_err(|_| ClockParseError::Format(raw.to_string()))?;
        let minutes: u32 = minutes
            .parse()
            .map_err(|_| ClockParseError::Format(raw.to_string()))?;
        Self::from_hm(hours, minutes).ok_or_else(|| ClockParseError::Range(raw.to_string()))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn default_day() -> u32 {
    1
}

/// Story clock shown in the HUD: time of day plus a day counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    #[serde(default)]
    pub time: ClockTime,
    #[serde(default = "default_day")]
    pub day: u32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            time: ClockTime::default(),
            day: default_day(),
        }
    }
}

impl GameClock {
    pub fn new(time: ClockTime, day: u32) -> Self {
        Self { time, day }
    }

    /// Moves the clock forward, rolling over midnight as many times as
    /// needed. Returns how many days passed.
    pub fn advance(&mut self, minutes: u32) -> u32 {
        let total = u64::from(self.time.0) + u64::from(minutes);
        let per_day = u64::from(MINUTES_PER_DAY);
        let days = (total / per_day) as u32;
        self.time = ClockTime((total % per_day) as u32);
        self.day = self.day.saturating_add(days);
        days
    }
}

impl fmt::Display for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} {}", self.day, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_starts_morning_of_day_one() {
        let clock = GameClock::default();
        assert_eq!(clock.time.to_string(), "08:00");
        assert_eq!(clock.day, 1);
        assert_eq!(clock.to_string(), "Day 1 08:00");
    }

    #[test]
    fn advancing_past_midnight_wraps_and_bumps_day() {
        let mut clock = GameClock::new("23:30".parse().expect("valid time"), 1);
        assert_eq!(clock.advance(45), 1);
        assert_eq!(clock.time.to_string(), "00:15");
        assert_eq!(clock.day, 2);

        assert_eq!(clock.advance(0), 0);
        assert_eq!(clock.advance(3 * 24 * 60), 3);
        assert_eq!(clock.day, 5);
        assert_eq!(clock.time.to_string(), "00:15");
    }

    #[test]
    fn parse_rejects_malformed_times() {
        assert_eq!(
            "8".parse::<ClockTime>(),
            Err(ClockParseError::Format("8".to_string()))
        );
        assert_eq!(
            "24:00".parse::<ClockTime>(),
            Err(ClockParseError::Range("24:00".to_string()))
        );
        assert_eq!(
            "7:05".parse::<ClockTime>().map(|time| time.to_string()),
            Ok("07:05".to_string())
        );
    }

    #[test]
    fn clock_serializes_as_browser_fields() {
        let clock = GameClock::new(ClockTime::from_hm(22, 15).expect("valid"), 3);
        let json = serde_json::to_string(&clock).expect("serialize clock");
        assert_eq!(json, r#"{"time":"22:15","day":3}"#);
        let back: GameClock = serde_json::from_str(&json).expect("parse clock");
        assert_eq!(back, clock);
    }
}
