//! The instrument table — what a musician can play and how it sounds.
//!
//! This is musician-side vocabulary. The auditor stores whatever attribute a
//! peer announces without consulting this table; validation happens where the
//! instrument is chosen, not where it is heard.

use std::fmt;
use std::str::FromStr;

/// The instruments a musician can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    Piano,
    Trumpet,
    Flute,
    Violin,
    Drum,
}

impl Instrument {
    /// Every known instrument, in canonical order.
    pub const ALL: [Instrument; 5] = [
        Instrument::Piano,
        Instrument::Trumpet,
        Instrument::Flute,
        Instrument::Violin,
        Instrument::Drum,
    ];

    /// Canonical lowercase name, carried as the announcement `attribute`.
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Trumpet => "trumpet",
            Instrument::Flute => "flute",
            Instrument::Violin => "violin",
            Instrument::Drum => "drum",
        }
    }

    /// The noise this instrument makes, carried as the announcement `sound`.
    pub fn sound(self) -> &'static str {
        match self {
            Instrument::Piano => "ti-ta-ti",
            Instrument::Trumpet => "pouet",
            Instrument::Flute => "trulu",
            Instrument::Violin => "gzi-gzi",
            Instrument::Drum => "boum-boum",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instrument name outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown instrument '{0}' (expected one of: piano, trumpet, flute, violin, drum)")]
pub struct UnknownInstrument(pub String);

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "piano" => Ok(Instrument::Piano),
            "trumpet" => Ok(Instrument::Trumpet),
            "flute" => Ok(Instrument::Flute),
            "violin" => Ok(Instrument::Violin),
            "drum" => Ok(Instrument::Drum),
            other => Err(UnknownInstrument(other.to_string())),
        }
    }
}
