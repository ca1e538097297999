//! Positions within a partition's record sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CheckpointError;

const TRIM_HORIZON_TEXT: &str = "TRIM_HORIZON";
const LATEST_TEXT: &str = "LATEST";

/// A point within a single partition's record sequence.
///
/// Concrete positions carry a primary ordinal assigned by the stream and a
/// secondary ordinal for logical records folded into one physical record.
/// Ordering compares the primary ordinal first, then the secondary.
///
/// The two sentinels bracket every concrete position: `TrimHorizon` sorts
/// before all data and `Latest` after it. Sentinels are valid starting
/// points for reading but can never be committed as progress.
///
/// Text form: `"<primary>"`, `"<primary>:<secondary>"`, `"TRIM_HORIZON"`,
/// or `"LATEST"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SequencePosition {
    /// Before the oldest record still retained by the stream.
    TrimHorizon,
    /// A concrete record position.
    At { primary: u128, secondary: u64 },
    /// After the newest record in the stream.
    Latest,
}

impl SequencePosition {
    pub const TRIM_HORIZON: Self = Self::TrimHorizon;
    pub const LATEST: Self = Self::Latest;

    /// Build a concrete position from signed ordinals.
    ///
    /// Fails with [`CheckpointError::InvalidPosition`] if either ordinal is negative.
    pub fn new(primary: i128, secondary: i64) -> Result<Self, CheckpointError> {
        if primary < 0 {
            return Err(CheckpointError::InvalidPosition(format!(
                "primary ordinal must not be negative, got {}",
                primary
            )));
        }
        if secondary < 0 {
            return Err(CheckpointError::InvalidPosition(format!(
                "secondary ordinal must not be negative, got {}",
                secondary
            )));
        }
        Ok(Self::At {
            primary: primary as u128,
            secondary: secondary as u64,
        })
    }

    /// Build a concrete position from ordinals already known to be non-negative.
    pub const fn at(primary: u128, secondary: u64) -> Self {
        Self::At { primary, secondary }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::At { .. })
    }

    pub fn primary(&self) -> Option<u128> {
        match self {
            Self::At { primary, .. } => Some(*primary),
            _ => None,
        }
    }

    pub fn secondary(&self) -> Option<u64> {
        match self {
            Self::At { secondary, .. } => Some(*secondary),
            _ => None,
        }
    }
}

impl fmt::Display for SequencePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrimHorizon => f.write_str(TRIM_HORIZON_TEXT),
            Self::Latest => f.write_str(LATEST_TEXT),
            Self::At {
                primary,
                secondary: 0,
            } => write!(f, "{}", primary),
            Self::At { primary, secondary } => write!(f, "{}:{}", primary, secondary),
        }
    }
}

impl FromStr for SequencePosition {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TRIM_HORIZON_TEXT => return Ok(Self::TrimHorizon),
            LATEST_TEXT => return Ok(Self::Latest),
            _ => {}
        }

        let (primary, secondary) = match s.split_once(':') {
            Some((p, sub)) => (p, Some(sub)),
            None => (s, None),
        };

        let primary = parse_ordinal::<u128>(primary, s)?;
        let secondary = match secondary {
            Some(sub) => parse_ordinal::<u64>(sub, s)?,
            None => 0,
        };

        Ok(Self::At { primary, secondary })
    }
}

fn parse_ordinal<T: FromStr>(digits: &str, original: &str) -> Result<T, CheckpointError> {
    if digits.starts_with('-') {
        return Err(CheckpointError::InvalidPosition(format!(
            "negative ordinal in position '{}'",
            original
        )));
    }
    digits.parse::<T>().map_err(|_| {
        CheckpointError::InvalidPosition(format!("malformed position '{}'", original))
    })
}

impl From<SequencePosition> for String {
    fn from(position: SequencePosition) -> Self {
        position.to_string()
    }
}

impl TryFrom<String> for SequencePosition {
    type Error = CheckpointError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
