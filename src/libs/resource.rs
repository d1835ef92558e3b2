use crate::libs::error::{PipelineError, Result};
use std::fmt;
use std::str::FromStr;

/// Byte scale steps, in increasing magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    EB,
    ZB,
    YB,
}

impl Unit {
    pub const ALL: [Unit; 9] = [
        Unit::B,
        Unit::KB,
        Unit::MB,
        Unit::GB,
        Unit::TB,
        Unit::PB,
        Unit::EB,
        Unit::ZB,
        Unit::YB,
    ];

    /// Position on the scale, `B` is 0.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Unit::B => "B",
            Unit::KB => "KB",
            Unit::MB => "MB",
            Unit::GB => "GB",
            Unit::TB => "TB",
            Unit::PB => "PB",
            Unit::EB => "EB",
            Unit::ZB => "ZB",
            Unit::YB => "YB",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = PipelineError;

    /// ```
    /// use methylseq::Unit;
    /// assert_eq!("gb".parse::<Unit>().unwrap(), Unit::GB);
    /// assert!("GiB".parse::<Unit>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        Unit::ALL
            .iter()
            .find(|u| u.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| PipelineError::UnsupportedUnit(s.to_string()))
    }
}

/// An amount of bytes at some scale step, e.g. `25MB`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceQuantity {
    amount: f64,
    unit: Unit,
}

impl ResourceQuantity {
    pub fn new(amount: f64, unit: Unit) -> Self {
        Self { amount, unit }
    }

    pub fn zero(unit: Unit) -> Self {
        Self::new(0.0, unit)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Picks the largest binary step that keeps the amount at or above one,
    /// rounding to two decimals.
    ///
    /// ```
    /// use methylseq::{ResourceQuantity, Unit};
    /// assert_eq!(ResourceQuantity::from_bytes(0), ResourceQuantity::new(0.0, Unit::B));
    /// assert_eq!(ResourceQuantity::from_bytes(1536), ResourceQuantity::new(1.5, Unit::KB));
    /// ```
    pub fn from_bytes(bytes: u64) -> Self {
        if bytes == 0 {
            return Self::zero(Unit::B);
        }

        // floor(log_1024(bytes)) without going through floats
        let mut index = 0usize;
        let mut scale = 1u128;
        while index + 1 < Unit::ALL.len() && (bytes as u128) >= scale * 1024 {
            scale *= 1024;
            index += 1;
        }

        let mut amount = round2(bytes as f64 / scale as f64);
        // 1048575 would otherwise print as 1024KB
        if amount >= 1024.0 && index + 1 < Unit::ALL.len() {
            scale *= 1024;
            index += 1;
            amount = round2(bytes as f64 / scale as f64);
        }
        Self::new(amount, Unit::ALL[index])
    }

    /// Rescales to another step using a factor of 1000 per step.
    ///
    /// `from_bytes` is binary while this is decimal; sizes handed to the
    /// scheduler depend on the mix, so both are kept as they are.
    pub fn convert_to(&self, target: Unit) -> Self {
        let diff = self.unit.index() as i32 - target.index() as i32;
        let factor = 1000f64.powi(diff.abs());
        let amount = if diff >= 0 {
            self.amount * factor
        } else {
            self.amount / factor
        };
        Self::new(amount, target)
    }

    /// `convert_to` with the target given by name.
    pub fn convert_to_named(&self, target: &str) -> Result<Self> {
        Ok(self.convert_to(target.parse()?))
    }

    pub fn try_add(&self, other: &ResourceQuantity) -> Result<Self> {
        if self.unit != other.unit {
            return Err(PipelineError::UnitMismatch {
                left: self.to_string(),
                right: other.to_string(),
            });
        }
        Ok(Self::new(self.amount + other.amount, self.unit))
    }

    fn times(&self, factor: f64) -> Self {
        Self::new(self.amount * factor, self.unit)
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Predicted footprint of processing one artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactResourceRequirement {
    pub memory: ResourceQuantity,
    pub disk: ResourceQuantity,
}

impl ArtifactResourceRequirement {
    pub fn new(memory: ResourceQuantity, disk: ResourceQuantity) -> Self {
        Self { memory, disk }
    }

    /// `0B` for both fields.
    pub fn none() -> Self {
        Self::new(ResourceQuantity::zero(Unit::B), ResourceQuantity::zero(Unit::B))
    }

    pub fn try_add(&self, other: &ArtifactResourceRequirement) -> Result<Self> {
        Ok(Self::new(
            self.memory.try_add(&other.memory)?,
            self.disk.try_add(&other.disk)?,
        ))
    }

    /// Replication scaling, e.g. `2` when the raw and the processed copies
    /// have to coexist.
    pub fn scale(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor < 0.0 || factor.fract() != 0.0 {
            return Err(PipelineError::InvalidScaleFactor(factor));
        }
        Ok(Self::new(self.memory.times(factor), self.disk.times(factor)))
    }

    /// Sums requirements starting from the first one, so the result keeps its
    /// units. The empty sum is `none()`.
    pub fn try_sum<'a, I>(reqs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ArtifactResourceRequirement>,
    {
        let mut iter = reqs.into_iter();
        let first = match iter.next() {
            Some(r) => *r,
            None => return Ok(Self::none()),
        };
        iter.try_fold(first, |acc, r| acc.try_add(r))
    }
}

impl fmt::Display for ArtifactResourceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory: {}, disk: {}", self.memory, self.disk)
    }
}
