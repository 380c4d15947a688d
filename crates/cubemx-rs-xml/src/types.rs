// crates/cubemx-rs-xml/src/types.rs

//! Public, borrowed views over an indexed device description.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::model::{RawMcu, RawPin};

/// The result of a successful `find_pin` scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMatch<'a> {
    /// The pin was matched by position; this is its `@Name`.
    Name(&'a str),
    /// The pin was matched by name; this is its `@Position`.
    Position(i64),
}

/// Attributes of the `<Mcu>` root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct McuInfo<'a> {
    /// `@RefName` (e.g. "STM32F446R(C-E)Tx")
    pub ref_name: Option<&'a str>,
    /// `@Family` (e.g. "STM32F4")
    pub family: Option<&'a str>,
    /// `@Line`
    pub line: Option<&'a str>,
    /// `@Package` (e.g. "LQFP64")
    pub package: Option<&'a str>,
}

impl<'a> McuInfo<'a> {
    pub(crate) fn from_raw(raw: &'a RawMcu) -> Self {
        Self {
            ref_name: raw.ref_name.as_deref(),
            family: raw.family.as_deref(),
            line: raw.line.as_deref(),
            package: raw.package.as_deref(),
        }
    }
}

/// A `<Pin>` element carrying both a name and a numeric position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Pin<'a> {
    name: &'a str,
    position: i64,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pin_type: Option<&'a str>,
    signals: &'a [String],
}

impl<'a> Pin<'a> {
    /// Builds a view over a raw record, or `None` if the record is malformed.
    pub(crate) fn from_raw(raw: &'a RawPin) -> Option<Self> {
        let (name, position) = raw.resolved()?;
        Some(Self {
            name,
            position,
            pin_type: raw.pin_type.as_deref(),
            signals: &raw.signals,
        })
    }

    /// `@Name` (e.g. "PC13")
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// `@Position`, normally the 1-based location on the package.
    ///
    /// Taken from the file as-is, so it may be zero or negative.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// `@Type` (e.g. "I/O", "Power")
    pub fn pin_type(&self) -> Option<&'a str> {
        self.pin_type
    }

    /// Names of the alternate signals listed under the pin.
    pub fn signals(self) -> impl Iterator<Item = &'a str> {
        self.signals.iter().map(String::as_str)
    }

    /// Returns true if the pin lists `signal` among its `<Signal>` children.
    pub fn has_signal(&self, signal: &str) -> bool {
        self.signals.iter().any(|s| s == signal)
    }
}

/// Conversion of loosely-typed input into a candidate pin number.
///
/// Integers are taken as-is, floats are truncated toward zero, and strings
/// are trimmed and parsed as decimal integers. `None` means the input could
/// not be coerced at all; range checks are left to the caller.
pub trait IntoPinNumber {
    fn into_pin_number(self) -> Option<i64>;
}

macro_rules! impl_into_pin_number_for_int {
    ($($t:ty),*) => {
        $(
            impl IntoPinNumber for $t {
                fn into_pin_number(self) -> Option<i64> {
                    i64::try_from(self).ok()
                }
            }
        )*
    };
}

impl_into_pin_number_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoPinNumber for f64 {
    fn into_pin_number(self) -> Option<i64> {
        if !self.is_finite() {
            return None;
        }
        let truncated = self.trunc();
        if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
            return None;
        }
        Some(truncated as i64)
    }
}

impl IntoPinNumber for f32 {
    fn into_pin_number(self) -> Option<i64> {
        f64::from(self).into_pin_number()
    }
}

impl IntoPinNumber for &str {
    fn into_pin_number(self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl IntoPinNumber for &String {
    fn into_pin_number(self) -> Option<i64> {
        self.as_str().into_pin_number()
    }
}

impl IntoPinNumber for String {
    fn into_pin_number(self) -> Option<i64> {
        self.as_str().into_pin_number()
    }
}
