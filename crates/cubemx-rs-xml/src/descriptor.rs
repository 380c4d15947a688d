// crates/cubemx-rs-xml/src/descriptor.rs

use crate::error::DescriptorError;
use crate::model::McuDocument;
use crate::parser::{parse_document, parse_document_bytes};
use crate::types::{IntoPinNumber, McuInfo, Pin, PinMatch};
use log::{debug, trace, warn};
use std::fs;
use std::path::Path;

/// What to do when a device description cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Return the error to the caller.
    #[default]
    FailFast,
    /// Log the error and hand back an empty descriptor on which every
    /// lookup yields `None`.
    Degrade,
}

/// An indexed CubeMX device description.
///
/// Built once by one of the constructors; all queries are read-only scans
/// over the pins of the first `<Mcu>` element, in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// `None` for a descriptor whose load failed under `LoadPolicy::Degrade`.
    document: Option<McuDocument>,
}

impl DeviceDescriptor {
    /// Loads the device description at `path`, failing on any error.
    ///
    /// # Errors
    /// See [`DeviceDescriptor::load`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        Self::load(path, LoadPolicy::FailFast)
    }

    /// Loads the device description at `path`.
    ///
    /// The file is checked for existence, read and parsed in full, and the
    /// first `<Mcu>` element is located. Each stage has its own error class
    /// (see [`DescriptorError::kind`]).
    ///
    /// # Errors
    /// Under `LoadPolicy::FailFast` returns the first error encountered.
    /// Under `LoadPolicy::Degrade` never fails.
    pub fn load(path: impl AsRef<Path>, policy: LoadPolicy) -> Result<Self, DescriptorError> {
        match Self::read_and_index(path.as_ref()) {
            Ok(descriptor) => Ok(descriptor),
            Err(e) if policy == LoadPolicy::Degrade => {
                warn!("{}; continuing with an empty device description", e);
                Ok(Self::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Parses a device description held in memory.
    ///
    /// # Errors
    /// Returns a parse-failure class error for malformed XML and
    /// `DescriptorError::MissingElement` when there is no `<Mcu>` element.
    pub fn from_xml_str(xml_content: &str) -> Result<Self, DescriptorError> {
        let document = parse_document(xml_content)?;
        Ok(Self {
            document: Some(document),
        })
    }

    /// Parses a device description held in memory as raw bytes.
    ///
    /// Unlike [`DeviceDescriptor::from_xml_str`], the encoding named by a
    /// byte order mark or the XML declaration is honoured.
    ///
    /// # Errors
    /// As [`DeviceDescriptor::from_xml_str`]; bytes that are invalid in the
    /// document's encoding are a parse failure.
    pub fn from_xml_bytes(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let document = parse_document_bytes(bytes)?;
        Ok(Self {
            document: Some(document),
        })
    }

    /// A descriptor with no root element and no pins.
    pub fn empty() -> Self {
        Self { document: None }
    }

    fn read_and_index(path: &Path) -> Result<Self, DescriptorError> {
        if !path.is_file() {
            return Err(DescriptorError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("Loading device description from {}", path.display());
        let bytes = fs::read(path).map_err(|e| DescriptorError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_xml_bytes(&bytes)
    }

    /// Returns true if nothing was loaded or the `<Mcu>` element has no pins.
    pub fn is_empty(&self) -> bool {
        self.document.as_ref().map_or(true, |d| d.pins.is_empty())
    }

    /// Attributes of the `<Mcu>` root, if one was loaded.
    pub fn mcu(&self) -> Option<McuInfo<'_>> {
        self.document.as_ref().map(|d| McuInfo::from_raw(&d.mcu))
    }

    /// Every well-formed pin, in document order.
    ///
    /// Pins missing `Name` or `Position`, or whose position is not an
    /// integer, are left out.
    pub fn pins(&self) -> impl Iterator<Item = Pin<'_>> + '_ {
        self.document
            .iter()
            .flat_map(|d| d.pins.iter())
            .filter_map(|raw| {
                let pin = Pin::from_raw(raw);
                if pin.is_none() {
                    trace!("Skipping malformed <Pin> element: {:?}", raw);
                }
                pin
            })
    }

    /// Well-formed pins that list `signal` (e.g. "USART2_TX") as an alternate function.
    pub fn pins_with_signal<'a>(&'a self, signal: &'a str) -> impl Iterator<Item = Pin<'a>> + 'a {
        self.pins().filter(move |p| p.has_signal(signal))
    }

    /// Scans the pins once, in document order, for the first match.
    ///
    /// For each pin `by_position` is checked before `by_name`, so if both
    /// are supplied a position match on an earlier pin wins over a name
    /// match on a later one, and a pin matching both yields its name.
    pub fn find_pin(&self, by_position: Option<i64>, by_name: Option<&str>) -> Option<PinMatch<'_>> {
        self.pins().find_map(|pin| {
            if by_position == Some(pin.position()) {
                Some(PinMatch::Name(pin.name()))
            } else if by_name == Some(pin.name()) {
                Some(PinMatch::Position(pin.position()))
            } else {
                None
            }
        })
    }

    /// Returns the package position of the pin called `name` (e.g. "PC13" -> 2).
    pub fn pin_number_for_name(&self, name: &str) -> Option<i64> {
        if name.is_empty() {
            return None;
        }
        match self.find_pin(None, Some(name))? {
            PinMatch::Position(position) => Some(position),
            PinMatch::Name(_) => None,
        }
    }

    /// Returns the name of the pin at package position `number` (e.g. 2 -> "PC13").
    ///
    /// `number` may be any integer, float or numeric string; values that do
    /// not coerce to an integer of at least 1 yield `None`.
    pub fn pin_name_for_number(&self, number: impl IntoPinNumber) -> Option<&str> {
        let number = number.into_pin_number()?;
        if number < 1 {
            return None;
        }
        match self.find_pin(Some(number), None)? {
            PinMatch::Name(name) => Some(name),
            PinMatch::Position(_) => None,
        }
    }
}
