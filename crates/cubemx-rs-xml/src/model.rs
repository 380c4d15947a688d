// crates/cubemx-rs-xml/src/model.rs

//! Internal records holding attributes exactly as they appear in the
//! CubeMX XML. Nothing here is validated; filtering happens at lookup time.

/// Attributes of the first `<Mcu>` element in the document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RawMcu {
    pub ref_name: Option<String>,
    pub family: Option<String>,
    pub line: Option<String>,
    pub package: Option<String>,
}

/// A `<Pin>` element found beneath the `<Mcu>` root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RawPin {
    /// `@Name`
    pub name: Option<String>,
    /// `@Position`, unparsed.
    pub position: Option<String>,
    /// `@Type` (e.g. "I/O", "Power", "Reset")
    pub pin_type: Option<String>,
    /// `@Name` of each direct `<Signal>` child.
    pub signals: Vec<String>,
}

impl RawPin {
    /// Returns the name and numeric position, or `None` when the pin is
    /// missing either attribute or the position is not an integer.
    pub fn resolved(&self) -> Option<(&str, i64)> {
        let name = self.name.as_deref()?;
        let position = self.position.as_deref()?.trim().parse().ok()?;
        Some((name, position))
    }
}

/// The indexed content of a device description document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct McuDocument {
    pub mcu: RawMcu,
    /// Every `<Pin>` descendant of the root, in document order.
    pub pins: Vec<RawPin>,
}
