// crates/cubemx-rs-xml/src/error.rs

use core::fmt;
use quick_xml::Error as XmlError;

/// The three failure classes a device description load can end in.
///
/// Scripted callers branch on these, so each one maps to a stable exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path does not point at a readable file.
    FileNotFound,
    /// The file could not be read or is not well-formed XML.
    ParseFailure,
    /// The document parsed but has no `<Mcu>` element.
    StructureMissing,
}

impl ErrorKind {
    /// Process exit status used by the command line wrapper.
    pub const fn exit_code(self) -> i32 {
        match self {
            ErrorKind::FileNotFound => 4,
            ErrorKind::StructureMissing => 5,
            ErrorKind::ParseFailure => 6,
        }
    }
}

/// Errors that can occur while loading a device description file.
#[derive(Debug)]
pub enum DescriptorError {
    /// The given path does not exist or is not a regular file.
    FileNotFound { path: String },

    /// The file exists but reading it failed.
    FileRead { path: String, reason: String },

    /// An error from the underlying `quick-xml` reader, including bytes that
    /// are invalid in the document's declared encoding.
    XmlParsing(XmlError),

    /// The markup was readable but does not form a single-rooted document.
    MalformedDocument(&'static str),

    /// A required XML element was missing (e.g., Mcu).
    MissingElement { element: &'static str },
}

impl DescriptorError {
    /// Classifies this error into one of the three load failure classes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DescriptorError::FileNotFound { .. } => ErrorKind::FileNotFound,
            DescriptorError::FileRead { .. }
            | DescriptorError::XmlParsing(_)
            | DescriptorError::MalformedDocument(_) => ErrorKind::ParseFailure,
            DescriptorError::MissingElement { .. } => ErrorKind::StructureMissing,
        }
    }

    /// Shorthand for `self.kind().exit_code()`.
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

impl From<XmlError> for DescriptorError {
    fn from(e: XmlError) -> Self {
        DescriptorError::XmlParsing(e)
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::FileNotFound { path } => {
                write!(f, "Device description file not found: {}", path)
            }
            DescriptorError::FileRead { path, reason } => {
                write!(f, "Failed to read device description file {}: {}", path, reason)
            }
            DescriptorError::XmlParsing(e) => {
                write!(f, "Failed to parse device description file: {}", e)
            }
            DescriptorError::MalformedDocument(msg) => {
                write!(f, "Failed to parse device description file: {}", msg)
            }
            DescriptorError::MissingElement { element } => {
                write!(f, "Root node (<{} ...>) not found in device description file", element)
            }
        }
    }
}

impl std::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DescriptorError::XmlParsing(e) => Some(e),
            _ => None,
        }
    }
}
