// crates/cubemx-rs-xml/src/parser.rs

use crate::error::DescriptorError;
use crate::model::{McuDocument, RawMcu, RawPin};
use log::debug;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Error as XmlError, Reader};

const MCU_TAG: &[u8] = b"Mcu";
const PIN_TAG: &[u8] = b"Pin";
const SIGNAL_TAG: &[u8] = b"Signal";

const NAME_ATTR: &[u8] = b"Name";
const POSITION_ATTR: &[u8] = b"Position";
const TYPE_ATTR: &[u8] = b"Type";
const REF_NAME_ATTR: &[u8] = b"RefName";
const FAMILY_ATTR: &[u8] = b"Family";
const LINE_ATTR: &[u8] = b"Line";
const PACKAGE_ATTR: &[u8] = b"Package";

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Parses a CubeMX device description held in memory as text and indexes
/// the first `<Mcu>` element and every `<Pin>` beneath it.
///
/// The content is already decoded, so an `encoding` named in the XML
/// declaration is ignored.
///
/// # Errors
/// See [`parse_document_bytes`].
pub(crate) fn parse_document(xml_content: &str) -> Result<McuDocument, DescriptorError> {
    let xml_content = xml_content.strip_prefix('\u{feff}').unwrap_or(xml_content);
    scan_events(Reader::from_str(xml_content))
}

/// Parses a CubeMX device description read straight from disk.
///
/// Names and attribute values are decoded with the encoding given by a
/// byte order mark or the XML declaration (e.g. `ISO-8859-1`), UTF-8 when
/// neither is present. The whole document is read, so well-formedness
/// errors anywhere in the file are reported even if they occur after the
/// `<Mcu>` element closes.
///
/// # Errors
/// Returns a parse-failure class error for malformed XML or bytes that are
/// invalid in the document's encoding, and `DescriptorError::MissingElement`
/// when no `<Mcu>` element exists.
pub(crate) fn parse_document_bytes(bytes: &[u8]) -> Result<McuDocument, DescriptorError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    scan_events(Reader::from_reader(bytes))
}

fn scan_events(mut reader: Reader<&[u8]>) -> Result<McuDocument, DescriptorError> {
    reader.config_mut().trim_text(true);

    let mut scan = Scan::default();
    loop {
        let event = reader.read_event()?;
        // The encoding may switch after the XML declaration.
        let decoder = reader.decoder();
        match event {
            Event::Start(e) => scan.open(&e, false, decoder)?,
            Event::Empty(e) => scan.open(&e, true, decoder)?,
            Event::End(_) => scan.close()?,
            Event::Text(t) => {
                let text = decoder.decode(&t).map_err(XmlError::from)?;
                if scan.depth == 0 && !text.trim().is_empty() {
                    return Err(DescriptorError::MalformedDocument(
                        "text content outside the root element",
                    ));
                }
            }
            Event::CData(_) if scan.depth == 0 => {
                return Err(DescriptorError::MalformedDocument(
                    "CDATA section outside the root element",
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    scan.finish()
}

/// Running state of the single pass over the event stream.
#[derive(Default)]
struct Scan {
    /// Number of currently open elements.
    depth: usize,
    seen_root_element: bool,
    mcu: Option<RawMcu>,
    /// Depth of the `<Mcu>` root while it is open.
    mcu_depth: Option<usize>,
    pins: Vec<RawPin>,
    /// `(index into pins, depth)` of each `<Pin>` currently open, innermost last.
    open_pins: Vec<(usize, usize)>,
}

impl Scan {
    fn open(
        &mut self,
        e: &BytesStart<'_>,
        is_empty: bool,
        decoder: Decoder,
    ) -> Result<(), DescriptorError> {
        if self.depth == 0 {
            if self.seen_root_element {
                return Err(DescriptorError::MalformedDocument(
                    "more than one root element",
                ));
            }
            self.seen_root_element = true;
        }

        let qname = e.name();
        let tag = qname.as_ref();
        decoder.decode(tag).map_err(XmlError::from)?;

        if self.mcu_depth.is_some() {
            if tag == PIN_TAG {
                let [name, position, pin_type] =
                    read_attributes(e, decoder, [NAME_ATTR, POSITION_ATTR, TYPE_ATTR])?;
                if !is_empty {
                    self.open_pins.push((self.pins.len(), self.depth));
                }
                self.pins.push(RawPin {
                    name,
                    position,
                    pin_type,
                    signals: Vec::new(),
                });
            } else if tag == SIGNAL_TAG {
                let [signal] = read_attributes(e, decoder, [NAME_ATTR])?;
                let parent = self
                    .open_pins
                    .last()
                    .filter(|&&(_, depth)| depth + 1 == self.depth)
                    .map(|&(index, _)| index);
                if let (Some(signal), Some(index)) = (signal, parent) {
                    self.pins[index].signals.push(signal);
                }
            }
        } else if self.mcu.is_none() && tag == MCU_TAG {
            let [ref_name, family, line, package] = read_attributes(
                e,
                decoder,
                [REF_NAME_ATTR, FAMILY_ATTR, LINE_ATTR, PACKAGE_ATTR],
            )?;
            self.mcu = Some(RawMcu {
                ref_name,
                family,
                line,
                package,
            });
            if !is_empty {
                self.mcu_depth = Some(self.depth);
            }
        }

        if !is_empty {
            self.depth += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DescriptorError> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or(DescriptorError::MalformedDocument("unexpected closing tag"))?;

        if self.mcu_depth == Some(self.depth) {
            self.mcu_depth = None;
        }
        if self.open_pins.last().map(|&(_, depth)| depth) == Some(self.depth) {
            self.open_pins.pop();
        }
        Ok(())
    }

    fn finish(self) -> Result<McuDocument, DescriptorError> {
        if self.depth != 0 {
            return Err(DescriptorError::MalformedDocument(
                "unclosed element at end of document",
            ));
        }
        if !self.seen_root_element {
            return Err(DescriptorError::MalformedDocument("no root element"));
        }

        let mcu = self
            .mcu
            .ok_or(DescriptorError::MissingElement { element: "Mcu" })?;

        debug!(
            "Indexed {} <Pin> elements beneath <Mcu RefName={:?}>",
            self.pins.len(),
            mcu.ref_name
        );

        Ok(McuDocument {
            mcu,
            pins: self.pins,
        })
    }
}

/// Extracts the decoded, unescaped values of `keys` from an element's attributes.
///
/// Every attribute is visited so that malformed, duplicated or badly encoded
/// attributes fail the parse even when they are not among `keys`.
fn read_attributes<const N: usize>(
    e: &BytesStart<'_>,
    decoder: Decoder,
    keys: [&[u8]; N],
) -> Result<[Option<String>; N], DescriptorError> {
    let mut values: [Option<String>; N] = core::array::from_fn(|_| None);

    for attr in e.attributes() {
        let attr = attr.map_err(XmlError::from)?;
        let value = attr.decode_and_unescape_value(decoder)?;
        if let Some(slot) = keys.iter().position(|k| *k == attr.key.as_ref()) {
            if values[slot].is_none() {
                values[slot] = Some(value.into_owned());
            }
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indexes_pins_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <Mcu RefName="STM32TEST" Family="STM32F4" Line="STM32F446" Package="LQFP64">
              <Core>Arm Cortex-M4</Core>
              <Pin Name="VBAT" Position="1" Type="Power"/>
              <Pin Name="PC13" Position="2" Type="I/O">
                <Signal Name="GPIO"/>
                <Signal Name="RTC_AF1"/>
              </Pin>
            </Mcu>"#;

        let doc = parse_document(xml).expect("document should parse");

        assert_eq!(doc.mcu.ref_name.as_deref(), Some("STM32TEST"));
        assert_eq!(doc.mcu.package.as_deref(), Some("LQFP64"));
        assert_eq!(doc.pins.len(), 2);
        assert_eq!(doc.pins[0].name.as_deref(), Some("VBAT"));
        assert_eq!(doc.pins[0].pin_type.as_deref(), Some("Power"));
        assert_eq!(doc.pins[1].position.as_deref(), Some("2"));
        assert_eq!(doc.pins[1].signals, vec!["GPIO", "RTC_AF1"]);
    }

    #[test]
    fn test_signal_after_nested_pin_belongs_to_outer_pin() {
        let xml = r#"<Mcu>
            <Pin Name="A" Position="1">
              <Pin Name="B" Position="2"/>
              <Signal Name="S"/>
            </Pin>
            <Pin Name="C" Position="3">
              <Pin Name="D" Position="4"><Signal Name="T"/></Pin>
              <Signal Name="U"/>
            </Pin>
          </Mcu>"#;
        let doc = parse_document(xml).unwrap();
        let signals: Vec<_> = doc
            .pins
            .iter()
            .map(|p| (p.name.as_deref().unwrap(), p.signals.clone()))
            .collect();
        assert_eq!(
            signals,
            vec![
                ("A", vec!["S".to_string()]),
                ("B", vec![]),
                ("C", vec!["U".to_string()]),
                ("D", vec!["T".to_string()]),
            ]
        );
    }

    #[test]
    fn test_bytes_are_decoded_with_declared_encoding() {
        let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<Mcu><Pin Name=\"P\xe9\" Position=\"1\"><Signal Name=\"\xb5C\"/></Pin></Mcu>";
        let doc = parse_document_bytes(xml).unwrap();
        assert_eq!(doc.pins[0].name.as_deref(), Some("P\u{e9}"));
        assert_eq!(doc.pins[0].signals, vec!["\u{b5}C"]);
    }

    #[test]
    fn test_text_input_ignores_declared_encoding() {
        let xml = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><Mcu><Pin Name=\"P\u{e9}\" Position=\"1\"/></Mcu>";
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.pins[0].name.as_deref(), Some("P\u{e9}"));
    }

    #[test]
    fn test_invalid_utf8_in_text_fails_to_parse() {
        let mut xml = b"<Mcu><Core>".to_vec();
        xml.extend_from_slice(&[0xc3, 0x28]);
        xml.extend_from_slice(b"</Core></Mcu>");
        let err = parse_document_bytes(&xml).unwrap_err();
        assert!(matches!(err, DescriptorError::XmlParsing(_)));
    }

    #[test]
    fn test_mcu_may_be_nested() {
        let xml = r#"<Database><Mcu RefName="A"><Group><Pin Name="PA0" Position="5"/></Group></Mcu></Database>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.mcu.ref_name.as_deref(), Some("A"));
        assert_eq!(doc.pins.len(), 1);
    }

    #[test]
    fn test_first_mcu_wins_and_foreign_pins_are_ignored() {
        let xml = r#"<Database>
            <Pin Name="OUTSIDE" Position="9"/>
            <Mcu RefName="FIRST"><Pin Name="PA0" Position="1"/></Mcu>
            <Mcu RefName="SECOND"><Pin Name="PB0" Position="2"/></Mcu>
        </Database>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.mcu.ref_name.as_deref(), Some("FIRST"));
        assert_eq!(doc.pins.len(), 1);
        assert_eq!(doc.pins[0].name.as_deref(), Some("PA0"));
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let xml = r#"<Mcu RefName="A&amp;B"><Pin Name="P&lt;1&gt;" Position="3"/></Mcu>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.mcu.ref_name.as_deref(), Some("A&B"));
        assert_eq!(doc.pins[0].name.as_deref(), Some("P<1>"));
    }

    #[test]
    fn test_missing_mcu_is_structure_error() {
        let xml = r#"<Database><Pin Name="PA0" Position="1"/></Database>"#;
        assert!(matches!(
            parse_document(xml),
            Err(DescriptorError::MissingElement { element: "Mcu" })
        ));
    }

    #[test]
    fn test_mismatched_tags_fail_to_parse() {
        let xml = r#"<Mcu><Pin Name="PA0" Position="1"></Mcu>"#;
        let err = parse_document(xml).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseFailure);
    }

    #[test]
    fn test_unclosed_root_fails_to_parse() {
        let xml = r#"<Mcu RefName="A"><Pin Name="PA0" Position="1"/>"#;
        let err = parse_document(xml).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseFailure);
    }

    #[test]
    fn test_empty_input_fails_to_parse() {
        assert!(matches!(
            parse_document(""),
            Err(DescriptorError::MalformedDocument("no root element"))
        ));
    }

    #[test]
    fn test_second_root_element_fails_to_parse() {
        let xml = r#"<Mcu/><Mcu/>"#;
        assert!(matches!(
            parse_document(xml),
            Err(DescriptorError::MalformedDocument("more than one root element"))
        ));
    }

    #[test]
    fn test_duplicate_attribute_fails_to_parse() {
        let xml = r#"<Mcu><Pin Name="PA0" Name="PA1" Position="1"/></Mcu>"#;
        let err = parse_document(xml).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseFailure);
    }
}
