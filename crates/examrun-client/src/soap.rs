//! SOAP envelope extraction from multipart bodies.
//!
//! The runner's SOAP side sends `multipart/related` bodies. The envelope is
//! the XML document between the `<?xml ` declaration and the closing MIME
//! boundary. Outgoing envelopes are written as plain `text/xml`.

use std::io::{BufRead, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Start of the XML document inside a multipart body.
pub const XML_DECL_MARKER: &str = "<?xml ";
/// MIME boundary that closes the XML part.
pub const MIME_BOUNDARY_MARKER: &str = "--MIMEBoundary";
/// Media type envelopes are written as.
pub const SOAP_CONTENT_TYPE: &str = "text/xml";
/// Media types envelopes can be read from.
pub const READABLE_CONTENT_TYPES: [&str; 2] = ["text/xml", "multipart/related"];

/// Errors from reading or writing a SOAP envelope.
#[derive(Debug, Error)]
pub enum SoapError {
    /// No `<?xml ` declaration in the body.
    #[error("no XML document in multipart body")]
    MissingDocument,

    /// No MIME boundary after the XML declaration.
    #[error("no MIME boundary after the XML document")]
    MissingBoundary,

    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The root element is something other than an envelope.
    #[error("expected a SOAP Envelope, found <{0}>")]
    NotAnEnvelope(String),

    /// The envelope has no Body.
    #[error("SOAP envelope has no Body")]
    MissingBody,

    /// Reading or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated SOAP envelope document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope {
    document: String,
}

impl SoapEnvelope {
    /// Extract the envelope from a multipart body.
    ///
    /// Lines are joined without separators before the document is cut out,
    /// so line breaks inside the part do not survive.
    pub fn from_multipart<R: BufRead>(reader: R) -> Result<Self, SoapError> {
        let mut data = String::new();
        for line in reader.lines() {
            data.push_str(&line?);
        }

        let start = data
            .find(XML_DECL_MARKER)
            .ok_or(SoapError::MissingDocument)?;
        let end = data
            .rfind(MIME_BOUNDARY_MARKER)
            .filter(|&end| end > start)
            .ok_or(SoapError::MissingBoundary)?;
        Self::parse(&data[start..end])
    }

    /// Parse a bare envelope document.
    pub fn parse(xml: &str) -> Result<Self, SoapError> {
        validate_envelope(xml)?;
        Ok(Self {
            document: xml.to_string(),
        })
    }

    /// The envelope document.
    pub fn as_str(&self) -> &str {
        &self.document
    }

    /// Write the envelope document unchanged.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), SoapError> {
        writer.write_all(self.document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Returns true if a body of `content_type` can hold an envelope.
    pub fn accepts(content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        READABLE_CONTENT_TYPES
            .iter()
            .any(|readable| essence.eq_ignore_ascii_case(readable))
    }
}

/// Check `xml` is one well-formed element tree rooted at `Envelope` with a
/// direct `Body` child. Namespace prefixes are ignored.
fn validate_envelope(xml: &str) -> Result<(), SoapError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut has_body = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SoapError::Xml(e.to_string()))?;
        match event {
            Event::Start(element) => {
                check_element(element.local_name().as_ref(), depth, &mut root_seen, &mut has_body)?;
                depth += 1;
            }
            Event::Empty(element) => {
                check_element(element.local_name().as_ref(), depth, &mut root_seen, &mut has_body)?;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SoapError::Xml("unmatched end tag".to_string()))?;
            }
            Event::Text(text) if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) => {
                return Err(SoapError::Xml("text outside the root element".to_string()));
            }
            Event::CData(_) if depth == 0 => {
                return Err(SoapError::Xml("CDATA outside the root element".to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SoapError::Xml("unexpected end of document".to_string()));
    }
    if !root_seen {
        return Err(SoapError::Xml("no root element".to_string()));
    }
    if !has_body {
        return Err(SoapError::MissingBody);
    }
    Ok(())
}

fn check_element(
    local_name: &[u8],
    depth: usize,
    root_seen: &mut bool,
    has_body: &mut bool,
) -> Result<(), SoapError> {
    match depth {
        0 if *root_seen => Err(SoapError::Xml("more than one root element".to_string())),
        0 if local_name != b"Envelope" => Err(SoapError::NotAnEnvelope(
            String::from_utf8_lossy(local_name).into_owned(),
        )),
        0 => {
            *root_seen = true;
            Ok(())
        }
        1 if local_name == b"Body" => {
            *has_body = true;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
        r#"<soapenv:Header/>"#,
        r#"<soapenv:Body><ns:getVersionResponse xmlns:ns="urn:exam">"#,
        r#"<ns:return>4.4</ns:return></ns:getVersionResponse></soapenv:Body>"#,
        r#"</soapenv:Envelope>"#
    );

    fn multipart(document: &str) -> String {
        format!(
            "--MIMEBoundary\r\n\
             Content-Type: application/xop+xml; charset=UTF-8; type=\"text/xml\"\r\n\
             Content-Transfer-Encoding: binary\r\n\
             \r\n\
             {}\r\n\
             --MIMEBoundary--\r\n",
            document
        )
    }

    #[test]
    fn test_extracts_envelope_from_multipart() {
        let body = multipart(ENVELOPE);
        let envelope = SoapEnvelope::from_multipart(body.as_bytes()).unwrap();
        assert_eq!(envelope.as_str(), ENVELOPE);
    }

    #[test]
    fn test_line_breaks_are_dropped() {
        let split = ENVELOPE.replace("<soapenv:Body>", "\n<soapenv:Body>\r\n");
        let envelope = SoapEnvelope::from_multipart(multipart(&split).as_bytes()).unwrap();
        assert_eq!(envelope.as_str(), ENVELOPE);
    }

    #[test]
    fn test_missing_markers_are_errors() {
        let no_xml = "--MIMEBoundary\r\nContent-Type: text/plain\r\n\r\nhello\r\n--MIMEBoundary--";
        assert!(matches!(
            SoapEnvelope::from_multipart(no_xml.as_bytes()),
            Err(SoapError::MissingDocument)
        ));

        assert!(matches!(
            SoapEnvelope::from_multipart(ENVELOPE.as_bytes()),
            Err(SoapError::MissingBoundary)
        ));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let broken = ENVELOPE.replace("</soapenv:Body>", "");
        assert!(matches!(
            SoapEnvelope::from_multipart(multipart(&broken).as_bytes()),
            Err(SoapError::Xml(_))
        ));

        let truncated = &ENVELOPE[..ENVELOPE.len() - "</soapenv:Envelope>".len()];
        assert!(matches!(
            SoapEnvelope::parse(truncated),
            Err(SoapError::Xml(_))
        ));
    }

    #[test]
    fn test_text_outside_root_is_an_error() {
        let leading = r#"<?xml version="1.0"?>garbage<s:Envelope xmlns:s="urn:s"><s:Body/></s:Envelope>"#;
        assert!(matches!(SoapEnvelope::parse(leading), Err(SoapError::Xml(_))));

        let trailing = r#"<?xml version="1.0"?><s:Envelope xmlns:s="urn:s"><s:Body/></s:Envelope>trailing junk"#;
        assert!(matches!(SoapEnvelope::parse(trailing), Err(SoapError::Xml(_))));

        let cdata = r#"<?xml version="1.0"?><s:Envelope xmlns:s="urn:s"><s:Body/></s:Envelope><![CDATA[x]]>"#;
        assert!(matches!(SoapEnvelope::parse(cdata), Err(SoapError::Xml(_))));

        let spaced = "<?xml version=\"1.0\"?>\n  <s:Envelope xmlns:s=\"urn:s\"><s:Body/></s:Envelope>\n";
        assert!(SoapEnvelope::parse(spaced).is_ok());
    }

    #[test]
    fn test_requires_envelope_with_body() {
        assert!(matches!(
            SoapEnvelope::parse(r#"<?xml version="1.0"?><html><body/></html>"#),
            Err(SoapError::NotAnEnvelope(name)) if name == "html"
        ));
        assert!(matches!(
            SoapEnvelope::parse(r#"<?xml version="1.0"?><s:Envelope xmlns:s="urn:s"><s:Header/></s:Envelope>"#),
            Err(SoapError::MissingBody)
        ));
    }

    #[test]
    fn test_write_to_is_verbatim() {
        let envelope = SoapEnvelope::parse(ENVELOPE).unwrap();
        let mut out = Vec::new();
        envelope.write_to(&mut out).unwrap();
        assert_eq!(out, ENVELOPE.as_bytes());
    }

    #[test]
    fn test_accepted_content_types() {
        assert!(SoapEnvelope::accepts(SOAP_CONTENT_TYPE));
        assert!(SoapEnvelope::accepts("text/xml; charset=UTF-8"));
        assert!(SoapEnvelope::accepts(
            r#"multipart/related; boundary=MIMEBoundary; type="application/xop+xml""#
        ));
        assert!(!SoapEnvelope::accepts("application/json"));
    }
}
