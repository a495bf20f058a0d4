//! WSDL-described SOAP transport
//!
//! Builds the SOAP 1.1 envelope by hand and decodes the response with an
//! event reader keyed on local element names, so namespace prefixes chosen
//! by the service do not matter. A `<Fault>` in the body maps to
//! [`LookupError::Fault`] and is checked before the HTTP status, because
//! SOAP faults usually ride on a 500.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::{LookupError, PillLookup, PillQuery, PillRecord, RawPillItem, PAGE_NO, PAGE_SIZE};

/// SOAP client for the drug identification service
pub struct SoapLookup {
    client: reqwest::Client,
    endpoint: String,
    service_key: String,
}

impl SoapLookup {
    /// Create a client for the given endpoint and service key
    pub fn new(endpoint: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Build the request envelope for one query
    fn build_envelope(&self, query: &PillQuery) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "<soap:Body>",
                "<getPillList>",
                "<serviceKey>{key}</serviceKey>",
                "<item_shape>{shape}</item_shape>",
                "<print_front>{imprint}</print_front>",
                "<numOfRows>{rows}</numOfRows>",
                "<pageNo>{page}</pageNo>",
                "</getPillList>",
                "</soap:Body>",
                "</soap:Envelope>",
            ),
            key = quick_xml::escape::escape(&self.service_key),
            shape = query.shape.code(),
            imprint = quick_xml::escape::escape(&query.imprint),
            rows = PAGE_SIZE,
            page = PAGE_NO,
        )
    }
}

#[async_trait]
impl PillLookup for SoapLookup {
    async fn search(&self, query: &PillQuery) -> Result<Vec<PillRecord>, LookupError> {
        let envelope = self.build_envelope(query);

        debug!("SOAP lookup for shape {} at {}", query.shape, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "getPillList")
            .body(envelope)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        match decode_envelope(&body) {
            // A fault explains the failure better than the bare status code
            Err(LookupError::Fault(fault)) => Err(LookupError::Fault(fault)),
            _ if !status.is_success() => Err(LookupError::Status(status.as_u16())),
            other => other,
        }
    }
}

/// Field currently receiving character data
enum TextTarget {
    ItemName,
    EntpName,
    ItemImage,
    FaultString,
}

/// Decode a response envelope into normalized records
fn decode_envelope(xml: &str) -> Result<Vec<PillRecord>, LookupError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items: Vec<RawPillItem> = Vec::new();
    let mut current: Option<RawPillItem> = None;
    let mut target: Option<TextTarget> = None;
    let mut fault: Option<String> = None;
    let mut saw_envelope = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                    b"envelope" => saw_envelope = true,
                    b"item" => current = Some(RawPillItem::default()),
                    b"item_name" if current.is_some() => target = Some(TextTarget::ItemName),
                    b"entp_name" if current.is_some() => target = Some(TextTarget::EntpName),
                    b"item_image" if current.is_some() => target = Some(TextTarget::ItemImage),
                    b"faultstring" => target = Some(TextTarget::FaultString),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| LookupError::Malformed(e.to_string()))?
                    .into_owned();
                match (&target, &mut current) {
                    (Some(TextTarget::ItemName), Some(item)) => item.item_name = Some(text),
                    (Some(TextTarget::EntpName), Some(item)) => item.entp_name = Some(text),
                    (Some(TextTarget::ItemImage), Some(item)) => item.item_image = Some(text),
                    (Some(TextTarget::FaultString), _) => fault = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref().to_ascii_lowercase() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                target = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LookupError::Malformed(e.to_string())),
            _ => {}
        }
    }

    if let Some(fault) = fault {
        return Err(LookupError::Fault(fault));
    }
    if !saw_envelope {
        return Err(LookupError::Malformed("missing SOAP envelope".to_string()));
    }

    Ok(items.into_iter().map(PillRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::FIELD_PLACEHOLDER;
    use crate::vision::ShapeLabel;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body>
                <ns2:getPillListResponse xmlns:ns2="http://service.example/">
                    <items>
                        <item>
                            <item_name>TestPill</item_name>
                            <entp_name>Acme</entp_name>
                            <item_image>http://x/y.png</item_image>
                        </item>
                        <item>
                            <item_image>http://x/z.png</item_image>
                        </item>
                    </items>
                </ns2:getPillListResponse>
            </soapenv:Body>
        </soapenv:Envelope>
    "#;

    #[test]
    fn test_decode_records_across_namespace_prefixes() {
        let records = decode_envelope(RESPONSE).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "TestPill");
        assert_eq!(records[0].manufacturer, "Acme");
        assert_eq!(records[0].image_url.as_deref(), Some("http://x/y.png"));

        assert_eq!(records[1].name, FIELD_PLACEHOLDER);
        assert_eq!(records[1].manufacturer, FIELD_PLACEHOLDER);
        assert_eq!(records[1].image_url.as_deref(), Some("http://x/z.png"));
    }

    #[test]
    fn test_decode_empty_body_is_empty_vec() {
        let xml = r#"
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                <soap:Body>
                    <getPillListResponse><items/></getPillListResponse>
                </soap:Body>
            </soap:Envelope>
        "#;
        let records = decode_envelope(xml).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_fault_is_fault_error() {
        let xml = r#"
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
                <soap:Body>
                    <soap:Fault>
                        <faultcode>soap:Client</faultcode>
                        <faultstring>Invalid service key</faultstring>
                    </soap:Fault>
                </soap:Body>
            </soap:Envelope>
        "#;
        match decode_envelope(xml) {
            Err(LookupError::Fault(msg)) => assert_eq!(msg, "Invalid service key"),
            other => panic!("expected fault, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_decode_non_envelope_is_malformed() {
        assert!(matches!(
            decode_envelope("<html>gateway timeout</html>"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn test_envelope_escapes_imprint_text() {
        let lookup = SoapLookup::new("http://example/soap", "key&1");
        let envelope = lookup.build_envelope(&PillQuery {
            shape: ShapeLabel::Ellipse,
            imprint: "A<B".to_string(),
        });

        assert!(envelope.contains("<item_shape>2</item_shape>"));
        assert!(envelope.contains("<print_front>A&lt;B</print_front>"));
        assert!(envelope.contains("<serviceKey>key&amp;1</serviceKey>"));
        assert!(envelope.contains("<numOfRows>5</numOfRows>"));
        assert!(envelope.contains("<pageNo>1</pageNo>"));
    }
}
