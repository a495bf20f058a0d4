//! Key-based XML/REST transport
//!
//! GET request against the drug identification endpoint with the service key
//! and search fields as query parameters; the XML body is decoded into typed
//! structs at this boundary, so nothing downstream touches raw fields.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{LookupError, PillLookup, PillQuery, PillRecord, RawPillItem, PAGE_NO, PAGE_SIZE};

/// Header result code meaning a normal service response
const RESULT_CODE_OK: &str = "00";

/// REST client for the drug identification service
pub struct RestLookup {
    client: reqwest::Client,
    endpoint: String,
    service_key: String,
}

impl RestLookup {
    /// Create a client for the given endpoint and service key
    pub fn new(endpoint: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            service_key: service_key.to_string(),
        }
    }
}

#[async_trait]
impl PillLookup for RestLookup {
    async fn search(&self, query: &PillQuery) -> Result<Vec<PillRecord>, LookupError> {
        let params = [
            ("serviceKey", self.service_key.clone()),
            ("item_shape", query.shape.service_label().to_string()),
            ("print_front", query.imprint.clone()),
            ("numOfRows", PAGE_SIZE.to_string()),
            ("pageNo", PAGE_NO.to_string()),
        ];

        debug!("REST lookup for shape {} at {}", query.shape, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        decode_response(&body)
    }
}

/// Decode the service XML into normalized records
fn decode_response(xml: &str) -> Result<Vec<PillRecord>, LookupError> {
    let parsed: ServiceResponse =
        quick_xml::de::from_str(xml).map_err(|e| LookupError::Malformed(e.to_string()))?;

    if let Some(header) = &parsed.header {
        match header.result_code.as_deref() {
            Some(RESULT_CODE_OK) | None => {}
            Some(code) => {
                let message = header
                    .result_msg
                    .clone()
                    .unwrap_or_else(|| format!("result code {}", code));
                return Err(LookupError::Service(message));
            }
        }
    }

    // An absent result container is a normal zero-match outcome
    let items = parsed
        .body
        .and_then(|body| body.items)
        .map(|items| items.item)
        .unwrap_or_default();

    Ok(items.into_iter().map(PillRecord::from).collect())
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    header: Option<ServiceHeader>,
    body: Option<ServiceBody>,
}

#[derive(Debug, Deserialize)]
struct ServiceHeader {
    #[serde(rename = "resultCode")]
    result_code: Option<String>,
    #[serde(rename = "resultMsg")]
    result_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceBody {
    items: Option<ServiceItems>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceItems {
    #[serde(default)]
    item: Vec<RawPillItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::FIELD_PLACEHOLDER;

    const FULL_RESPONSE: &str = r#"
        <response>
            <header>
                <resultCode>00</resultCode>
                <resultMsg>NORMAL SERVICE.</resultMsg>
            </header>
            <body>
                <numOfRows>5</numOfRows>
                <pageNo>1</pageNo>
                <totalCount>2</totalCount>
                <items>
                    <item>
                        <item_name>TestPill</item_name>
                        <entp_name>Acme</entp_name>
                        <item_image>http://x/y.png</item_image>
                        <chart>white round tablet</chart>
                    </item>
                    <item>
                        <entp_name>Acme</entp_name>
                    </item>
                </items>
            </body>
        </response>
    "#;

    #[test]
    fn test_decode_full_response() {
        let records = decode_response(FULL_RESPONSE).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "TestPill");
        assert_eq!(records[0].manufacturer, "Acme");
        assert_eq!(records[0].image_url.as_deref(), Some("http://x/y.png"));
    }

    #[test]
    fn test_decode_record_missing_name_uses_placeholder() {
        let records = decode_response(FULL_RESPONSE).unwrap();
        assert_eq!(records[1].name, FIELD_PLACEHOLDER);
        assert_eq!(records[1].manufacturer, "Acme");
        assert!(records[1].image_url.is_none());
    }

    #[test]
    fn test_decode_empty_items_is_empty_vec() {
        let xml = r#"
            <response>
                <header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>
                <body><totalCount>0</totalCount><items/></body>
            </response>
        "#;
        let records = decode_response(xml).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_absent_items_container_is_empty_vec() {
        let xml = r#"
            <response>
                <header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>
                <body><totalCount>0</totalCount></body>
            </response>
        "#;
        let records = decode_response(xml).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_error_result_code_is_service_error() {
        let xml = r#"
            <response>
                <header>
                    <resultCode>30</resultCode>
                    <resultMsg>SERVICE KEY IS NOT REGISTERED ERROR.</resultMsg>
                </header>
            </response>
        "#;
        match decode_response(xml) {
            Err(LookupError::Service(msg)) => {
                assert!(msg.contains("SERVICE KEY"));
            }
            other => panic!("expected service error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        assert!(matches!(
            decode_response("<<< not xml at all"),
            Err(LookupError::Malformed(_))
        ));
    }
}
