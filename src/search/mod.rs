//! Search Pipeline
//!
//! One user action runs one classify-then-lookup sequence to completion:
//! classify the sketch, extract the imprint via OCR, query the drug service,
//! hand the outcome to the UI. OCR failures degrade to an empty imprint with
//! a warning; lookup failures end the search for this action. Nothing is
//! retried and no state outlives the action except the lookup cache.

use anyhow::{Context, Result};
use image::RgbImage;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::config::{AppConfig, LookupTransport};
use crate::lookup::{
    LookupError, PillLookup, PillQuery, PillRecord, PillSearchClient, RestLookup, SoapLookup,
};
use crate::vision::{self, classify, GoogleVisionOcr, OcrClient, ShapeLabel};

/// Everything the UI needs to render one finished search
#[derive(Debug)]
pub struct SearchOutcome {
    /// Classified silhouette shape
    pub shape: ShapeLabel,
    /// Extracted imprint text, possibly empty
    pub imprint: String,
    /// Non-blocking warning when OCR was unavailable
    pub ocr_warning: Option<String>,
    /// Matching records, or the lookup failure for this action
    pub records: Result<Vec<PillRecord>, LookupError>,
}

/// Synchronous search pipeline driven by the UI
pub struct SearchPipeline {
    runtime: Runtime,
    ocr: Box<dyn OcrClient>,
    lookup: PillSearchClient,
}

impl SearchPipeline {
    /// Build the pipeline from configuration, selecting the lookup transport
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let ocr = Box::new(GoogleVisionOcr::new(&config.ocr.endpoint, &config.ocr.api_key));

        let transport: Box<dyn PillLookup> = match config.lookup.transport {
            LookupTransport::Rest => Box::new(RestLookup::new(
                &config.lookup.rest_endpoint,
                &config.lookup.service_key,
            )),
            LookupTransport::Soap => Box::new(SoapLookup::new(
                &config.lookup.soap_endpoint,
                &config.lookup.service_key,
            )),
        };
        info!("Lookup transport: {:?}", config.lookup.transport);

        Self::new(ocr, transport)
    }

    /// Build the pipeline from explicit collaborators
    pub fn new(ocr: Box<dyn OcrClient>, transport: Box<dyn PillLookup>) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;

        Ok(Self {
            runtime,
            ocr,
            lookup: PillSearchClient::new(transport),
        })
    }

    /// Run one search action over the rasterized sketch
    pub fn run(&self, sketch: &RgbImage) -> SearchOutcome {
        let shape = classify(sketch);
        info!("Estimated shape: {}", shape);

        let (imprint, ocr_warning) = match self.extract_imprint(sketch) {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("OCR unavailable, searching without imprint: {}", e);
                (String::new(), Some(format!("Text extraction unavailable: {}", e)))
            }
        };

        let query = PillQuery {
            shape,
            imprint: imprint.clone(),
        };
        let records = self.runtime.block_on(self.lookup.lookup(&query));

        SearchOutcome {
            shape,
            imprint,
            ocr_warning,
            records,
        }
    }

    fn extract_imprint(&self, sketch: &RgbImage) -> Result<String> {
        let png = vision::encode_png(sketch)?;
        let text = self.runtime.block_on(self.ocr.extract_text(&png))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::OcrError;
    use async_trait::async_trait;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    struct StubOcr {
        result: fn() -> Result<String, OcrError>,
    }

    #[async_trait]
    impl OcrClient for StubOcr {
        async fn extract_text(&self, _png: &[u8]) -> Result<String, OcrError> {
            (self.result)()
        }
    }

    struct StubLookup {
        records: Vec<PillRecord>,
    }

    #[async_trait]
    impl PillLookup for StubLookup {
        async fn search(&self, _query: &PillQuery) -> Result<Vec<PillRecord>, LookupError> {
            Ok(self.records.clone())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl PillLookup for FailingLookup {
        async fn search(&self, _query: &PillQuery) -> Result<Vec<PillRecord>, LookupError> {
            Err(LookupError::Status(503))
        }
    }

    fn circle_sketch() -> RgbImage {
        let mut image = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        draw_filled_circle_mut(&mut image, (150, 150), 100, Rgb([0, 0, 0]));
        image
    }

    fn test_record() -> PillRecord {
        PillRecord {
            name: "TestPill".to_string(),
            manufacturer: "Acme".to_string(),
            image_url: Some("http://x/y.png".to_string()),
        }
    }

    #[test]
    fn test_end_to_end_circle_sketch_with_stub_services() {
        let pipeline = SearchPipeline::new(
            Box::new(StubOcr {
                result: || Ok("TY".to_string()),
            }),
            Box::new(StubLookup {
                records: vec![test_record()],
            }),
        )
        .unwrap();

        let outcome = pipeline.run(&circle_sketch());

        assert_eq!(outcome.shape, ShapeLabel::Circle);
        assert_eq!(outcome.imprint, "TY");
        assert!(outcome.ocr_warning.is_none());
        assert_eq!(outcome.records.unwrap(), vec![test_record()]);
    }

    #[test]
    fn test_ocr_failure_degrades_to_empty_imprint() {
        let pipeline = SearchPipeline::new(
            Box::new(StubOcr {
                result: || Err(OcrError::Status(429)),
            }),
            Box::new(StubLookup {
                records: vec![test_record()],
            }),
        )
        .unwrap();

        let outcome = pipeline.run(&circle_sketch());

        // The search still completes; the warning is non-blocking
        assert_eq!(outcome.imprint, "");
        assert!(outcome.ocr_warning.is_some());
        assert_eq!(outcome.records.unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_failure_is_distinct_from_empty_result() {
        let pipeline = SearchPipeline::new(
            Box::new(StubOcr {
                result: || Ok(String::new()),
            }),
            Box::new(FailingLookup),
        )
        .unwrap();

        let outcome = pipeline.run(&circle_sketch());

        assert!(matches!(outcome.records, Err(LookupError::Status(503))));
    }

    #[test]
    fn test_blank_sketch_classifies_as_other() {
        let pipeline = SearchPipeline::new(
            Box::new(StubOcr {
                result: || Ok(String::new()),
            }),
            Box::new(StubLookup { records: vec![] }),
        )
        .unwrap();

        let blank = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        let outcome = pipeline.run(&blank);

        assert_eq!(outcome.shape, ShapeLabel::Other);
        assert_eq!(outcome.records.unwrap(), vec![]);
    }
}
