pub mod analysis;
pub mod domain;
pub mod extraction;
pub mod layout;
pub mod ports;
pub mod prompt;
pub mod validation;

pub use analysis::{AnalysisError, AnalysisOutcome, AnalysisService, RawAnalysis};
pub use domain::{AnalysisReport, AudioUpload, Confidence, GeneratedPdf, PdfOutcome};
pub use extraction::{extract_json, Extraction};
pub use layout::{layout_report, layout_text, PageGeometry, ReportLayout};
pub use ports::{ModelGateway, PortError, PortResult, ReportRenderer};
