pub mod gemini;
pub mod pdf;

pub use gemini::GeminiGateway;
pub use pdf::PdfReportRenderer;
