pub mod models;
pub mod orchestrator;
pub mod session;

pub use models::{CardCaptureOutcome, CardCaptureSummary, CheckoutError, CheckoutResult};
pub use orchestrator::CheckoutOrchestrator;
pub use session::CheckoutSession;
