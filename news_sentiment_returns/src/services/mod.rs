pub mod analysis;
pub mod collector;
pub mod processor;

pub use analysis::AnalysisService;
pub use collector::{CollectedData, DataCollectorService};
pub use processor::{CachedClassifier, DataProcessorService, TextCleaner};
