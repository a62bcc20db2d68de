// Library interface for intelbrief modules
// This allows tests and other binaries to import modules

pub mod digest;
pub mod discovery;
pub mod ingestion;
pub mod item;
pub mod llm;
pub mod memory;
pub mod pipeline;
pub mod scraping;
