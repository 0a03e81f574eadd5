// Library interface for newsdigest modules
// This allows tests and other binaries to import modules

pub mod extraction;
pub mod ingestion;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod scraping;
pub mod server;
