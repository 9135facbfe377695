// Doc Sorter - document intake pipeline for legal case files

pub mod config;
pub mod models;
pub mod types;
pub mod pipeline;  // Extraction, gatekeeping, classification and filing
pub mod notify;    // Client and admin notifications
pub mod routes;
pub mod middleware;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use pipeline::{Pipeline, ProcessReport};
pub use types::{ClientContact, DocumentType, Outcome, SorterError, SorterResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
