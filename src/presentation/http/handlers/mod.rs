pub mod catalog_handler;
pub mod graph_handler;
pub mod job_handler;
pub mod responses;
pub mod search_handler;

pub use catalog_handler::CatalogHandler;
pub use graph_handler::GraphHandler;
pub use job_handler::JobHandler;
pub use search_handler::SearchHandler;
