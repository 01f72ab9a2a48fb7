pub mod catalog_routes;
pub mod graph_routes;
pub mod health_routes;
pub mod job_routes;
pub mod search_routes;

pub use catalog_routes::*;
pub use graph_routes::*;
pub use health_routes::*;
pub use job_routes::*;
pub use search_routes::*;
