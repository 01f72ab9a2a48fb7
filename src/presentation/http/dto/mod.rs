pub mod catalog_dto;
pub mod graph_dto;
pub mod job_dto;
pub mod response_dto;
pub mod search_dto;

pub use catalog_dto::*;
pub use graph_dto::*;
pub use job_dto::*;
pub use response_dto::*;
pub use search_dto::*;
