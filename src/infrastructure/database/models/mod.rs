pub mod document_model;
pub mod embedding_model;
pub mod graph_model;
pub mod job_model;
pub mod publication_model;

pub use document_model::*;
pub use embedding_model::*;
pub use graph_model::*;
pub use job_model::*;
pub use publication_model::*;
