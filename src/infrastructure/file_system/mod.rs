pub mod json_fragment_source;
pub mod json_identifier_store;

pub use json_fragment_source::JsonFragmentSource;
pub use json_identifier_store::JsonIdentifierStore;
