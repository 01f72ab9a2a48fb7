pub mod assembler;
pub mod document_graph;
pub mod errors;
pub mod fragment;
pub mod markers;

pub use assembler::{AssembledDocument, AssemblyOptions, GraphAssembler, HeaderFooterPolicy};
pub use document_graph::{
    render_heading_text, DocumentGraph, GraphEntry, HeadingFormat, RelationDirection,
};
pub use errors::{AssemblyError, UnresolvedReference};
pub use fragment::{parse_stream, stream_fingerprint, Fragment, MarkerSpec};
pub use markers::{Marker, MarkerKind, MarkerScanner};
