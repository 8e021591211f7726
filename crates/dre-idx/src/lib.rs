//! IDX/DRE export serializer.
//!
//! Serializes one [`Entity`] into the tagged-line format consumed by document
//! indexing ingestion:
//!
//! ```text
//! #DREREFERENCE doc-1
//! #DRETITLE
//! Quarterly report
//! #DREFIELD Author= "Alice"
//! #DREFIELD Tag1= "finance"
//! #DREFIELD Tag2= "q3"
//! #DREENDDOC
//! #DREENDDATAREFERENCE
//! ```
//!
//! The fixed `DRE*` fields come first in a fixed order; every other property
//! follows as a `DREFIELD` in the entity's own order.

mod serializer;

pub use serializer::{
    to_idx_data, to_idx_document, to_idx_documents, FieldSpec, StringStyle, DRE_END_DATA,
    DRE_END_DATA_REFERENCE, DRE_END_DOC, DRE_FIELD, ORDERED_DRE_FIELDS,
};
