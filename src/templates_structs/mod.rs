// Response and template structs, organized by domain.
// All types are re-exported: `use condominio::templates_structs::*`

mod api;
mod convocatoria;

pub use self::api::{
    BatchRequest, BatchResponseData, DocumentSavedData, RenderQuery, SignatureListData,
    UpsertResponseData,
};
pub use self::convocatoria::NoticeTemplate;
