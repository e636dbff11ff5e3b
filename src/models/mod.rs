pub mod acta;
pub mod convocatoria;
pub mod minutes;
pub mod signature;
