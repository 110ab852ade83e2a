//! ANARCI variable-domain numbering
//!
//! ANARCI searches a protein sequence for antibody variable domains with HMMs
//! and numbers every residue of each domain found. The report it writes is
//! parsed by [`DomainReportParser`] into [`VRegionAnnotation`] records.

pub mod models;
pub mod parser;
pub mod runner;

pub use models::VRegionAnnotation;
pub use parser::DomainReportParser;
pub use runner::find_v_regions;
