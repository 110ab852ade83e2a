//! SignalP signal peptide prediction

pub mod models;
pub mod parser;
pub mod runner;

pub use models::SignalPeptideAnnotation;
pub use parser::SignalPeptideParser;
pub use runner::find_signal_peptide;
