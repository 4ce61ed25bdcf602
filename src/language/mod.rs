// Types representing the structure extracted from Nextflow scripts

mod error;
mod types;

// Re-export all public symbols
pub use error::*;
pub use types::*;
