//! Investigation Normalizer — parses raw trade-remedy case records into
//! structured tags.
//!
//! Pure functions, no I/O. Each raw record becomes one `InvestigationTag`
//! carrying the countries named in its title, every case number the title
//! mentions (ranges expanded), the trade-remedy case types, and the product
//! portion of the title.

pub mod case_numbers;
mod normalize;
pub mod types;

pub use normalize::normalize;
pub use types::{CaseType, InvestigationTag, RawInvestigation};
