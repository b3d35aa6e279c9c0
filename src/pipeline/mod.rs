pub mod import;
pub mod relocate;
pub mod traits;
