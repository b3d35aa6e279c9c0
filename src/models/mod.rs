pub mod encounter;
pub mod enums;
pub mod identity;
pub mod note;

pub use encounter::*;
pub use enums::*;
pub use identity::*;
pub use note::*;
