pub mod error;
pub mod syntax;
pub mod traits;
pub mod types;

pub use error::*;
pub use syntax::*;
pub use traits::*;
pub use types::*;
