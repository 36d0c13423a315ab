pub mod component_id;
mod component_type;
mod signature;
mod type_expr;

pub use component_id::ComponentId;
pub use component_type::*;
pub use signature::*;
pub use type_expr::*;
