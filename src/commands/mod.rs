pub mod edit;
pub mod list;

pub use edit::{build_descriptor, run_edit};
pub use list::list_headers;
