//! CLI command implementations

mod batch;
mod export;
mod import;
mod info;
mod list;
mod validate;

pub use batch::batch;
pub use export::export;
pub use import::import;
pub use info::info;
pub use list::list;
pub use validate::validate;
