pub mod help;
pub mod result;
pub mod search;
pub mod session;
pub mod upload;

pub use result::CommandResult;
