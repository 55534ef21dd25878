pub mod request;
pub mod tool;

pub use tool::FormTool;
