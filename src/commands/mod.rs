pub mod completion;
pub mod land;
