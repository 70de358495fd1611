pub mod apply;
pub mod history;
pub mod plan;
pub mod version;
