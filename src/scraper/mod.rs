pub mod extract;
pub mod fetch;
pub mod job;
pub mod selectors;
pub mod summary;
