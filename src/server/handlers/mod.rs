pub mod analyze;
pub mod health;
pub mod jobs;
pub mod resume;
pub mod scrape;
