pub mod agent;
pub mod client;
pub mod resolver;

#[cfg(test)]
pub mod mock;
