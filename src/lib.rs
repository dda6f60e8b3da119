pub mod cra;
pub mod net;
pub mod queue;
pub mod sim;
pub mod stats;

#[cfg(test)]
mod test;
