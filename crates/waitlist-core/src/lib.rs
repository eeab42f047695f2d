pub mod config;
pub mod logging;

pub mod control;
pub mod cooldown;
pub mod retry;
pub mod transport;
pub mod waitlist;

#[cfg(test)]
pub(crate) mod testing;
