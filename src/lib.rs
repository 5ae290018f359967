// Library for tests to access modules

pub mod config;
pub mod daemon;
pub mod device;
pub mod diskstats;
pub mod power;
pub mod state;
pub mod trigger;
pub mod version;
