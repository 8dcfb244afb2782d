//! Actuator drivers and the aggregating [`FanBank`].

pub mod fan;

use heapless::Vec;

use crate::error::{Error, Result};
use fan::{FanDriver, FanStatus};

/// Maximum number of fans per controller.
pub const MAX_FANS: usize = 8;

#[derive(Default)]
pub struct FanBank {
    fans: Vec<FanDriver, MAX_FANS>,
}

impl FanBank {
    pub fn new() -> Self {
        Self { fans: Vec::new() }
    }

    pub fn add(&mut self, fan: FanDriver) -> Result<()> {
        self.fans
            .push(fan)
            .map_err(|_| Error::Config("fan limit reached"))
    }

    pub fn get(&self, id: &str) -> Option<&FanDriver> {
        self.fans.iter().find(|f| f.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FanDriver> {
        self.fans.iter_mut().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FanDriver> {
        self.fans.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FanDriver> {
        self.fans.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fans.is_empty()
    }

    pub fn statuses(&self) -> Vec<FanStatus, MAX_FANS> {
        self.fans.iter().map(FanDriver::status).collect()
    }
}
