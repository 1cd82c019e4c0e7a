use std::{path::PathBuf, time::Duration};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "address-tally")]
#[command(about = "Counts duplicate building entries and floor numbers per city in an XML file")]
pub struct Config {
    /// XML file with `item` elements (city, street, house, floor)
    pub input: PathBuf,

    /// How long to wait for counting tasks once the input is read
    #[arg(long, env = "TALLY_DRAIN_TIMEOUT_SECS", default_value_t = 60)]
    pub drain_timeout_secs: u64,

    /// Worker threads; defaults to the number of CPUs
    #[arg(long, env = "TALLY_WORKERS", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,
}

impl Config {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}
