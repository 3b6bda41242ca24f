//! # driver-dedup CLI
//!
//! Command-line interface for the driver store cleaner.
//!
//! ## Usage
//! ```bash
//! driver-dedup scan
//! driver-dedup scan --verbose --output json
//! driver-dedup clean --yes
//! ```

mod cli;

use driver_store_cleaner::Result;

fn main() -> Result<()> {
    cli::run()
}
