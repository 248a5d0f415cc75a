//! This file is the root of the `jonx` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring the top-level modules of the library (`codec`, `container`,
//!     `bridge`, ...) so the Rust compiler knows they exist.
//! 2.  Re-exporting the public surface, which is the `bridge` layer plus the
//!     types its signatures mention.
//! 3.  Offering an opt-in `env_logger` backend for hosts without their own.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod kernels;
pub mod types;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use bridge::{
    decode, encode, encode_json_slice, encode_with_config, preview, preview_with_config,
    records_from_json_slice, DecodedDocument, PreviewReport,
};
pub use config::{CompressionProfile, JonxConfig};
pub use container::{JonxFile, ReaderState};
pub use error::{JonxError, Result};
pub use types::{Record, StorageType};

//==================================================================================
// 3. Logging
//==================================================================================
use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at `Info` level, once per process.
///
/// With `log_file`, output is appended to that file instead of stderr. Later
/// calls are no-ops, as is the first call when the host already installed a
/// logger.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<()> {
    let target = match log_file {
        Some(filename) => Some(OpenOptions::new().append(true).create(true).open(filename)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
