//! Typed configuration registry with strict schemas and pluggable text
//! codecs.
//!
//! Options live in named sections and are addressed by flat keys
//! (`"section.option"` with the default delimiter). Defining an option
//! records its default value and type; strict mode (the default) then
//! rejects reads and writes of anything undefined, catching typos early.
//! File contents pass through a codec registry on the way in and out, so
//! values stay typed in memory and readable on disk.
//!
//! # Example
//!
//! ```
//! use optreg::{Config, Value};
//!
//! let mut config = Config::new();
//! config.define("net.host", "localhost")?;
//! config.define("net.port", 8080)?;
//!
//! let mut out = Vec::new();
//! config.write_to(&mut out)?;
//! assert_eq!(
//!     String::from_utf8_lossy(&out),
//!     "[net]\nhost = localhost\nport = 8080\n\n"
//! );
//!
//! config.read_from("[net]\nport = 9090\n".as_bytes())?;
//! assert_eq!(config.get("net.port")?, Some(&Value::Int(9090)));
//! # Ok::<(), optreg::ConfigError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod section;
pub mod value;

// Re-export the working surface so callers rarely need the module paths.
pub use codec::{Codec, CodecEntry, DecodeFn, EncodeFn};
pub use config::{Config, ConfigBuilder};
pub use error::{ConfigError, DecodeError, Result};
pub use format::{Format, IniFormat};
pub use section::{OptionInfo, Section, SectionMut};
pub use value::Value;
