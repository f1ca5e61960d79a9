//! Command Line Interface module
//!
//! One submodule per subcommand:
//! - `fetch`: single-track lyrics download
//! - `dir`: rate-limited batch download over a directory of audio files
//! - `token`: token minting and inspection
//! - `config`: configuration inspection

pub mod config;
pub mod dir;
pub mod fetch;
pub mod token;
