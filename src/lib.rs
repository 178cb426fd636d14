//! Fetches the MongoDB crypt_shared encryption library for the current host.
//!
//! The pipeline finds the right build in MongoDB's download catalog,
//! downloads it (with a digest-gated local cache), verifies its SHA-256
//! against the catalog-declared digest, and extracts the shared library
//! into a project's `vendor/crypt_shared` directory.
//!
//! # Example
//!
//! ```no_run
//! use crypt_fetch::{Acquirer, Outcome, platform::Platform};
//!
//! # fn main() -> Result<(), crypt_fetch::AcquireError> {
//! let platform = Platform::detect()?;
//! match Acquirer::new(".", platform).run()? {
//!     Outcome::Installed(path) => println!("installed {}", path.display()),
//!     Outcome::NoBuildForHost => eprintln!("no crypt_shared build for this host"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod catalog;
pub mod digest;
pub mod download;
pub mod error;
pub mod extract;
pub mod listing;
pub mod output;
pub mod platform;

pub use acquire::{Acquirer, Outcome};
pub use error::AcquireError;
