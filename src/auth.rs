//! Auth-domain host identifiers, token secrets, and the credential variants.

pub mod host;
pub mod token;

pub use host::*;
pub use token::{app::*, env_var::*, oauth::*, record::*, secret::*, *};
