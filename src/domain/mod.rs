//! Domain logic - pure rules derived from a bump request, independent of git
//! and of the hosting API

pub mod branch;
pub mod remote;
pub mod request;

pub use branch::{sanitize_package_name, sanitize_version, BumpNames};
pub use remote::RepoInfo;
pub use request::BumpRequest;
