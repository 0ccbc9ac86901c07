//! Signed client for the Codeforces Polygon REST API
//!
//! Three operations: list a problem, list its packages, download one package
//! as a streamed ZIP. Every request is signed with the account's key pair
//! (see [`sign`]); responses use Polygon's `{status, result}` envelope.

pub mod client;
pub mod error;
pub mod sign;
pub mod types;

pub use client::PolygonClient;
pub use error::{PolygonError, PolygonResult};
pub use types::{Package, Problem};
