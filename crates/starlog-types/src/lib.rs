//! Starlog Types - Pure type definitions for the catalog domain
//!
//! This crate contains only pure data types with no async runtime or
//! database dependencies, so it can be shared by any front end or tool
//! that speaks the Starlog API.

pub mod favorite;
pub mod person;
pub mod planet;
pub mod user;

pub use favorite::*;
pub use person::*;
pub use planet::*;
pub use user::*;
