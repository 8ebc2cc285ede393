//! Management commands.

mod loadfixtures;

pub use loadfixtures::{LoadFixturesCommand, LoadFixturesOptions};
