//! Fixture definitions: parsing, registry, resolution, iteration and
//! entity construction.

mod builder;
mod format;
mod iterator;
mod parser;
mod registry;
mod resolver;

pub use builder::EntityBuilder;
pub use format::{FixtureConfig, FixtureFile, FixtureFormat};
pub use iterator::{FixtureIter, fixtures_iter};
pub use parser::FixtureParser;
pub use registry::{FixtureLoader, FixtureRegistry};
pub use resolver::{FieldValue, FixtureRef, FixtureResolver, ResolvedFixture};
