//! Flow-shop domain models.
//!
//! Plain data types for recipes, demand and schedules. They carry no
//! solver state; variables live in per-run instances built by
//! [`crate::flowshop`].
//!
//! # Domain Mappings
//!
//! | recipe-schedule | Brewery | Pharma | Chemicals |
//! |-----------------|---------|--------|-----------|
//! | Recipe | Brew sheet | Master batch record | Formula |
//! | Process | Mashing / Boiling | Granulation | Reaction step |
//! | Resource | Kettle / Tank | Blender | Reactor |
//! | Order | Batch request | Lot | Campaign |
//! | Program | Brew plan | Production schedule | Campaign plan |

mod order;
mod program;
mod recipe;
mod resource;
mod stop;
mod time;

pub use order::{Demand, Order};
pub use program::{squash_intervals, Plan, PlanLink, ProcessLink, Program};
pub use recipe::{Process, Recipe};
pub use resource::{Material, Resource, ResourceType};
pub use stop::Stop;
pub use time::{Pivot, TimeScale};
