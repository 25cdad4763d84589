// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Geometry engine for overhead transmission lines: tower orientation,
//! conductor attachment points, span topology and catenary cable paths.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

#[macro_use]
extern crate serde;

pub mod anchors;
pub mod assembler;
pub mod bearing;
pub mod catenary;
pub mod config;
pub mod context;
pub mod elevation;
pub mod errors;
pub mod geodesy;
pub mod math3d;
pub mod models;
pub mod naming;
pub mod overrides;
pub mod pose;
pub mod topology;

mod scenario_tests;

pub use assembler::{AssemblyOutput, SkippedItem, assemble};
pub use config::{CableSettings, TopologyConfig};
pub use context::{ResolutionContext, ResolutionKey, SceneSnapshot};
pub use errors::{ConfigError, GeometryError, GeometryResult};
