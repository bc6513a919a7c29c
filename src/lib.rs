//! Edge DNS Compiler
//!
//! Compiles declarative per-domain DNS record sets and HTTP header transforms
//! into validated Cloudflare resource descriptors. Zones are resolved up
//! front; compilation itself is pure and either yields the whole plan or the
//! first error.
//!
//! ```text
//! records.yml ──┐                        ┌── DNS records
//!               ├─ spec ─┬─ records ─────┤── redirect rules
//! transforms.yml┘        └─ transforms ──┴── header rulesets
//!                          ▲
//!        zones (Cloudflare lookup) + server registry
//! ```

pub mod cloudflare;
pub mod config;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod plan;
pub mod records;
pub mod registry;
pub mod spec;
pub mod telemetry;
pub mod transforms;
pub mod zones;

pub use cloudflare::CloudflareClient;
pub use config::Config;
pub use descriptor::ResourceDescriptor;
pub use error::CompileError;
pub use plan::Plan;
pub use records::{CompiledRecords, RecordCompiler};
pub use registry::{Server, ServerRegistry};
pub use spec::{RecordDocument, RecordSpec, TransformDocument};
pub use transforms::TransformCompiler;
pub use zones::{StaticZones, ZoneLookup, ZoneMap, ZoneResolver, ZoneStatus};
