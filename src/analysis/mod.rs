/// Analysis layer: the continuum-removal and band-metrics engine.
///
/// Architecture:
/// ```text
///  clicked anchors            shared x-axis + reflectance series
///        │                                  │
///        ▼                                  ▼
///   ┌───────────┐                    ┌──────────────┐
///   │ endpoints  │  pair + order     │  continuum    │  mask → line → ratio
///   └───────────┘ ────────────────▶ │  (aggregator) │
///                                    └──────────────┘
///                                           │
///                             ┌─────────────┴───────────┐
///                             ▼                         ▼
///                       ┌──────────┐              ┌──────────┐
///                       │ metrics   │ per segment │  report   │  rows → CSV
///                       └──────────┘              └──────────┘
/// ```
///
/// The engine is a pure function of its inputs: it holds no state across
/// runs, and the UI passes snapshots in rather than sharing live state.
pub mod continuum;
pub mod endpoints;
pub mod metrics;
pub mod report;

pub use continuum::{remove_continuum, ContinuumRun, RemovalError};
pub use endpoints::{ContinuumAnchor, EndpointPair};
pub use report::BandMetricsRow;
