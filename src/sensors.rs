//! Sensor drivers, one module per model, each behind its Cargo feature.

#[cfg(feature = "gc2607")]
pub mod gc2607;
#[cfg(feature = "mira220")]
pub mod mira220;
#[cfg(feature = "pivariety")]
pub mod pivariety;
#[cfg(feature = "sc035hgs")]
pub mod sc035hgs;
#[cfg(feature = "sc202cs")]
pub mod sc202cs;
