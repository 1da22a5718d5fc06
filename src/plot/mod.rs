//! Charts: time-series overlays, importance bars, value distributions.
//!
//! Each chart is described by a plan type that holds exactly what will be
//! drawn ([`OverlayPlan`], [`BarPlan`], [`DistributionPlan`]). The
//! [`render`] functions draw a plan to an SVG or PNG file chosen by the
//! output extension.

pub mod bars;
pub mod histogram;
pub mod overlay;
pub mod palette;
pub mod render;

pub use bars::{Bar, BarKind, BarPlan, UNMAPPED_LABEL};
pub use histogram::DistributionPlan;
pub use overlay::{Band, BandKind, OverlayPlan, Series};
pub use render::{render_bars, render_distributions, render_overlay, OutputFormat, PlotError, RenderOptions};
