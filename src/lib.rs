//! Stitchgrid converts photographs into limited-palette thread charts and
//! maintains the layered, undoable pattern grid that all editing runs on.
//!
//! The two halves share one data model: [`pipeline::convert`] produces a
//! [`grid::PixelGrid`] over a [`catalog::ThreadCatalog`], and
//! [`editor::PatternEditor`] owns every subsequent mutation: layers,
//! history, selection, drawing. Rendering, export, and persistence live in
//! host applications; they consume composite grids and flat-array mappings
//! as read-only data.

pub mod catalog;
pub mod color;
pub mod dither;
pub mod draw;
pub mod editor;
pub mod error;
pub mod grid;
pub mod history;
pub mod layers;
pub mod matcher;
pub mod pipeline;
pub mod preprocess;
pub mod quantize;
pub mod sampler;
pub mod selection;
pub mod source;

pub use catalog::{ColorId, PaletteEntry, ThreadCatalog};
pub use editor::PatternEditor;
pub use error::{PatternError, Result};
pub use grid::PixelGrid;
pub use layers::{Layer, LayerStack, MAX_LAYERS};
pub use pipeline::{convert, ConversionOptions, ConversionOutcome};
pub use source::SourceImage;
