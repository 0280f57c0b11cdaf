// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan - 2D floor plans from IFC building models
//!
//! # Architecture
//!
//! - [`geometry`] - Validated points, bounds and room polygons in plan meters
//! - [`floor`] - Floor levels, per-floor geometry and shared viewer state
//! - [`extractor`] - Storey detection and room outline extraction from an
//!   [`floorplan_model::IfcModel`], with a chain of fallback strategies
//! - [`canvas`] - Toolkit-independent interactive canvas rendering through
//!   a [`canvas::Painter`]
//! - [`widget`] - Floor selector glue around the canvas
//!
//! # Example
//!
//! ```ignore
//! use floorplan::{FloorPlanConfig, FloorPlanWidget, GeometryExtractor};
//!
//! let config = FloorPlanConfig::load("floorplan.json")?;
//! let model = floorplan_step::StepModel::open("building.ifc")?;
//! let floors = GeometryExtractor::new(&model, config.extraction).extract_floor_geometry(None)?;
//!
//! let mut widget = FloorPlanWidget::new(config.canvas);
//! widget.load(floors);
//! println!("{}", widget.status_text());
//! ```

pub mod canvas;
pub mod config;
pub mod error;
pub mod extractor;
pub mod floor;
pub mod geometry;
pub mod hull;
pub mod widget;

pub use canvas::{CanvasEvent, FloorPlanCanvas, ViewTransform};
pub use config::{CanvasConfig, ExtractionConfig, FloorPlanConfig};
pub use error::{ConfigError, ErrorKind, ExtractionError, GeometryError};
pub use extractor::{ExtractionMode, ExtractionReport, GeometryExtractor};
pub use floor::{FloorGeometry, FloorGeometryMap, FloorLevel, FloorPlanState};
pub use geometry::{Bounds, Point2D, Polygon2D};
pub use widget::{FloorEntry, FloorPlanWidget};
