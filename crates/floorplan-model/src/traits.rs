// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core model trait

use crate::{EntityResolver, ModelMetadata, PropertyReader, ShapeSource};

/// Progress callback type: (status message, percent 0..=100)
pub type ProgressCallback<'a> = dyn FnMut(&str, u8) + 'a;

/// Read-only access to a loaded IFC model
///
/// The model is `Send + Sync` so a host may run extraction on a worker
/// thread; the floor-plan core itself never spawns threads.
pub trait IfcModel: Send + Sync {
    /// Entity lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Property sets and quantities
    fn properties(&self) -> &dyn PropertyReader;

    /// Shape creation facility, if the provider has one
    fn shapes(&self) -> Option<&dyn ShapeSource> {
        None
    }

    /// Unit scale factor (file length units to meters)
    ///
    /// Common values:
    /// - 1.0 for meters
    /// - 0.001 for millimeters
    /// - 0.3048 for feet
    fn unit_scale(&self) -> f64;

    /// File metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;

    /// Drop decoded-entity caches; called between extraction batches
    fn release_caches(&self) {}
}
