// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! StepModel - IfcModel implementation for STEP files

use crate::properties::StepProperties;
use crate::resolver::StepResolver;
use crate::scanner::parse_header;
use crate::shapes::StepShapes;
use crate::units::extract_unit_scale;

use floorplan_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, PropertyReader, Result, ShapeSource,
};
use std::path::Path;
use std::sync::Arc;

/// Parsed IFC model
pub struct StepModel {
    resolver: Arc<StepResolver>,
    properties: StepProperties,
    shapes: StepShapes,
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl StepModel {
    /// Index STEP content and build the property and shape facilities
    pub fn parse(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if !content.contains("DATA;") {
            return Err(ParseError::format("missing DATA section"));
        }

        let metadata = parse_header(&content);
        let resolver = Arc::new(StepResolver::new(content));
        if resolver.entity_count() == 0 {
            return Err(ParseError::format("DATA section contains no entities"));
        }

        let unit_scale = extract_unit_scale(resolver.as_ref());
        let properties = StepProperties::new(Arc::clone(&resolver));
        let shapes = StepShapes::new(Arc::clone(&resolver));

        log::info!(
            "Loaded {} model: {} entities, length unit {} m",
            if metadata.schema_version.is_empty() {
                "IFC"
            } else {
                metadata.schema_version.as_str()
            },
            resolver.entity_count(),
            unit_scale
        );

        Ok(Self {
            resolver,
            properties,
            shapes,
            unit_scale,
            metadata,
        })
    }

    /// Read and parse a file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(content)
    }

    /// Override the placement depth guard used for shape creation
    pub fn with_max_placement_depth(mut self, depth: usize) -> Self {
        self.shapes = StepShapes::new(Arc::clone(&self.resolver)).with_max_placement_depth(depth);
        self
    }
}

impl IfcModel for StepModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn properties(&self) -> &dyn PropertyReader {
        &self.properties
    }

    fn shapes(&self) -> Option<&dyn ShapeSource> {
        Some(&self.shapes)
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn release_caches(&self) {
        let cached = self.resolver.cached_count();
        self.resolver.clear_cache();
        log::debug!("Released {cached} cached entities");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_model::IfcType;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_NAME('house.ifc','2024-03-01T10:00:00',(''),(''),'','ArchiCAD','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCBUILDINGSTOREY('st',$,'Plan 1',$,$,$,$,$,.ELEMENT.,0.);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_parse_model() {
        let model = StepModel::parse(TEST_IFC).unwrap();
        assert_eq!(model.metadata().schema_version, "IFC2X3");
        assert!((model.unit_scale() - 0.001).abs() < 1e-12);
        assert_eq!(
            model.resolver().count_by_type(&IfcType::IfcBuildingStorey),
            1
        );
        assert!(model.shapes().is_some());
    }

    #[test]
    fn test_release_caches_keeps_model_usable() {
        let model = StepModel::parse(TEST_IFC).unwrap();
        let before = model.resolver().find_by_type_name("IFCBUILDINGSTOREY");
        model.release_caches();
        let after = model.resolver().find_by_type_name("IFCBUILDINGSTOREY");
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn test_rejects_non_step_content() {
        assert!(StepModel::parse("hello").is_err());
    }
}
