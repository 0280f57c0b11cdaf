// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit scale extraction

use floorplan_model::{AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, IfcType};

/// Scale assumed when the file declares no length unit (millimetres)
pub const DEFAULT_LENGTH_SCALE: f64 = 0.001;

/// Length unit of the model in meters per file unit
///
/// Follows IfcProject.UnitsInContext to the LENGTHUNIT entry. Files without a
/// usable declaration fall back to [`DEFAULT_LENGTH_SCALE`].
pub fn extract_unit_scale(resolver: &dyn EntityResolver) -> f64 {
    let Some(project) = resolver
        .entities_by_type(&IfcType::IfcProject)
        .into_iter()
        .next()
    else {
        log::debug!("No IfcProject; assuming millimetre coordinates");
        return DEFAULT_LENGTH_SCALE;
    };

    let scale = resolver
        .follow(&project, "UnitsInContext")
        .map(|assignment| resolver.follow_all(&assignment, "Units"))
        .unwrap_or_default()
        .iter()
        .find_map(|unit| length_unit_scale(unit, resolver, 0));

    match scale {
        Some(scale) if scale.is_finite() && scale > 0.0 => scale,
        _ => {
            log::debug!("No length unit declared; assuming millimetre coordinates");
            DEFAULT_LENGTH_SCALE
        }
    }
}

fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver, depth: usize) -> Option<f64> {
    if unit.attr_enum("UnitType")? != "LENGTHUNIT" {
        return None;
    }
    match unit.ifc_type {
        IfcType::IfcSIUnit => si_unit_scale(unit),
        IfcType::IfcConversionBasedUnit if depth < 4 => {
            let factor = resolver.follow(unit, "ConversionFactor")?;
            let value = factor.attribute("ValueComponent").and_then(measure_value)?;
            let base = resolver
                .follow(&factor, "UnitComponent")
                .and_then(|base| length_unit_scale(&base, resolver, depth + 1))
                .unwrap_or(1.0);
            Some(value * base)
        }
        _ => None,
    }
}

/// IFCSIUNIT(*, .LENGTHUNIT., Prefix, .METRE.)
fn si_unit_scale(unit: &DecodedEntity) -> Option<f64> {
    if unit.attr_enum("Name")? != "METRE" {
        return None;
    }
    let prefix = match unit.attr_enum("Prefix") {
        Some("KILO") => 1e3,
        Some("HECTO") => 1e2,
        Some("DECA") => 1e1,
        Some("DECI") => 1e-1,
        Some("CENTI") => 1e-2,
        Some("MILLI") => 1e-3,
        Some("MICRO") => 1e-6,
        Some("NANO") => 1e-9,
        _ => 1.0,
    };
    Some(prefix)
}

fn measure_value(attr: &AttributeValue) -> Option<f64> {
    attr.as_float()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepResolver;

    fn scale_of(units: &str) -> f64 {
        let content = format!(
            "DATA;\n#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n#2=IFCUNITASSIGNMENT((#3));\n{units}\nENDSEC;\n"
        );
        extract_unit_scale(&StepResolver::new(content))
    }

    #[test]
    fn test_millimetre() {
        let s = scale_of("#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);");
        assert!((s - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_metre() {
        let s = scale_of("#3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);");
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_foot_conversion() {
        let s = scale_of(
            "#3=IFCCONVERSIONBASEDUNIT(#4,.LENGTHUNIT.,'FOOT',#5);\n#4=IFCDIMENSIONALEXPONENTS(1,0,0,0,0,0,0);\n#5=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#6);\n#6=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);",
        );
        assert!((s - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_missing_length_unit_defaults_to_millimetre() {
        let s = scale_of("#3=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);");
        assert!((s - DEFAULT_LENGTH_SCALE).abs() < 1e-12);
    }
}
