// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute name tables
//!
//! Maps schema attribute names to positional indices for the entity types in
//! [`IfcType`]. Indices follow IFC4; where IFC2X3 differs only by the name of
//! an attribute at the same position both names are accepted.

use crate::IfcType;

/// Positional index of `name` on entities of `ifc_type`
pub fn attribute_index(ifc_type: &IfcType, name: &str) -> Option<usize> {
    use IfcType::*;

    match ifc_type {
        IfcProject => root(name).or_else(|| match name {
            "ObjectType" => Some(4),
            "LongName" => Some(5),
            "Phase" => Some(6),
            "RepresentationContexts" => Some(7),
            "UnitsInContext" => Some(8),
            _ => None,
        }),

        IfcSite | IfcBuilding | IfcBuildingStorey | IfcSpace => {
            product(name).or_else(|| match name {
                "LongName" => Some(7),
                "CompositionType" => Some(8),
                _ => match (ifc_type, name) {
                    (IfcBuildingStorey, "Elevation") => Some(9),
                    (IfcBuilding, "ElevationOfRefHeight") => Some(9),
                    (IfcBuilding, "ElevationOfTerrain") => Some(10),
                    (IfcSpace, "PredefinedType" | "InteriorOrExteriorSpace") => Some(9),
                    (IfcSpace, "ElevationWithFlooring") => Some(10),
                    _ => None,
                },
            })
        }

        t if t.is_building_element() || *t == IfcVirtualElement => {
            product(name).or_else(|| match name {
                "Tag" => Some(7),
                _ => None,
            })
        }

        IfcRelAggregates => root(name).or_else(|| match name {
            "RelatingObject" => Some(4),
            "RelatedObjects" => Some(5),
            _ => None,
        }),
        IfcRelContainedInSpatialStructure => root(name).or_else(|| match name {
            "RelatedElements" => Some(4),
            "RelatingStructure" => Some(5),
            _ => None,
        }),
        IfcRelSpaceBoundary | IfcRelSpaceBoundary1stLevel | IfcRelSpaceBoundary2ndLevel => {
            root(name).or_else(|| match name {
                "RelatingSpace" => Some(4),
                "RelatedBuildingElement" => Some(5),
                "ConnectionGeometry" => Some(6),
                "PhysicalOrVirtualBoundary" => Some(7),
                "InternalOrExternalBoundary" => Some(8),
                "ParentBoundary" if *ifc_type != IfcRelSpaceBoundary => Some(9),
                "CorrespondingBoundary" if *ifc_type == IfcRelSpaceBoundary2ndLevel => Some(10),
                _ => None,
            })
        }
        IfcRelDefinesByProperties => root(name).or_else(|| match name {
            "RelatedObjects" => Some(4),
            "RelatingPropertyDefinition" => Some(5),
            _ => None,
        }),

        IfcPropertySet => root(name).or_else(|| match name {
            "HasProperties" => Some(4),
            _ => None,
        }),
        IfcElementQuantity => root(name).or_else(|| match name {
            "MethodOfMeasurement" => Some(4),
            "Quantities" => Some(5),
            _ => None,
        }),
        IfcPropertySingleValue => match name {
            "Name" => Some(0),
            "Description" => Some(1),
            "NominalValue" => Some(2),
            "Unit" => Some(3),
            _ => None,
        },
        IfcQuantityLength | IfcQuantityArea | IfcQuantityVolume | IfcQuantityCount => {
            match (ifc_type, name) {
                (_, "Name") => Some(0),
                (_, "Description") => Some(1),
                (_, "Unit") => Some(2),
                (IfcQuantityLength, "LengthValue")
                | (IfcQuantityArea, "AreaValue")
                | (IfcQuantityVolume, "VolumeValue")
                | (IfcQuantityCount, "CountValue") => Some(3),
                _ => None,
            }
        }

        IfcLocalPlacement => match name {
            "PlacementRelTo" => Some(0),
            "RelativePlacement" => Some(1),
            _ => None,
        },
        IfcAxis2Placement3D => match name {
            "Location" => Some(0),
            "Axis" => Some(1),
            "RefDirection" => Some(2),
            _ => None,
        },
        IfcAxis2Placement2D => match name {
            "Location" => Some(0),
            "RefDirection" => Some(1),
            _ => None,
        },
        IfcCartesianPoint => match name {
            "Coordinates" => Some(0),
            _ => None,
        },
        IfcDirection => match name {
            "DirectionRatios" => Some(0),
            _ => None,
        },
        IfcCartesianTransformationOperator3D => match name {
            "Axis1" => Some(0),
            "Axis2" => Some(1),
            "LocalOrigin" => Some(2),
            "Scale" => Some(3),
            "Axis3" => Some(4),
            _ => None,
        },

        IfcProductDefinitionShape => match name {
            "Name" => Some(0),
            "Description" => Some(1),
            "Representations" => Some(2),
            _ => None,
        },
        IfcShapeRepresentation => match name {
            "ContextOfItems" => Some(0),
            "RepresentationIdentifier" => Some(1),
            "RepresentationType" => Some(2),
            "Items" => Some(3),
            _ => None,
        },
        IfcMappedItem => match name {
            "MappingSource" => Some(0),
            "MappingTarget" => Some(1),
            _ => None,
        },
        IfcRepresentationMap => match name {
            "MappingOrigin" => Some(0),
            "MappedRepresentation" => Some(1),
            _ => None,
        },

        IfcExtrudedAreaSolid => match name {
            "SweptArea" => Some(0),
            "Position" => Some(1),
            "ExtrudedDirection" => Some(2),
            "Depth" => Some(3),
            _ => None,
        },
        IfcRectangleProfileDef => profile(name).or_else(|| match name {
            "Position" => Some(2),
            "XDim" => Some(3),
            "YDim" => Some(4),
            _ => None,
        }),
        IfcArbitraryClosedProfileDef => profile(name).or_else(|| match name {
            "OuterCurve" => Some(2),
            _ => None,
        }),
        IfcPolyline => match name {
            "Points" => Some(0),
            _ => None,
        },
        IfcIndexedPolyCurve => match name {
            "Points" => Some(0),
            "Segments" => Some(1),
            "SelfIntersect" => Some(2),
            _ => None,
        },
        IfcCartesianPointList2D | IfcCartesianPointList3D => match name {
            "CoordList" => Some(0),
            _ => None,
        },
        IfcCompositeCurve => match name {
            "Segments" => Some(0),
            "SelfIntersect" => Some(1),
            _ => None,
        },
        IfcCompositeCurveSegment => match name {
            "Transition" => Some(0),
            "SameSense" => Some(1),
            "ParentCurve" => Some(2),
            _ => None,
        },
        IfcFacetedBrep => match name {
            "Outer" => Some(0),
            _ => None,
        },
        IfcClosedShell => match name {
            "CfsFaces" => Some(0),
            _ => None,
        },
        IfcFace => match name {
            "Bounds" => Some(0),
            _ => None,
        },
        IfcFaceOuterBound | IfcFaceBound => match name {
            "Bound" => Some(0),
            "Orientation" => Some(1),
            _ => None,
        },
        IfcPolyLoop => match name {
            "Polygon" => Some(0),
            _ => None,
        },
        IfcTriangulatedFaceSet => match name {
            "Coordinates" => Some(0),
            "Normals" => Some(1),
            "Closed" => Some(2),
            "CoordIndex" => Some(3),
            _ => None,
        },

        IfcConnectionSurfaceGeometry => match name {
            "SurfaceOnRelatingElement" => Some(0),
            "SurfaceOnRelatedElement" => Some(1),
            _ => None,
        },
        IfcCurveBoundedPlane => match name {
            "BasisSurface" => Some(0),
            "OuterBoundary" => Some(1),
            "InnerBoundaries" => Some(2),
            _ => None,
        },
        IfcPlane => match name {
            "Position" => Some(0),
            _ => None,
        },

        IfcUnitAssignment => match name {
            "Units" => Some(0),
            _ => None,
        },
        IfcSIUnit => match name {
            "Dimensions" => Some(0),
            "UnitType" => Some(1),
            "Prefix" => Some(2),
            "Name" => Some(3),
            _ => None,
        },
        IfcConversionBasedUnit => match name {
            "Dimensions" => Some(0),
            "UnitType" => Some(1),
            "Name" => Some(2),
            "ConversionFactor" => Some(3),
            _ => None,
        },
        IfcMeasureWithUnit => match name {
            "ValueComponent" => Some(0),
            "UnitComponent" => Some(1),
            _ => None,
        },

        _ => None,
    }
}

/// IfcRoot
fn root(name: &str) -> Option<usize> {
    match name {
        "GlobalId" => Some(0),
        "OwnerHistory" => Some(1),
        "Name" => Some(2),
        "Description" => Some(3),
        _ => None,
    }
}

/// IfcRoot + IfcObject + IfcProduct
fn product(name: &str) -> Option<usize> {
    root(name).or_else(|| match name {
        "ObjectType" => Some(4),
        "ObjectPlacement" => Some(5),
        "Representation" => Some(6),
        _ => None,
    })
}

/// IfcProfileDef
fn profile(name: &str) -> Option<usize> {
    match name {
        "ProfileType" => Some(0),
        "ProfileName" => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storey_attributes() {
        let t = IfcType::IfcBuildingStorey;
        assert_eq!(attribute_index(&t, "GlobalId"), Some(0));
        assert_eq!(attribute_index(&t, "LongName"), Some(7));
        assert_eq!(attribute_index(&t, "Elevation"), Some(9));
        assert_eq!(attribute_index(&IfcType::IfcSpace, "Elevation"), None);
    }

    #[test]
    fn test_space_boundary_levels() {
        assert_eq!(
            attribute_index(&IfcType::IfcRelSpaceBoundary, "ParentBoundary"),
            None
        );
        assert_eq!(
            attribute_index(&IfcType::IfcRelSpaceBoundary2ndLevel, "CorrespondingBoundary"),
            Some(10)
        );
        assert_eq!(
            attribute_index(&IfcType::IfcRelSpaceBoundary1stLevel, "PhysicalOrVirtualBoundary"),
            Some(7)
        );
    }

    #[test]
    fn test_element_tag_and_unknown_type() {
        assert_eq!(attribute_index(&IfcType::IfcWall, "Tag"), Some(7));
        assert_eq!(
            attribute_index(&IfcType::Unknown("IFCFOO".into()), "Name"),
            None
        );
    }
}
