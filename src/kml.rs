//! KML → GeoJSON conversion
//!
//! Every `Placemark` in the document becomes one feature, in document order.
//! Placemarks are found through a namespace-qualified query using the root
//! element's namespace, so documents with and without `xmlns` declarations
//! take the same path.
//!
//! Geometry dispatch, first match wins:
//! - `Point` → `Point` (lenient tuple coercion)
//! - `LineString` → `LineString` (strict token filter)
//! - `MultiGeometry` → `MultiLineString` built from its `LineString` children
//! - anything else → [`Geometry::Empty`]

use crate::coordinates::{parse_coordinate_tokens, parse_point_tuple};
use crate::geojson::{Feature, FeatureCollection, Geometry, Position, Properties};
use crate::parse_xml::{parse_xml_str, XmlNode};
use crate::{ConvertError, Dialect, Result};

/// Converts KML text into compact GeoJSON text
pub fn convert(text: &str) -> Result<String> {
    to_feature_collection(text)?.to_json()
}

/// Converts KML text into a [`FeatureCollection`] without serializing it
pub fn to_feature_collection(text: &str) -> Result<FeatureCollection> {
    let root = parse_xml_str(text).map_err(|e| ConvertError::invalid_input(Some(Dialect::Kml), e))?;
    Ok(collect_features(&root))
}

/// Builds the collection from an already parsed KML root
pub fn collect_features(root: &XmlNode) -> FeatureCollection {
    let namespace = root.namespace.as_deref();
    let features: Vec<Feature> = root
        .descendants(namespace, "Placemark")
        .into_iter()
        .map(parse_placemark)
        .collect();

    tracing::debug!(
        placemarks = features.len(),
        namespace = namespace.unwrap_or(""),
        "Converted KML document"
    );
    FeatureCollection::new(features)
}

/// One `Placemark` → one feature with `name` and `description` properties
pub fn parse_placemark(placemark: &XmlNode) -> Feature {
    let mut properties = Properties::new();
    properties.insert("name".to_string(), placemark.child_text("name").into());
    properties.insert("description".to_string(), placemark.child_text("description").into());

    Feature::new(properties, parse_geometry(placemark))
}

pub fn parse_geometry(placemark: &XmlNode) -> Geometry {
    if let Some(point) = placemark.child("Point") {
        let tuple = parse_point_tuple(point.child_text("coordinates"));
        return Geometry::Point(Position::from(tuple));
    }

    if let Some(line_string) = placemark.child("LineString") {
        return Geometry::LineString(parse_line_string(line_string));
    }

    if let Some(multi_geometry) = placemark.child("MultiGeometry") {
        return Geometry::MultiLineString(parse_multi_geometry(multi_geometry));
    }

    Geometry::Empty
}

/// Coordinates of a `LineString` element, malformed tokens dropped
pub fn parse_line_string(line_string: &XmlNode) -> Vec<Position> {
    parse_coordinate_tokens(line_string.child_text("coordinates"))
        .into_iter()
        .map(Position::from)
        .collect()
}

/// Lines of a `MultiGeometry`; non-`LineString` children and lines without a
/// single valid point are skipped
pub fn parse_multi_geometry(multi_geometry: &XmlNode) -> Vec<Vec<Position>> {
    multi_geometry
        .element_children()
        .filter_map(|child| {
            if child.name != "LineString" {
                tracing::trace!(element = %child.name, "Ignoring unsupported MultiGeometry member");
                return None;
            }
            let line = parse_line_string(child);
            (!line.is_empty()).then_some(line)
        })
        .collect()
}
