//! GeoJSON document model and serialization
//!
//! Every value here is built once per conversion and owned by it. The
//! structures serialize straight into the GeoJSON shapes through serde, so the
//! assembler is just `serde_json` over a [`FeatureCollection`].

use crate::ConvertError;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One component of a position
///
/// Positions are numeric, except that GPX route and track points carry their
/// ISO-8601 time as a trailing text component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ordinate {
    Number(f64),
    Time(String),
}

/// An ordered coordinate tuple, longitude first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Position(pub Vec<Ordinate>);

impl Position {
    /// A `[lon, lat]` position
    pub fn lon_lat(lon: f64, lat: f64) -> Self {
        Position(vec![Ordinate::Number(lon), Ordinate::Number(lat)])
    }

    pub fn push_number(&mut self, value: f64) {
        self.0.push(Ordinate::Number(value));
    }

    pub fn push_time(&mut self, time: impl Into<String>) {
        self.0.push(Ordinate::Time(time.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for Position {
    fn from(values: Vec<f64>) -> Self {
        Position(values.into_iter().map(Ordinate::Number).collect())
    }
}

/// Geometry of a feature
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// No recognized geometry; serialized as `null`
    Empty,
}

impl Geometry {
    /// GeoJSON `type` name, `None` for [`Geometry::Empty`]
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Geometry::Point(_) => Some("Point"),
            Geometry::LineString(_) => Some("LineString"),
            Geometry::MultiLineString(_) => Some("MultiLineString"),
            Geometry::Empty => None,
        }
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Geometry::Point(position) => serialize_shape(serializer, "Point", position),
            Geometry::LineString(positions) => serialize_shape(serializer, "LineString", positions),
            Geometry::MultiLineString(lines) => serialize_shape(serializer, "MultiLineString", lines),
            Geometry::Empty => serializer.serialize_none(),
        }
    }
}

fn serialize_shape<S, C>(serializer: S, kind: &str, coordinates: &C) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    C: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("type", kind)?;
    map.serialize_entry("coordinates", coordinates)?;
    map.end()
}

/// A property value: text or number
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

/// Property mapping; keys keep insertion order
pub type Properties = IndexMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub properties: Properties,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(properties: Properties, geometry: Geometry) -> Self {
        Feature { properties, geometry }
    }
}

/// Top-level GeoJSON document
///
/// `properties` is only present for dialects that carry document metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// A collection without a `properties` member
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { properties: None, features }
    }

    /// A collection with a `properties` member, emitted even when empty
    pub fn with_properties(properties: Properties, features: Vec<Feature>) -> Self {
        FeatureCollection {
            properties: Some(properties),
            features,
        }
    }

    /// Compact GeoJSON text
    pub fn to_json(&self) -> Result<String, ConvertError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented GeoJSON text
    pub fn to_json_pretty(&self) -> Result<String, ConvertError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_value<T: Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).expect("serialization failed")
    }

    #[test]
    fn test_geometry_serialization() {
        let point = Geometry::Point(Position::from(vec![9.0, 45.0, 100.0]));
        assert_eq!(to_value(&point), json!({"type": "Point", "coordinates": [9.0, 45.0, 100.0]}));

        let mut timed = Position::lon_lat(9.0, 45.0);
        timed.push_number(100.0);
        timed.push_time("2024-01-01T12:00:00Z");
        let line = Geometry::LineString(vec![timed, Position::lon_lat(9.1, 45.1)]);
        assert_eq!(
            to_value(&line),
            json!({
                "type": "LineString",
                "coordinates": [[9.0, 45.0, 100.0, "2024-01-01T12:00:00Z"], [9.1, 45.1]]
            })
        );

        let multi = Geometry::MultiLineString(vec![]);
        assert_eq!(to_value(&multi), json!({"type": "MultiLineString", "coordinates": []}));

        assert_eq!(to_value(&Geometry::Empty), serde_json::Value::Null);
        assert_eq!(Geometry::Empty.type_name(), None);
    }

    #[test]
    fn test_feature_collection_shape() {
        let mut properties = Properties::new();
        properties.insert("name".to_string(), "A".into());
        properties.insert("ele".to_string(), PropertyValue::from(100.0));
        let feature = Feature::new(properties, Geometry::Point(Position::lon_lat(1.0, 2.0)));

        let without = FeatureCollection::new(vec![feature]);
        let value = to_value(&without);
        assert_eq!(value["type"], "FeatureCollection");
        assert!(value.get("properties").is_none());
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["properties"], json!({"name": "A", "ele": 100.0}));

        let with = FeatureCollection::with_properties(Properties::new(), vec![]);
        assert_eq!(
            to_value(&with),
            json!({"type": "FeatureCollection", "properties": {}, "features": []})
        );
    }

    #[test]
    fn test_json_text_round_trips_numbers() {
        let collection = FeatureCollection::new(vec![Feature::new(
            Properties::new(),
            Geometry::Point(Position::from(vec![9.1, 45.123456789, 100.0])),
        )]);
        let text = collection.to_json().unwrap();
        assert!(text.starts_with(r#"{"type":"FeatureCollection","features":["#));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["features"][0]["geometry"]["coordinates"], json!([9.1, 45.123456789, 100.0]));

        let pretty = collection.to_json_pretty().unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(serde_json::from_str::<serde_json::Value>(&pretty).unwrap(), parsed);
    }
}
