//! KML / GPX → GeoJSON conversion
//!
//! Both dialects run the same pipeline: the text is parsed into an owned
//! [`XmlNode`] tree, geometry-bearing elements are mapped to GeoJSON
//! [`Feature`]s, and the resulting [`FeatureCollection`] is serialized with
//! `serde_json`.
//!
//! # Module Structure
//! - `parse_xml` - quick-xml backed element tree with namespace resolution
//! - `coordinates` - lenient coercion and the strict coordinate token filter
//! - `geojson` - Feature / FeatureCollection / Geometry model and serialization
//! - `kml` - Placemark extraction (Point, LineString, MultiGeometry)
//! - `gpx` - waypoint, route, track and metadata extraction
//! - `converter` - dialect selection and auto-detection
//!
//! # Example
//! ```
//! let kml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Placemark>
//!     <name>Summit</name><Point><coordinates>9.0,45.0,100.0</coordinates></Point>
//! </Placemark></kml>"#;
//! let geojson = geojson_converter::kml::convert(kml).unwrap();
//! assert!(geojson.contains(r#""coordinates":[9.0,45.0,100.0]"#));
//! ```

pub mod converter;
pub mod coordinates;
pub mod geojson;
pub mod gpx;
pub mod kml;
pub mod parse_xml;

pub use converter::{convert_auto, to_feature_collection_auto, Dialect};
pub use geojson::{Feature, FeatureCollection, Geometry, Ordinate, Position, Properties, PropertyValue};
pub use parse_xml::{parse_xml_reader, parse_xml_str, XmlNode};

/// Conversion errors
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input is not well-formed XML. `dialect` is `None` when the
    /// dialect was to be detected from the document itself.
    #[error("error parsing the {} file: {reason}", .dialect.map_or("XML", Dialect::name))]
    InvalidInput {
        dialect: Option<Dialect>,
        reason: String,
    },

    #[error("unrecognized root element <{root}>, expected <kml> or <gpx>")]
    UnknownDialect { root: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn invalid_input(dialect: Option<Dialect>, error: anyhow::Error) -> Self {
        ConvertError::InvalidInput {
            dialect,
            reason: format!("{error:#}"),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ConvertError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
