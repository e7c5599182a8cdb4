//! Dialect selection shared by the library façade and the CLI

use crate::geojson::FeatureCollection;
use crate::parse_xml::{parse_xml_str, XmlNode};
use crate::{gpx, kml, ConvertError, Result};
use std::fmt;
use std::path::Path;

/// Source XML dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Kml,
    Gpx,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Kml => "KML",
            Dialect::Gpx => "GPX",
        }
    }

    /// Dialect for a file extension (`kml`, `gpx`; case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "kml" => Some(Dialect::Kml),
            "gpx" => Some(Dialect::Gpx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Dialect::from_extension)
    }

    /// Dialect for a document root element local name (`kml`, `gpx`)
    pub fn from_root_name(name: &str) -> Option<Self> {
        match name {
            "kml" => Some(Dialect::Kml),
            "gpx" => Some(Dialect::Gpx),
            _ => None,
        }
    }

    /// Converts text of this dialect into compact GeoJSON text
    pub fn convert(self, text: &str) -> Result<String> {
        match self {
            Dialect::Kml => kml::convert(text),
            Dialect::Gpx => gpx::convert(text),
        }
    }

    pub fn to_feature_collection(self, text: &str) -> Result<FeatureCollection> {
        match self {
            Dialect::Kml => kml::to_feature_collection(text),
            Dialect::Gpx => gpx::to_feature_collection(text),
        }
    }

    pub fn collect_features(self, root: &XmlNode) -> FeatureCollection {
        match self {
            Dialect::Kml => kml::collect_features(root),
            Dialect::Gpx => gpx::collect_features(root),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses the document once and converts it according to its root element
pub fn to_feature_collection_auto(text: &str) -> Result<(Dialect, FeatureCollection)> {
    let root = parse_xml_str(text).map_err(|e| ConvertError::invalid_input(None, e))?;
    let dialect = Dialect::from_root_name(&root.name).ok_or_else(|| ConvertError::UnknownDialect {
        root: root.name.clone(),
    })?;
    Ok((dialect, dialect.collect_features(&root)))
}

/// Converts a KML or GPX document, picking the dialect from its root element
pub fn convert_auto(text: &str) -> Result<String> {
    let (_, collection) = to_feature_collection_auto(text)?;
    collection.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("walk.gpx")), Some(Dialect::Gpx));
        assert_eq!(Dialect::from_path(Path::new("dir/Places.KML")), Some(Dialect::Kml));
        assert_eq!(Dialect::from_path(Path::new("notes.txt")), None);
        assert_eq!(Dialect::from_path(Path::new("kml")), None);
    }

    #[test]
    fn test_auto_detection() {
        let (dialect, collection) = to_feature_collection_auto("<gpx/>").unwrap();
        assert_eq!(dialect, Dialect::Gpx);
        assert!(collection.properties.is_some());

        let (dialect, collection) =
            to_feature_collection_auto(r#"<kml xmlns="http://www.opengis.net/kml/2.2"/>"#).unwrap();
        assert_eq!(dialect, Dialect::Kml);
        assert!(collection.properties.is_none());
    }

    #[test]
    fn test_auto_detection_errors() {
        let err = convert_auto("<svg/>").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownDialect { ref root } if root == "svg"));

        let err = convert_auto("<kml>").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().starts_with("error parsing the XML file"));
    }
}
