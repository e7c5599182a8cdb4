//! GPX → GeoJSON conversion
//!
//! Features are emitted section by section: waypoints (`Point`), then routes
//! (`LineString`), then tracks (`MultiLineString`, one line per `trkseg`).
//! The optional `metadata` block becomes the collection's `properties`, which
//! are always present for GPX, empty when there is no metadata.

use crate::coordinates::coerce_lenient;
use crate::geojson::{Feature, FeatureCollection, Geometry, Position, Properties};
use crate::parse_xml::{parse_xml_str, XmlNode};
use crate::{ConvertError, Dialect, Result};

/// Converts GPX text into compact GeoJSON text
pub fn convert(text: &str) -> Result<String> {
    to_feature_collection(text)?.to_json()
}

/// Converts GPX text into a [`FeatureCollection`] without serializing it
pub fn to_feature_collection(text: &str) -> Result<FeatureCollection> {
    let root = parse_xml_str(text).map_err(|e| ConvertError::invalid_input(Some(Dialect::Gpx), e))?;
    Ok(collect_features(&root))
}

/// Builds the collection from an already parsed `gpx` root
pub fn collect_features(root: &XmlNode) -> FeatureCollection {
    let waypoints = parse_waypoints(root.children_named("wpt"));
    let routes = parse_routes(root.children_named("rte"));
    let tracks = parse_tracks(root.children_named("trk"));

    tracing::debug!(
        waypoints = waypoints.len(),
        routes = routes.len(),
        tracks = tracks.len(),
        "Converted GPX document"
    );

    let mut features = waypoints;
    features.extend(routes);
    features.extend(tracks);

    let properties = root.child("metadata").map(parse_metadata).unwrap_or_default();
    FeatureCollection::with_properties(properties, features)
}

pub fn parse_waypoints<'a>(waypoints: impl IntoIterator<Item = &'a XmlNode>) -> Vec<Feature> {
    waypoints.into_iter().map(parse_waypoint).collect()
}

/// `wpt` → `Point` feature with `name`, `description`, `ele`, `time` and
/// `comment` properties
pub fn parse_waypoint(waypoint: &XmlNode) -> Feature {
    let mut properties = Properties::new();
    properties.insert("name".to_string(), waypoint.child_text("name").into());
    properties.insert("description".to_string(), waypoint.child_text("desc").into());
    properties.insert("ele".to_string(), coerce_lenient(waypoint.child_text("ele")).into());
    properties.insert("time".to_string(), waypoint.child_text("time").into());
    properties.insert("comment".to_string(), waypoint.child_text("cmt").into());

    Feature::new(properties, Geometry::Point(lon_lat(waypoint)))
}

pub fn parse_routes<'a>(routes: impl IntoIterator<Item = &'a XmlNode>) -> Vec<Feature> {
    routes.into_iter().map(parse_route).collect()
}

/// `rte` → `LineString` feature over its `rtept` children
pub fn parse_route(route: &XmlNode) -> Feature {
    let points = route.children_named("rtept").map(parse_path_point).collect();
    Feature::new(name_and_description(route), Geometry::LineString(points))
}

pub fn parse_tracks<'a>(tracks: impl IntoIterator<Item = &'a XmlNode>) -> Vec<Feature> {
    tracks.into_iter().map(parse_track).collect()
}

/// `trk` → `MultiLineString` feature, one line per `trkseg`
pub fn parse_track(track: &XmlNode) -> Feature {
    let segments = track
        .children_named("trkseg")
        .map(|segment| segment.children_named("trkpt").map(parse_path_point).collect::<Vec<_>>())
        .collect();
    Feature::new(name_and_description(track), Geometry::MultiLineString(segments))
}

/// Position of a route or track point: `[lon, lat]`, then the elevation if
/// the point has an `ele` child, then the time text if it has a `time` child.
/// Arity therefore varies from point to point.
pub fn parse_path_point(point: &XmlNode) -> Position {
    let mut position = lon_lat(point);
    if let Some(ele) = point.child("ele") {
        position.push_number(coerce_lenient(ele.text()));
    }
    if let Some(time) = point.child("time") {
        position.push_time(time.text());
    }
    position
}

/// Collection properties from a `metadata` element
///
/// `author` is the author's name; `email` is `id@domain` from the author's
/// `email` element, with a missing element or attribute read as "". Both are
/// empty strings when there is no author.
pub fn parse_metadata(metadata: &XmlNode) -> Properties {
    let author = metadata.child("author");
    let author_name = author.map(|author| author.child_text("name")).unwrap_or("");
    let email = author
        .map(|author| {
            let address = author.child("email");
            let part = |key: &str| address.and_then(|email| email.attribute(key)).unwrap_or("");
            format!("{}@{}", part("id"), part("domain"))
        })
        .unwrap_or_default();

    let mut properties = Properties::new();
    properties.insert("name".to_string(), metadata.child_text("name").into());
    properties.insert("description".to_string(), metadata.child_text("desc").into());
    properties.insert("author".to_string(), author_name.into());
    properties.insert("email".to_string(), email.into());
    properties.insert("time".to_string(), metadata.child_text("time").into());
    properties
}

fn lon_lat(point: &XmlNode) -> Position {
    let lon = coerce_lenient(point.attribute("lon").unwrap_or(""));
    let lat = coerce_lenient(point.attribute("lat").unwrap_or(""));
    Position::lon_lat(lon, lat)
}

fn name_and_description(node: &XmlNode) -> Properties {
    let mut properties = Properties::new();
    properties.insert("name".to_string(), node.child_text("name").into());
    properties.insert("description".to_string(), node.child_text("desc").into());
    properties
}
