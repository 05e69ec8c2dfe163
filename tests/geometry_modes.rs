use csv_spatial::error::{ReadError, RowDecodeError};
use csv_spatial::reader::{CsvReader, Dataset, GeometryMode, ReaderOptions};
use csv_spatial::schema::{FieldType, GeometryKind};
use csv_spatial::value::Value;
use geo_types::Geometry;

fn reader(mode: GeometryMode) -> CsvReader {
    CsvReader::new(ReaderOptions {
        geometry_mode: mode,
        ..ReaderOptions::default()
    })
}

fn piped(mode: GeometryMode) -> CsvReader {
    CsvReader::new(ReaderOptions {
        geometry_mode: mode,
        separator: b'|',
        ..ReaderOptions::default()
    })
}

fn point_of(dataset: &Dataset, row: usize, field: &str) -> (f64, f64) {
    match dataset.value(row, field) {
        Some(Value::Geometry(Geometry::Point(point))) => (point.x(), point.y()),
        other => panic!("expected a point, got {other:?}"),
    }
}

#[test]
fn wkt_wkb_and_geojson_decode_the_same_point() {
    let wkt = reader(GeometryMode::Wkt)
        .read("name,geom\na,POINT(1 2)\n")
        .expect("valid WKT input");
    let wkb = reader(GeometryMode::Wkb)
        .read("name,geom\na,0101000000000000000000F03F0000000000000040\n")
        .expect("valid WKB input");
    let geojson = piped(GeometryMode::GeoJson)
        .read("name|geom\na|{\"type\":\"Point\",\"coordinates\":[1.0,2.0]}\n")
        .expect("valid GeoJSON input");

    for dataset in [&wkt, &wkb, &geojson] {
        assert_eq!(point_of(dataset, 0, "geom"), (1.0, 2.0));
    }
}

#[test]
fn kml_fragment_decodes_to_point() {
    let dataset = piped(GeometryMode::Kml)
        .read("name|geom\na|<Point><coordinates>3.5,-1.25</coordinates></Point>\n")
        .expect("valid KML input");
    assert_eq!(point_of(&dataset, 0, "geom"), (3.5, -1.25));
}

#[test]
fn gml2_fragment_decodes_to_point() {
    let dataset = piped(GeometryMode::Gml2)
        .read("name|geom\na|<gml:Point><gml:coordinates>3.5,-1.25</gml:coordinates></gml:Point>\n")
        .expect("valid GML2 input");
    assert_eq!(point_of(&dataset, 0, "geom"), (3.5, -1.25));
}

#[test]
fn gml3_fragment_decodes_to_point() {
    let dataset = reader(GeometryMode::Gml3)
        .read("name,geom\na,<gml:Point><gml:pos>3.5 -1.25</gml:pos></gml:Point>\n")
        .expect("valid GML3 input");
    assert_eq!(point_of(&dataset, 0, "geom"), (3.5, -1.25));
}

#[test]
fn kml_polygon_keeps_its_rings() {
    let fragment = "<Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 4,0 4,4 0,4 0,0</coordinates></LinearRing></outerBoundaryIs><innerBoundaryIs><LinearRing><coordinates>1,1 2,1 2,2 1,2 1,1</coordinates></LinearRing></innerBoundaryIs></Polygon>";
    let dataset = piped(GeometryMode::Kml)
        .read(&format!("name|geom:Polygon\na|{fragment}\n"))
        .expect("valid KML polygon");
    assert_eq!(
        dataset.schema.fields[1].ty,
        FieldType::Geometry(GeometryKind::Polygon)
    );
    match dataset.value(0, "geom") {
        Some(Value::Geometry(Geometry::Polygon(polygon))) => {
            assert_eq!(polygon.exterior().0.len(), 5);
            assert_eq!(polygon.interiors().len(), 1);
        }
        other => panic!("expected a polygon, got {other:?}"),
    }
}

#[test]
fn empty_geometry_cell_is_absent_not_an_error() {
    let dataset = reader(GeometryMode::Wkt)
        .read("name,geom\na,POINT(1 2)\nb,\n")
        .expect("valid input");
    assert!(dataset.value(0, "geom").is_some());
    assert!(dataset.value(1, "geom").is_none());
    assert_eq!(
        dataset.value(1, "name"),
        Some(&Value::String("b".to_string()))
    );
}

#[test]
fn malformed_geometry_aborts_the_read() {
    let err = reader(GeometryMode::Wkt)
        .read("name,geom\na,POINT(1 2)\nb,POINT(oops)\n")
        .unwrap_err();
    match err {
        ReadError::Row(RowDecodeError::Geometry { row, field, .. }) => {
            assert_eq!(row, 2);
            assert_eq!(field, "geom");
        }
        other => panic!("expected geometry row error, got {other}"),
    }
}

#[test]
fn latlon_mode_synthesizes_a_point_in_lon_lat_order() {
    let options = ReaderOptions {
        geometry_mode: GeometryMode::LatLon,
        lon_column: Some("lon".to_string()),
        lat_column: Some("lat".to_string()),
        ..ReaderOptions::default()
    };
    let dataset = CsvReader::new(options)
        .read("name,lat:Double,lon:Double\nplace,-47.0,111.0\n")
        .expect("valid input");
    assert_eq!(point_of(&dataset, 0, "geom"), (111.0, -47.0));
    // the source columns stay ordinary scalar fields
    assert_eq!(dataset.value(0, "lat"), Some(&Value::Double(-47.0)));
    assert_eq!(dataset.value(0, "lon"), Some(&Value::Double(111.0)));
}

#[test]
fn xy_mode_orders_first_column_as_x() {
    let options = ReaderOptions {
        geometry_mode: GeometryMode::Xy,
        x_column: Some("easting".to_string()),
        y_column: Some("northing".to_string()),
        ..ReaderOptions::default()
    };
    let dataset = CsvReader::new(options)
        .read("northing:Double,easting:Double\n10.0,20.0\n")
        .expect("valid input");
    assert_eq!(point_of(&dataset, 0, "geom"), (20.0, 10.0));
}

#[test]
fn dms_coordinates_convert_to_signed_decimal_degrees() {
    let options = ReaderOptions {
        geometry_mode: GeometryMode::LatLon,
        lon_column: Some("lon".to_string()),
        lat_column: Some("lat".to_string()),
        ..ReaderOptions::default()
    };
    let dataset = CsvReader::new(options)
        .read("lat,lon\n\"47° 12' 43.2828\"\" N\",\"122° 31' 32.2284\"\" W\"\n")
        .expect("valid DMS input");
    let (lon, lat) = point_of(&dataset, 0, "geom");
    assert!((lat - 47.212023).abs() < 1e-6);
    assert!((lon + 122.525619).abs() < 1e-6);
}

#[test]
fn unparseable_coordinate_names_the_source_column() {
    let options = ReaderOptions {
        geometry_mode: GeometryMode::LatLon,
        lon_column: Some("lon".to_string()),
        lat_column: Some("lat".to_string()),
        ..ReaderOptions::default()
    };
    let err = CsvReader::new(options)
        .read("lat,lon\nnowhere,111.0\n")
        .unwrap_err();
    match err {
        ReadError::Row(RowDecodeError::Geometry { row, field, .. }) => {
            assert_eq!(row, 1);
            assert_eq!(field, "lat");
        }
        other => panic!("expected coordinate row error, got {other}"),
    }
}

#[test]
fn empty_coordinate_pair_yields_absent_geometry() {
    let options = ReaderOptions {
        geometry_mode: GeometryMode::LatLon,
        lon_column: Some("lon".to_string()),
        lat_column: Some("lat".to_string()),
        ..ReaderOptions::default()
    };
    let dataset = CsvReader::new(options)
        .read("name,lat,lon\nplace,,\n")
        .expect("valid input");
    assert!(dataset.value(0, "geom").is_none());
}

#[test]
fn configured_geometry_column_name_is_honored() {
    let options = ReaderOptions {
        geometry_column: "location".to_string(),
        ..ReaderOptions::default()
    };
    let dataset = CsvReader::new(options)
        .read("id:int,location\n1,POINT(5 6)\n")
        .expect("valid input");
    assert_eq!(
        dataset.schema.fields[1].ty,
        FieldType::Geometry(GeometryKind::Point)
    );
    assert_eq!(point_of(&dataset, 0, "location"), (5.0, 6.0));
}
