use crate::db::area::blocking_queries;
use crate::db::area::schema::{Area, AreaKind};
use crate::spatial::geometry;
use crate::spatial::index::SpatialIndex;
use crate::spatial::normalize::{self, MAX_AREA_KM2, MAX_QUERY_AREA_KM2};
use crate::{Error, Result};
use geo::Polygon;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use rusqlite::Connection;
use tracing::warn;

/// Exclusion radius around an airport, km.
const AIRPORT_RADIUS_KM: f64 = 9.0;

/// Exclusion radius around a heliport, km.
const HELIPORT_RADIUS_KM: f64 = 3.0;

/// Vertex count used when a disc is approximated as a loop.
const CIRCLE_VERTICES: usize = 32;

/// Ingests district areas from a GeoJSON feature collection. Every feature
/// must carry a `DIDid` property and a polygon geometry; the first failing
/// feature aborts the whole batch.
pub fn ingest_district_areas(
    collection: &FeatureCollection,
    index: &SpatialIndex,
    conn: &mut Connection,
) -> Result<Vec<Area>> {
    let mut areas = vec![];
    for feature in &collection.features {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(Error::InvalidInput("Feature has no geometry".into()))?;
        let rings = match &geometry.value {
            Value::Polygon(rings) => rings,
            _ => Err(Error::InvalidInput(
                "Feature geometry is not a polygon".into(),
            ))?,
        };
        let outer = rings
            .first()
            .ok_or(Error::InvalidGeometry("Polygon has no outer ring".into()))?;
        let vertices: Vec<(f64, f64)> = outer
            .iter()
            .filter(|position| position.len() >= 2)
            .map(|position| (position[1], position[0]))
            .collect();
        let loop_ = normalize::normalize_loop(geometry::build_loop(&vertices), MAX_AREA_KM2)?;
        let cells = index.cover(&loop_)?;
        let id = feature
            .property("DIDid")
            .and_then(|it| it.as_i64())
            .ok_or(Error::InvalidInput("Feature has no DIDid property".into()))?;
        let name = feature
            .property("市町村名称")
            .and_then(|it| it.as_str())
            .unwrap_or_default()
            .to_string();
        areas.push(blocking_queries::upsert(
            id.to_string(),
            name,
            AreaKind::District,
            rings,
            &cells,
            conn,
        )?);
    }
    Ok(areas)
}

/// Ingests airport and heliport areas from a CSV point table in the
/// OurAirports column layout. Rows are filtered to the given country, closed
/// facilities are skipped, and each remaining point is buffered to a disc
/// sized by its facility type.
pub fn ingest_airport_areas(
    csv_table: &str,
    country: &str,
    index: &SpatialIndex,
    conn: &mut Connection,
) -> Result<Vec<Area>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_table.as_bytes());
    let mut areas = vec![];
    for record in reader.records() {
        let record = record?;
        if record.get(8) != Some(country) || record.get(2) == Some("closed") {
            continue;
        }
        let (Some(id), Some(facility), Some(name)) = (record.get(1), record.get(2), record.get(3))
        else {
            continue;
        };
        let (Ok(lat), Ok(lon)) = (
            record.get(4).unwrap_or_default().parse::<f64>(),
            record.get(5).unwrap_or_default().parse::<f64>(),
        ) else {
            warn!(id, "Skipping a row with unparseable coordinates");
            continue;
        };
        let radius_km = if facility == "heliport" {
            HELIPORT_RADIUS_KM
        } else {
            AIRPORT_RADIUS_KM
        };
        let loop_ = normalize::normalize_loop(
            geometry::circular_loop(lat, lon, radius_km, CIRCLE_VERTICES),
            MAX_AREA_KM2,
        )?;
        let cells = index.cover(&loop_)?;
        let rings = vec![loop_to_ring(&loop_)];
        areas.push(blocking_queries::upsert(
            id,
            name,
            AreaKind::Airport,
            &rings,
            &cells,
            conn,
        )?);
    }
    Ok(areas)
}

/// Finds all areas of a kind overlapping the bounding region given as 8 or
/// more comma-separated floats forming lat,lon pairs. An oversized region is
/// a client mistake, answered with no results rather than an error.
pub fn search(
    bounds: &str,
    kind: AreaKind,
    index: &SpatialIndex,
    conn: &Connection,
) -> Result<Vec<Area>> {
    let mut latlon: Vec<f64> = vec![];
    for part in bounds.split(',') {
        latlon.push(part.trim().parse().map_err(|_| {
            Error::InvalidInput(format!("Can't parse a bounds value: {part}"))
        })?);
    }
    if latlon.len() < 8 || latlon.len() % 2 != 0 {
        return Err(Error::InvalidInput(
            "bounds must contain at least 4 lat,lon pairs".into(),
        ));
    }
    let vertices: Vec<(f64, f64)> = latlon.chunks(2).map(|pair| (pair[0], pair[1])).collect();
    let loop_ = match normalize::normalize_loop(geometry::build_loop(&vertices), MAX_QUERY_AREA_KM2)
    {
        Ok(loop_) => loop_,
        Err(Error::InvalidGeometry(_)) => return Ok(vec![]),
        Err(err) => return Err(err),
    };
    index.query(&loop_, kind, conn)
}

pub fn to_feature_collection(areas: &[Area]) -> FeatureCollection {
    let features = areas
        .iter()
        .map(|area| {
            let mut properties = JsonObject::new();
            properties.insert("area_id".into(), area.id.clone().into());
            properties.insert("area_name".into(), area.name.clone().into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(area.geometry.clone()))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn loop_to_ring(loop_: &Polygon) -> Vec<Vec<f64>> {
    loop_
        .exterior()
        .0
        .iter()
        .map(|coord| vec![coord.x, coord.y])
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::test::conn;
    use crate::spatial::covering::CoveringConfig;
    use serde_json::json;

    const BOUNDS: &str = "35.0,139.0,35.0,139.1,35.1,139.1,35.1,139.0";

    fn index() -> SpatialIndex {
        SpatialIndex::new(CoveringConfig::default())
    }

    fn district_collection(ring: &[(f64, f64)]) -> FeatureCollection {
        let ring: Vec<Vec<f64>> = ring.iter().map(|&(lat, lon)| vec![lon, lat]).collect();
        let mut properties = JsonObject::new();
        properties.insert("DIDid".into(), json!(101));
        properties.insert("市町村名称".into(), json!("テスト市"));
        FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }],
            foreign_members: None,
        }
    }

    fn small_square() -> Vec<(f64, f64)> {
        vec![
            (35.04, 139.04),
            (35.04, 139.06),
            (35.06, 139.06),
            (35.06, 139.04),
            (35.04, 139.04),
        ]
    }

    #[test]
    fn ingest_district_areas_works() -> Result<()> {
        let mut conn = conn();
        let areas = ingest_district_areas(&district_collection(&small_square()), &index(), &mut conn)?;
        assert_eq!(1, areas.len());
        assert_eq!("101", areas[0].id);
        assert_eq!("テスト市", areas[0].name);
        assert_eq!(AreaKind::District, areas[0].kind);
        Ok(())
    }

    #[test]
    fn ingest_rejects_an_oversized_polygon() {
        let mut conn = conn();
        let oversized = vec![
            (34.0, 138.0),
            (34.0, 141.0),
            (37.0, 141.0),
            (37.0, 138.0),
            (34.0, 138.0),
        ];
        assert!(matches!(
            ingest_district_areas(&district_collection(&oversized), &index(), &mut conn),
            Err(Error::InvalidGeometry(_)),
        ));
    }

    #[test]
    fn ingest_accepts_a_clockwise_polygon() -> Result<()> {
        let mut conn = conn();
        let mut clockwise = small_square();
        clockwise.reverse();
        let areas = ingest_district_areas(&district_collection(&clockwise), &index(), &mut conn)?;
        assert_eq!(1, areas.len());
        assert_eq!(1, search(BOUNDS, AreaKind::District, &index(), &conn)?.len());
        Ok(())
    }

    #[test]
    fn search_finds_an_indexed_area() -> Result<()> {
        let mut conn = conn();
        ingest_district_areas(&district_collection(&small_square()), &index(), &mut conn)?;
        let areas = search(BOUNDS, AreaKind::District, &index(), &conn)?;
        assert_eq!(1, areas.len());
        assert_eq!("101", areas[0].id);
        assert!(search(BOUNDS, AreaKind::Airport, &index(), &conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn search_of_an_empty_store_finds_nothing() -> Result<()> {
        let conn = conn();
        assert!(search(BOUNDS, AreaKind::District, &index(), &conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn search_of_a_disjoint_region_finds_nothing() -> Result<()> {
        let mut conn = conn();
        ingest_district_areas(&district_collection(&small_square()), &index(), &mut conn)?;
        let bounds = "36.5,140.5,36.5,140.6,36.6,140.6,36.6,140.5";
        assert!(search(bounds, AreaKind::District, &index(), &conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn search_with_an_oversized_region_finds_nothing() -> Result<()> {
        let mut conn = conn();
        ingest_district_areas(&district_collection(&small_square()), &index(), &mut conn)?;
        let bounds = "20.0,120.0,20.0,150.0,45.0,150.0,45.0,120.0";
        assert!(search(bounds, AreaKind::District, &index(), &conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn search_with_malformed_bounds_is_an_error() {
        let conn = conn();
        assert!(matches!(
            search("35.0,139.0,oops", AreaKind::District, &index(), &conn),
            Err(Error::InvalidInput(_)),
        ));
        assert!(matches!(
            search("35.0,139.0,35.1,139.1", AreaKind::District, &index(), &conn),
            Err(Error::InvalidInput(_)),
        ));
    }

    #[test]
    fn ingest_airport_areas_works() -> Result<()> {
        let mut conn = conn();
        let csv_table = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,continent,iso_country
2613,RJTT,large_airport,Tokyo Haneda International Airport,35.552258,139.779694,35,AS,JP
2614,RJAA,closed,Old Field,35.4,139.5,10,AS,JP
2615,RJH1,heliport,Shinjuku Heliport,35.69,139.70,120,AS,JP
2616,KJFK,large_airport,John F Kennedy International Airport,40.639447,-73.779317,13,NA,US
";
        let areas = ingest_airport_areas(csv_table, "JP", &index(), &mut conn)?;
        assert_eq!(2, areas.len());
        assert_eq!("RJTT", areas[0].id);
        assert_eq!(AreaKind::Airport, areas[0].kind);
        assert_eq!("RJH1", areas[1].id);
        // 32 vertices plus the closing point
        assert_eq!(33, areas[0].geometry[0].len());
        let bounds = "35.4,139.6,35.4,139.9,35.8,139.9,35.8,139.6";
        assert_eq!(2, search(bounds, AreaKind::Airport, &index(), &conn)?.len());
        Ok(())
    }

    #[test]
    fn ingest_airport_areas_skips_rows_with_bad_coordinates() -> Result<()> {
        let mut conn = conn();
        let csv_table = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,continent,iso_country
1,BAD1,small_airport,Broken Row,not-a-number,139.7,0,AS,JP
";
        assert!(ingest_airport_areas(csv_table, "JP", &index(), &mut conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn to_feature_collection_carries_id_and_name() -> Result<()> {
        let mut conn = conn();
        let areas = ingest_district_areas(&district_collection(&small_square()), &index(), &mut conn)?;
        let collection = to_feature_collection(&areas);
        assert_eq!(1, collection.features.len());
        let feature = &collection.features[0];
        assert_eq!(
            Some(&json!("101")),
            feature.properties.as_ref().unwrap().get("area_id"),
        );
        assert!(feature.geometry.is_some());
        Ok(())
    }
}
