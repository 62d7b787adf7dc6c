use super::service;
use crate::db::area::blocking_queries;
use crate::db::area::schema::AreaKind;
use crate::spatial::index::SpatialIndex;
use crate::Error;
use actix_web::delete;
use actix_web::get;
use actix_web::post;
use actix_web::web::Data;
use actix_web::web::Json;
use actix_web::web::Path;
use actix_web::web::Query;
use deadpool_sqlite::Pool;
use geojson::FeatureCollection;
use serde::Deserialize;
use serde::Serialize;

#[derive(Deserialize)]
pub struct BoundsArgs {
    bounds: String,
}

#[derive(Deserialize)]
pub struct AirportUploadArgs {
    country: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub areas: i64,
}

#[derive(Serialize, Deserialize)]
pub struct DeleteResponse {
    pub area_id: String,
}

#[post("district_areas")]
pub async fn post_districts(
    collection: Json<FeatureCollection>,
    index: Data<SpatialIndex>,
    pool: Data<Pool>,
) -> Result<Json<UploadResponse>, Error> {
    let collection = collection.into_inner();
    let areas = pool
        .get()
        .await?
        .interact(move |conn| service::ingest_district_areas(&collection, &index, conn))
        .await??;
    Ok(Json(UploadResponse {
        areas: areas.len() as i64,
    }))
}

#[post("airport_areas")]
pub async fn post_airports(
    args: Query<AirportUploadArgs>,
    csv_table: String,
    index: Data<SpatialIndex>,
    pool: Data<Pool>,
) -> Result<Json<UploadResponse>, Error> {
    let country = args.into_inner().country.unwrap_or_else(|| "JP".into());
    let areas = pool
        .get()
        .await?
        .interact(move |conn| service::ingest_airport_areas(&csv_table, &country, &index, conn))
        .await??;
    Ok(Json(UploadResponse {
        areas: areas.len() as i64,
    }))
}

#[get("district_areas")]
pub async fn get_districts(
    args: Query<BoundsArgs>,
    index: Data<SpatialIndex>,
    pool: Data<Pool>,
) -> Result<Json<FeatureCollection>, Error> {
    get_areas(AreaKind::District, args.into_inner(), index, pool).await
}

#[get("airport_areas")]
pub async fn get_airports(
    args: Query<BoundsArgs>,
    index: Data<SpatialIndex>,
    pool: Data<Pool>,
) -> Result<Json<FeatureCollection>, Error> {
    get_areas(AreaKind::Airport, args.into_inner(), index, pool).await
}

async fn get_areas(
    kind: AreaKind,
    args: BoundsArgs,
    index: Data<SpatialIndex>,
    pool: Data<Pool>,
) -> Result<Json<FeatureCollection>, Error> {
    let areas = pool
        .get()
        .await?
        .interact(move |conn| service::search(&args.bounds, kind, &index, conn))
        .await??;
    Ok(Json(service::to_feature_collection(&areas)))
}

#[delete("areas/{area_id}")]
pub async fn delete_by_id(
    area_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<DeleteResponse>, Error> {
    let area_id = area_id.into_inner();
    let area = pool
        .get()
        .await?
        .interact(move |conn| blocking_queries::delete(area_id, conn))
        .await??;
    Ok(Json(DeleteResponse { area_id: area.id }))
}
