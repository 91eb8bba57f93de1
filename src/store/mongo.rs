//! MongoDB store backend
//!
//! Documents look like
//! `{_id: ObjectId, location: {type: "Point", coordinates: [lon, lat]}}`
//! and `location` carries a 2dsphere index. Radius queries run a
//! `$geoNear` aggregation (spherical, distance in meters) followed by
//! `$limit`.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::geo::{GeoJsonPoint, LocationPoint};
use crate::store::{LocationStore, SearchResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, InsertManyOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// MongoDB-backed location store
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    collection: Collection<Document>,
    max_results: usize,
}

/// Shape of one `$geoNear` output document
#[derive(Debug, Deserialize)]
struct NearDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    location: GeoJsonPoint,
    distance: f64,
}

impl MongoStore {
    /// Connect and make sure the 2dsphere index exists
    ///
    /// Index creation failure is returned as an error: the store is not
    /// usable without it.
    pub async fn connect(config: &StoreConfig, max_results: usize) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_uri)
            .await
            .map_err(|e| Error::Store(format!("Invalid MongoDB URI: {}", e)))?;

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)
            .map_err(|e| Error::Store(format!("Failed to create MongoDB client: {}", e)))?;

        let database = client.database(&config.database);
        let collection = database.collection::<Document>(&config.collection);

        let store = Self {
            database,
            collection,
            max_results,
        };
        store.ensure_index().await?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );
        Ok(store)
    }

    async fn ensure_index(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "location": "2dsphere" })
            .build();

        self.collection
            .create_index(index, None)
            .await
            .map_err(|e| Error::Store(format!("Failed to create geospatial index: {}", e)))?;

        Ok(())
    }

    fn location_document(point: LocationPoint) -> Document {
        doc! {
            "location": {
                "type": "Point",
                "coordinates": [point.longitude, point.latitude],
            }
        }
    }

    /// Successful inserts out of `total` for an unordered `insert_many`
    fn count_inserted(total: usize, result: mongodb::error::Result<usize>) -> Result<usize> {
        match result {
            Ok(inserted) => Ok(inserted),
            Err(e) => match e.kind.as_ref() {
                // Per-document failures only: everything else was written
                ErrorKind::BulkWrite(failure) if failure.write_concern_error.is_none() => {
                    let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
                    Ok(total.saturating_sub(failed))
                }
                _ => Err(Error::Store(format!("Failed to insert driver locations: {}", e))),
            },
        }
    }
}

#[async_trait]
impl LocationStore for MongoStore {
    fn name(&self) -> &'static str {
        "mongo"
    }

    async fn insert(&self, point: LocationPoint) -> Result<String> {
        let result = self
            .collection
            .insert_one(Self::location_document(point), None)
            .await
            .map_err(|e| Error::Store(format!("Failed to insert driver location: {}", e)))?;

        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id.to_hex()),
            other => Ok(other.to_string()),
        }
    }

    async fn insert_many(&self, points: &[LocationPoint]) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let documents: Vec<Document> = points.iter().copied().map(Self::location_document).collect();
        let options = InsertManyOptions::builder().ordered(false).build();

        let result = self
            .collection
            .insert_many(documents, options)
            .await
            .map(|r| r.inserted_ids.len());

        let inserted = Self::count_inserted(points.len(), result)?;
        if inserted < points.len() {
            warn!(
                total = points.len(),
                inserted,
                "Unordered bulk write completed with per-document failures"
            );
        }
        Ok(inserted)
    }

    async fn search(&self, point: LocationPoint, radius_meters: f64) -> Result<Vec<SearchResult>> {
        let pipeline = vec![
            doc! {
                "$geoNear": {
                    "near": {
                        "type": "Point",
                        "coordinates": [point.longitude, point.latitude],
                    },
                    "distanceField": "distance",
                    "maxDistance": radius_meters,
                    "spherical": true,
                }
            },
            doc! { "$limit": self.max_results as i64 },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline, None)
            .await
            .map_err(|e| Error::Store(format!("Failed to aggregate driver locations: {}", e)))?;

        let mut results = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| Error::Store(format!("Failed to read aggregation results: {}", e)))?
        {
            let near: NearDocument = bson::from_document(document)
                .map_err(|e| Error::Store(format!("Failed to decode aggregation result: {}", e)))?;

            let location = match LocationPoint::try_from(&near.location) {
                Ok(location) => location,
                Err(e) => {
                    error!(id = %near.id, error = %e, "Skipping stored document with malformed geometry");
                    continue;
                }
            };

            results.push(SearchResult {
                id: near.id.to_hex(),
                point: location,
                distance: near.distance,
            });
        }

        Ok(results)
    }

    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| Error::Store(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }
}
