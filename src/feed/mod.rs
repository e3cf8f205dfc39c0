// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Narrowing of the upstream incident feed into [`MarkerRecord`]s.
//!
//! The feed is accepted either as a bare JSON array of records or as the
//! `{ "count": .., "results": [..] }` envelope the area endpoint returns.
//! Every record is narrowed on its own so a single bad record never sinks
//! the batch; it is reported back as a [`RecordRejection`] instead.

use crate::models::{LatLng, MarkerRecord, MarkerSource};
use ahash::AHashSet;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed must be an array of records or an object with a `results` array")]
    UnexpectedShape,
    #[error("upstream responded with status {status}")]
    Upstream { status: u16 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectReason {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no id")]
    MissingId,
    #[error("id {0} was already seen in this batch")]
    DuplicateId(String),
    #[error("record has no latitude/longitude")]
    MissingCoordinates,
    #[error("coordinates ({lat}, {lng}) are out of range")]
    InvalidCoordinates { lat: f64, lng: f64 },
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordRejection {
    pub index: usize,
    pub id: Option<String>,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    // total reported by the upstream, which may exceed this page
    pub count: Option<u64>,
    pub markers: Vec<MarkerRecord>,
    pub rejected: Vec<RecordRejection>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamId {
    Text(String),
    Number(serde_json::Number),
}

impl UpstreamId {
    fn into_string(self) -> String {
        match self {
            UpstreamId::Text(text) => text,
            UpstreamId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamLatLng {
    Object { lat: Option<f64>, lng: Option<f64> },
    Pair([f64; 2]),
}

impl UpstreamLatLng {
    fn resolve(&self) -> Option<LatLng> {
        match *self {
            UpstreamLatLng::Object {
                lat: Some(lat),
                lng: Some(lng),
            } => Some(LatLng::new(lat, lng)),
            UpstreamLatLng::Object { .. } => None,
            UpstreamLatLng::Pair([lat, lng]) => Some(LatLng::new(lat, lng)),
        }
    }
}

#[derive(Deserialize)]
struct UpstreamGeometry {
    location: Option<UpstreamLatLng>,
}

#[derive(Deserialize)]
struct UpstreamSource {
    tweet_id: Option<UpstreamId>,
    full_text: Option<String>,
}

// `viewport` / `viewPort` are accepted and ignored
#[derive(Deserialize)]
struct UpstreamRecord {
    id: Option<UpstreamId>,
    loc: Option<UpstreamLatLng>,
    formatted_address: Option<String>,
    geometry: Option<UpstreamGeometry>,
    source: Option<UpstreamSource>,
}

pub fn parse_feed(text: &str) -> Result<FeedBatch, FeedError> {
    let document: Value = serde_json::from_str(text)?;
    narrow_document(document)
}

pub fn narrow_document(document: Value) -> Result<FeedBatch, FeedError> {
    let (count, records) = match document {
        Value::Array(records) => (None, records),
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(records)) => {
                (envelope.get("count").and_then(Value::as_u64), records)
            }
            _ => return Err(FeedError::UnexpectedShape),
        },
        _ => return Err(FeedError::UnexpectedShape),
    };

    let mut batch = FeedBatch {
        count,
        markers: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
    };
    let mut seen_ids = AHashSet::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        match narrow_record(record) {
            Ok(marker) => {
                if seen_ids.insert(marker.id.clone()) {
                    batch.markers.push(marker);
                } else {
                    batch.rejected.push(RecordRejection {
                        index,
                        id: Some(marker.id.clone()),
                        reason: RejectReason::DuplicateId(marker.id),
                    });
                }
            }
            Err((id, reason)) => {
                tracing::debug!(index, ?id, %reason, "rejected feed record");
                batch.rejected.push(RecordRejection { index, id, reason });
            }
        }
    }

    tracing::info!(
        accepted = batch.markers.len(),
        rejected = batch.rejected.len(),
        count = ?batch.count,
        "narrowed incident feed"
    );

    Ok(batch)
}

fn narrow_record(record: Value) -> Result<MarkerRecord, (Option<String>, RejectReason)> {
    if !record.is_object() {
        return Err((None, RejectReason::NotAnObject));
    }

    let raw: UpstreamRecord = serde_json::from_value(record)
        .map_err(|e| (None, RejectReason::Malformed(e.to_string())))?;

    let id = raw
        .id
        .map(UpstreamId::into_string)
        .filter(|id| !id.trim().is_empty())
        .ok_or((None, RejectReason::MissingId))?;

    // geocoded geometry is more precise than the coarse `loc`
    let location = raw
        .geometry
        .as_ref()
        .and_then(|geometry| geometry.location.as_ref())
        .and_then(UpstreamLatLng::resolve)
        .or_else(|| raw.loc.as_ref().and_then(UpstreamLatLng::resolve))
        .ok_or_else(|| (Some(id.clone()), RejectReason::MissingCoordinates))?;

    if !location.is_valid() {
        return Err((
            Some(id),
            RejectReason::InvalidCoordinates {
                lat: location.lat,
                lng: location.lng,
            },
        ));
    }

    let (tweet_id, full_text) = match raw.source {
        Some(source) => (
            source
                .tweet_id
                .map(UpstreamId::into_string)
                .unwrap_or_default(),
            source.full_text.unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    Ok(MarkerRecord {
        id,
        location,
        formatted_address: raw.formatted_address.unwrap_or_default(),
        source: MarkerSource {
            tweet_id,
            full_text,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let batch = parse_feed(
            r#"[{
                "id": "x1",
                "loc": {"lat": 41.0, "lng": 29.0},
                "viewport": {"northeast": {"lat": 41.1, "lng": 29.1}},
                "formatted_address": "Foo",
                "geometry": {"location": {"lat": 41.0, "lng": 29.0}},
                "source": {"tweet_id": "123", "full_text": "bar"}
            }]"#,
        )
        .unwrap();

        assert!(batch.rejected.is_empty());
        assert_eq!(batch.count, None);
        assert_eq!(
            batch.markers,
            vec![MarkerRecord::new(
                "x1",
                LatLng::new(41.0, 29.0),
                "Foo",
                MarkerSource {
                    tweet_id: "123".to_string(),
                    full_text: "bar".to_string(),
                },
            )]
        );
    }

    #[test]
    fn test_envelope_with_numeric_ids_and_pair_loc() {
        let batch = parse_feed(
            r#"{"count": 250, "results": [
                {"id": 17, "loc": [37.57, 36.92], "viewPort": null},
                {"id": "18", "loc": {"lat": 37.0, "lng": 36.0},
                 "source": {"tweet_id": 1623000000000000000}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(batch.count, Some(250));
        assert_eq!(batch.markers.len(), 2);
        assert_eq!(batch.markers[0].id, "17");
        assert_eq!(batch.markers[0].location, LatLng::new(37.57, 36.92));
        assert_eq!(batch.markers[1].source.tweet_id, "1623000000000000000");
        assert_eq!(batch.markers[1].formatted_address, "");
    }

    #[test]
    fn test_geometry_location_wins_over_loc() {
        let batch = parse_feed(
            r#"[{"id": "a", "loc": [1.0, 2.0], "geometry": {"location": {"lat": 3.0, "lng": 4.0}}}]"#,
        )
        .unwrap();
        assert_eq!(batch.markers[0].location, LatLng::new(3.0, 4.0));
    }

    #[test]
    fn test_bad_records_do_not_fail_the_batch() {
        let batch = parse_feed(
            r#"[
                {"id": "ok", "loc": {"lat": 37.0, "lng": 37.0}},
                {"id": "no-loc"},
                {"id": "half", "loc": {"lat": 37.0}},
                {"loc": {"lat": 37.0, "lng": 37.0}},
                {"id": "far", "loc": {"lat": 137.0, "lng": 37.0}},
                {"id": "text-lat", "loc": {"lat": "37.0", "lng": 37.0}},
                {"id": "ok", "loc": {"lat": 38.0, "lng": 38.0}},
                42
            ]"#,
        )
        .unwrap();

        assert_eq!(batch.markers.len(), 1);
        assert_eq!(batch.markers[0].id, "ok");

        let reasons: Vec<(usize, RejectReason)> = batch
            .rejected
            .iter()
            .map(|r| (r.index, r.reason.clone()))
            .collect();
        assert_eq!(reasons[0], (1, RejectReason::MissingCoordinates));
        assert_eq!(reasons[1], (2, RejectReason::MissingCoordinates));
        assert_eq!(reasons[2], (3, RejectReason::MissingId));
        assert_eq!(
            reasons[3],
            (
                4,
                RejectReason::InvalidCoordinates {
                    lat: 137.0,
                    lng: 37.0
                }
            )
        );
        assert!(matches!(reasons[4], (5, RejectReason::Malformed(_))));
        assert_eq!(
            reasons[5],
            (6, RejectReason::DuplicateId("ok".to_string()))
        );
        assert_eq!(reasons[6], (7, RejectReason::NotAnObject));
    }

    #[test]
    fn test_empty_feed() {
        let batch = parse_feed("[]").unwrap();
        assert!(batch.markers.is_empty());
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn test_unexpected_documents() {
        assert!(matches!(parse_feed("{not json"), Err(FeedError::Json(_))));
        assert!(matches!(
            parse_feed(r#"{"count": 1}"#),
            Err(FeedError::UnexpectedShape)
        ));
        assert!(matches!(parse_feed("12"), Err(FeedError::UnexpectedShape)));
    }
}
