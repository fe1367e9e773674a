use std::pin::Pin;

use chrono::{DateTime, TimeZone, Utc};
use enserver_db::{DbPool, ExposureDal};
use futures::Stream;
use tonic::{Request, Response, Status};

use crate::metrics::METRICS;
use crate::proto::federation_server::Federation;
use crate::proto::{ExposureKey, FetchRequest, FetchResponse};

/// Server side of the partner exchange (C10): serves TEKs created after
/// the caller's cursor, applying the caller's region filters and a soft
/// per-call cap (spec §4.7). Bound to one `DbPool`; the mTLS/JWT-audience
/// check that gates which partner is calling is a transport-layer
/// interceptor concern, not this service's.
pub struct FederationService {
    pool: DbPool,
    max_records_per_call: usize,
}

impl FederationService {
    pub fn new(pool: DbPool, max_records_per_call: usize) -> Self {
        Self { pool, max_records_per_call }
    }
}

#[tonic::async_trait]
impl Federation for FederationService {
    type FetchStream = Pin<Box<dyn Stream<Item = Result<FetchResponse, Status>> + Send + 'static>>;

    async fn fetch(&self, request: Request<FetchRequest>) -> Result<Response<Self::FetchStream>, Status> {
        let req = request.into_inner();
        let since = parse_cursor(&req.last_fetch_state);

        let mut conn = self
            .pool
            .raw()
            .acquire()
            .await
            .map_err(|e| Status::internal(e.to_string()))?;
        let exposures = ExposureDal { conn: &mut conn }
            .find_since(
                since,
                &req.regions_included,
                &req.regions_excluded,
                self.max_records_per_call as i64,
            )
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let next_cursor = exposures
            .last()
            .map(|e| e.created_at.to_rfc3339())
            .unwrap_or(req.last_fetch_state);

        METRICS.push_records_sent.inc_by(exposures.len() as u64);

        let keys: Vec<ExposureKey> = exposures.iter().map(ExposureKey::from_exposure).collect();
        let page = FetchResponse { keys, fetch_response_key_timestamp: next_cursor };

        let stream = futures::stream::once(async move { Ok(page) });
        Ok(Response::new(Box::pin(stream)))
    }
}

/// `last_fetch_state` is an RFC3339 timestamp for every page but the
/// first; an empty or unparsable cursor means "everything" (`UNIX_EPOCH`).
fn parse_cursor(cursor: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(cursor)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cursor_means_everything() {
        assert_eq!(parse_cursor(""), Utc.timestamp_opt(0, 0).single().unwrap());
    }

    #[test]
    fn parses_a_real_cursor() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_cursor(&ts.to_rfc3339()), ts);
    }
}
