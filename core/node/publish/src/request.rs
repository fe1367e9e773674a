use serde::{Deserialize, Serialize};

/// One submitted TEK, base64-encoded on the wire (spec §4.3 Inputs).
#[derive(Debug, Clone, Deserialize)]
pub struct ExposureKeyPayload {
    pub key: String,
    #[serde(rename = "rollingStartNumber")]
    pub rolling_start_interval_number: i32,
    #[serde(rename = "rollingPeriod")]
    pub rolling_period: i32,
    #[serde(rename = "transmissionRisk")]
    pub transmission_risk: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub keys: Vec<ExposureKeyPayload>,
    #[serde(rename = "healthAuthorityID")]
    pub health_authority_id: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub traveler: bool,
    #[serde(rename = "verificationPayload")]
    pub verification_payload: String,
    #[serde(rename = "hmacKey")]
    pub hmac_key: String,
    #[serde(rename = "revisionToken", default)]
    pub revision_token: String,
    #[serde(default)]
    pub padding: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishResponse {
    #[serde(rename = "revisionToken")]
    pub revision_token: String,
    #[serde(rename = "insertedExposures")]
    pub inserted_exposures: usize,
    pub padding: String,
}
