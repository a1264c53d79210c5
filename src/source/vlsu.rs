//! Client for the VlSU student timetable API
//!
//! The API takes a group record number and returns one JSON object per study
//! day, with both week variants in the same record.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ScheduleSource, SourceError};
use crate::schedule::RawDay;

/// Group schedule endpoint
pub const DEFAULT_API_URL: &str = "https://abiturient-api.vlsu.ru/api/student/GetGroupSchedule";

/// Record number of the group whose schedule is served
pub const DEFAULT_GROUP_ID: u64 = 281474976724434;

/// Origin the student portal sends with its requests
const PORTAL_ORIGIN: &str = "https://student.vlsu.ru";

/// Days requested from the API, Monday to Saturday
const WEEK_DAYS: &str = "1,2,3,4,5,6";

/// Body of a group schedule request
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleRequest<'a> {
    nrec: u64,
    /// Zero asks for both week variants at once
    week_type: i8,
    week_days: &'a str,
}

/// Client for fetching a group schedule from the VlSU API
#[derive(Debug, Clone)]
pub struct VlsuClient {
    client: Client,
    base_url: String,
    group_id: u64,
}

impl VlsuClient {
    /// Creates a client whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Creates a client around a preconfigured HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            group_id: DEFAULT_GROUP_ID,
        }
    }

    /// Overrides the endpoint URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the group record number
    pub fn with_group_id(mut self, group_id: u64) -> Self {
        self.group_id = group_id;
        self
    }
}

#[async_trait]
impl ScheduleSource for VlsuClient {
    #[instrument(skip(self), fields(group_id = self.group_id))]
    async fn fetch_raw(&self) -> Result<Vec<RawDay>, SourceError> {
        let body = ScheduleRequest {
            nrec: self.group_id,
            week_type: 0,
            week_days: WEEK_DAYS,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ORIGIN, PORTAL_ORIGIN)
            .header(REFERER, format!("{}/", PORTAL_ORIGIN))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let days: Vec<RawDay> = serde_json::from_str(&text)?;
        debug!(days = days.len(), "Fetched schedule records");
        Ok(days)
    }
}
