#![allow(missing_docs)]

//! Flat response shapes for clients that want a success flag and an error
//! string rather than a typed `Result`.

use serde::{Deserialize, Serialize};

use crate::{
    error::GameResult,
    models::TravelEvent,
    session::{PlayerView, TravelReport},
};

/// Outcome of an action that returns nothing beyond success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl<T> From<GameResult<T>> for ActionResponse {
    fn from(result: GameResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// Outcome of a travel request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelResponse {
    pub success: bool,
    /// Player snapshot after arrival; absent when the jump failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PlayerView>,
    #[serde(default)]
    pub events: Vec<TravelEvent>,
    pub duration_secs: i64,
    #[serde(default)]
    pub credits_earned: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GameResult<TravelReport>> for TravelResponse {
    fn from(result: GameResult<TravelReport>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                state: Some(report.state),
                events: report.events,
                duration_secs: report.duration_secs,
                credits_earned: report.credits_earned,
                error: None,
            },
            Err(err) => Self {
                success: false,
                state: None,
                events: Vec::new(),
                duration_secs: 0,
                credits_earned: 0,
                error: Some(err.to_string()),
            },
        }
    }
}
