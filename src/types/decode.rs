//! Candidate Decoders
//!
//! Ordered list of decoders for union-shaped response bodies. The first
//! candidate that accepts the body wins; if none does, the result is a
//! VALIDATION error listing why each candidate rejected it.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};

type DecodeFn<T> = Box<dyn Fn(&Value) -> Result<T, String> + Send + Sync>;

/// Ordered decoders tried in sequence.
pub struct CandidateDecoders<T> {
    what: &'static str,
    candidates: Vec<(&'static str, DecodeFn<T>)>,
}

impl<T> CandidateDecoders<T> {
    /// Create an empty decoder list for a response described as `what`.
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            candidates: Vec::new(),
        }
    }

    /// Add a hand-written candidate.
    pub fn candidate<F>(mut self, name: &'static str, decode: F) -> Self
    where
        F: Fn(&Value) -> Result<T, String> + Send + Sync + 'static,
    {
        self.candidates.push((name, Box::new(decode)));
        self
    }

    /// Add a candidate that deserializes into `S` and maps it to `T`.
    pub fn shape<S, F>(self, name: &'static str, map: F) -> Self
    where
        S: DeserializeOwned,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        self.candidate(name, move |value| {
            S::deserialize(value)
                .map(&map)
                .map_err(|e| e.to_string())
        })
    }

    /// Number of registered candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Try every candidate in order.
    pub fn decode(&self, value: &Value) -> ApiResult<T> {
        let mut rejections = Vec::with_capacity(self.candidates.len());

        for (name, decode) in &self.candidates {
            match decode(value) {
                Ok(decoded) => return Ok(decoded),
                Err(reason) => rejections.push(json!({ "candidate": name, "error": reason })),
            }
        }

        Err(
            ApiError::validation(format!("Unexpected {} response shape", self.what))
                .with_details(json!({ "candidates": rejections })),
        )
    }
}
