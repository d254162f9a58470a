//! Request/response payloads for the intents exchanged between the
//! coordinator and the specialized agents.

use crate::shared_context::Constraint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Coordinator -> Intent Analyst

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeIntentRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_intents: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeIntentResponse {
    pub tags: Vec<String>,
    pub entities: Vec<Entity>,
    pub product_types: Vec<String>,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub value: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeIntentsRequest {
    pub intents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeIntentsResponse {
    pub merged: AnalyzeIntentResponse,
}

// Coordinator -> Compliance Agent

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePiiRequest {
    pub profile: Map<String, Value>,
    pub required_masking: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Passed,
    Failed,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePiiResponse {
    pub masked_profile: Map<String, Value>,
    pub masked_fields: Vec<String>,
    pub removed_fields: Vec<String>,
    pub compliance_status: ComplianceStatus,
    pub violations: Vec<String>,
}

// Coordinator -> Personalization Agent

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecommendationsRequest {
    pub intent: AnalyzeIntentResponse,
    pub masked_profile: Map<String, Value>,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub bundles: Vec<Bundle>,
    pub reasoning: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: String,
    pub product_name: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub bundle_id: String,
    pub name: String,
    pub products: Vec<String>,
    pub discount_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_uri: Option<String>,
}

// Coordinator -> Negotiation Agent

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateOfferRequest {
    pub recommendations: Vec<Recommendation>,
    pub bundles: Vec<Bundle>,
    pub customer_segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateOfferResponse {
    pub selected_products: Vec<String>,
    pub applied_discounts: Vec<Discount>,
    pub total_monthly: f64,
    pub final_monthly: f64,
    pub terms: Vec<String>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub code: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
}
