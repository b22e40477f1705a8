use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Payment row. Created only via seeding or administrative tooling; there is
/// no payment-processing flow in this service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub booking_id: ObjectId,
    pub user_id: ObjectId,
    pub amount: f64,
    pub method: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub qpay_invoice_id: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Serialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub amount: f64,
    pub method: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qpay_invoice_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        PaymentResponse {
            id: payment.id.map(|id| id.to_hex()).unwrap_or_default(),
            booking_id: payment.booking_id.to_hex(),
            user_id: payment.user_id.to_hex(),
            amount: payment.amount,
            method: payment.method.clone(),
            status: payment.status.clone(),
            transaction_id: payment.transaction_id.clone(),
            qpay_invoice_id: payment.qpay_invoice_id.clone(),
            created_at: payment.created_at.to_chrono(),
        }
    }
}
