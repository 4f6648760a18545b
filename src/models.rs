//! Wire model for fetched messages.
//!
//! Every field is optional on the wire; absent fields decode to their empty
//! value so a sparse service response still yields a usable record.

use serde_derive::Deserialize;

/// A fully fetched mailbox message.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Message {
    /// Sender address.
    #[serde(default)]
    pub from: String,
    /// Recipient address.
    #[serde(default)]
    pub to: String,
    /// Message payload.
    #[serde(default)]
    pub data: MessageData,
}

/// The payload of a fetched message.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MessageData {
    #[serde(default)]
    pub fromfull: String,
    /// Header excerpt included with the message.
    #[serde(default)]
    pub headers: MessageHeaders,
    #[serde(default)]
    pub subject: String,
    #[serde(default, rename = "requestId")]
    pub request_id: String,
    #[serde(default)]
    pub origfrom: String,
    /// Service-side message identifier.
    #[serde(default)]
    pub id: String,
    /// Arrival time in epoch milliseconds.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub seconds_ago: i64,
    /// Ordered body parts. A message with none is incomplete.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// RFC-822 style headers carried with a message.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MessageHeaders {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub contenttype: String,
    #[serde(default)]
    pub dkimsignature: String,
    #[serde(default)]
    pub mimeversion: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub feedbackid: String,
    #[serde(default)]
    pub messageid: String,
    #[serde(default)]
    pub received: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, rename = "xSessionoutgoing")]
    pub x_sessionoutgoing: String,
}

/// One MIME-like body part.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MessagePart {
    #[serde(default)]
    pub headers: PartHeaders,
    /// Raw body text in the part's own encoding.
    #[serde(default)]
    pub body: String,
}

/// Content headers of a single body part.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PartHeaders {
    #[serde(default)]
    pub contenttype: String,
    #[serde(default)]
    pub contenttransferencoding: String,
}
