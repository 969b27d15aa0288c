//! HTTP delivery client and the retry loop around it.

mod client;
mod retry;

pub use client::{Deliver, DeliveryFailure, FailureDescriptor, HttpClient, ResponseSummary};
pub use retry::{RetryPolicy, retry_max};
