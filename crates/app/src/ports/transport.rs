//! Transport port: subscribe/publish envelopes for the message bus.

use std::future::Future;
use std::sync::Arc;

use habridge_domain::error::BridgeError;
use habridge_domain::message::{PublishRequest, SubscribeRequest};

/// Sends subscribe and publish requests to the bus client.
///
/// Implementations carry no protocol knowledge. Re-subscribing a topic that
/// is already subscribed must succeed.
pub trait Transport {
    /// Request a subscription to a topic filter.
    fn subscribe(
        &self,
        request: SubscribeRequest,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Publish a payload. Returns once the client accepted the request;
    /// there is no delivery acknowledgement.
    fn publish(
        &self,
        request: PublishRequest,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: Transport + Send + Sync> Transport for Arc<T> {
    fn subscribe(
        &self,
        request: SubscribeRequest,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).subscribe(request)
    }

    fn publish(
        &self,
        request: PublishRequest,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).publish(request)
    }
}
