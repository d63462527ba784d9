//! Live message delivery.
//!
//! Delivery is keyed by the authenticated user from the connection's
//! handshake: a subscriber receives exactly the events the fan-out
//! published to their user id. The optional `chatroom` argument narrows
//! delivery to a single chat.

use async_graphql::{Context, ResultExt, SimpleObject, Subscription};
use futures_util::stream::Stream;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::broker::{MessageBroker, SubscriberId};
use crate::schema::message::MessageObject;
use crate::state::AppState;

/// Event payload for a newly stored message.
#[derive(SimpleObject, Clone, Debug)]
pub struct MessageEvent {
    pub message: MessageObject,
}

/// Detaches the subscription from the broker when the stream is dropped,
/// preventing sender leaks on client disconnect.
struct Unsubscriber {
    broker: MessageBroker,
    user_id: Uuid,
    subscriber_id: SubscriberId,
}

impl Drop for Unsubscriber {
    fn drop(&mut self) {
        let broker = self.broker.clone();
        let user_id = self.user_id;
        let subscriber_id = self.subscriber_id;
        // Streams are normally dropped inside the server runtime, but a
        // drop outside one must not panic.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    broker.unsubscribe(user_id, subscriber_id).await;
                });
            }
            Err(_) => broker.unsubscribe_now(user_id, subscriber_id),
        }
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Emits when another participant sends a message to a chat the
    /// caller is in. Requires a connection authenticated at handshake
    /// time.
    async fn on_new_message(
        &self,
        ctx: &Context<'_>,
        chatroom: Option<Uuid>,
    ) -> async_graphql::Result<impl Stream<Item = MessageEvent>> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;

        let (subscriber_id, rx) = state.broker.subscribe(user_id).await;
        let guard = Unsubscriber {
            broker: state.broker.clone(),
            user_id,
            subscriber_id,
        };

        tracing::debug!(%user_id, ?chatroom, "subscription started");

        Ok(futures_util::stream::unfold(
            (rx, guard),
            move |(mut rx, guard)| async move {
                loop {
                    let message = rx.recv().await?;
                    if let Some(room) = chatroom {
                        if message.chat_id != Some(room) {
                            continue;
                        }
                    }
                    let event = MessageEvent {
                        message: message.into(),
                    };
                    return Some((event, (rx, guard)));
                }
            },
        ))
    }
}
