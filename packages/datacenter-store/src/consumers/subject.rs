use std::sync::Arc;

use common::{BusReply, BusRequest};
use mq::{BroccoliError, BrokerMessage, Mq, publish_reply};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Handler, Store, Verb};

/// Spawn one consumer per verb under `prefix`.
pub fn spawn_consumers<S>(
    handler: Arc<Handler<S>>,
    mq: Arc<Mq>,
    prefix: &str,
    concurrency: usize,
) -> Vec<JoinHandle<()>>
where
    S: Store + 'static,
{
    Verb::ALL
        .into_iter()
        .map(|verb| {
            let handler = Arc::clone(&handler);
            let mq = Arc::clone(&mq);
            let subject = verb.subject(prefix);
            tokio::spawn(consume_subject(handler, mq, verb, subject, concurrency))
        })
        .collect()
}

/// Consume requests for a single verb until the broker stops delivering.
pub async fn consume_subject<S>(
    handler: Arc<Handler<S>>,
    mq: Arc<Mq>,
    verb: Verb,
    subject: String,
    concurrency: usize,
) where
    S: Store + 'static,
{
    info!(subject = %subject, concurrency, "Starting consumer");

    let mq_for_replies = Arc::clone(&mq);
    let result = mq
        .process_messages(
            &subject,
            Some(concurrency),
            None,
            move |message: BrokerMessage<BusRequest>| {
                let handler = Arc::clone(&handler);
                let mq = Arc::clone(&mq_for_replies);
                async move {
                    handle_request(&handler, &mq, verb, message.payload).await;
                    Ok::<(), BroccoliError>(())
                }
            },
        )
        .await;

    if let Err(e) = result {
        error!(subject = %subject, error = %e, "Consumer stopped unexpectedly");
    }
}

/// Handle one request and publish the reply. The message is acknowledged
/// even when publishing fails.
async fn handle_request<S: Store>(handler: &Handler<S>, mq: &Mq, verb: Verb, request: BusRequest) {
    let reply = handler.handle(verb, &request.body()).await;

    let Some(reply_to) = request.reply_to.as_deref() else {
        debug!(%verb, request_id = %request.request_id, "No reply_to, dropping reply");
        return;
    };

    let reply = BusReply::from_bytes(request.request_id.as_str(), &reply);
    if let Err(e) = publish_reply(mq, reply_to, &reply).await {
        warn!(
            %verb,
            request_id = %reply.request_id,
            reply_to,
            error = %e,
            "Failed to publish reply"
        );
    }
}
