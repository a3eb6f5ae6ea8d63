pub mod error;
pub mod models;

pub use models::{
    BrokerMessage, BroccoliError, MqConfig, MqQueue, connect_with_retry, init_mq, publish_reply,
};

pub type Mq = MqQueue;
