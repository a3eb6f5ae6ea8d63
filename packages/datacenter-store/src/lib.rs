pub mod config;
pub mod consumers;
pub mod crypto;
pub mod database;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod models;
pub mod store;

pub use dispatch::{Handler, Store, Verb};
pub use store::DatacenterStore;
