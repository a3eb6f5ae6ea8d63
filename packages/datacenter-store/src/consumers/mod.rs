pub mod subject;

pub use subject::{consume_subject, spawn_consumers};
