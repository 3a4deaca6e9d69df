// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

pub mod counting_db;
pub mod prepare_env;
pub mod webhooks;
