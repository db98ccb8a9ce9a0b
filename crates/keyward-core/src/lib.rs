//! Core keyward library (state machine, session runtime, policy, storage).

pub mod config;
pub mod jwt;
pub mod machine;
pub mod policy;
pub mod runtime;
pub mod storage;
pub mod token;
