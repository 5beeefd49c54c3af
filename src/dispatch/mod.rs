//! Session dispatch module
//!
//! Runs browser session work on dedicated workers so request handlers never
//! drive a session inline, and serializes the work each session receives.

mod dispatcher;

pub use dispatcher::{Dispatcher, JobDone, SessionJob, SessionSnapshot};
