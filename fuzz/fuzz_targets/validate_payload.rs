//! Fuzz test for request payload validation
//!
//! Feeds arbitrary JSON documents through every request schema. Validation
//! must never panic, must report at least one field error on rejection, and
//! must only accept payloads whose typed input re-validates cleanly.
//!
//! Run with: cargo +nightly fuzz run validate_payload -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use orchestra_core::{
    validate, CreateAgentInput, CreateConsoleEventInput, CreateLogInput, CreateMemoryInput,
    UpdateAgentStatusInput, Validate,
};
use serde::Serialize;
use serde_json::Value;

fn check<T: Validate + Serialize>(payload: &Value) {
    match validate::<T>(payload) {
        Ok(input) => {
            // Accepted inputs serialize back to a payload the same schema accepts
            let echoed = serde_json::to_value(&input).expect("typed input serializes");
            assert!(
                validate::<T>(&echoed).is_ok(),
                "accepted input failed re-validation: {}",
                echoed
            );
        }
        Err(errors) => {
            assert!(!errors.is_empty(), "rejection without field errors");
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    check::<CreateAgentInput>(&payload);
    check::<CreateLogInput>(&payload);
    check::<CreateMemoryInput>(&payload);
    check::<UpdateAgentStatusInput>(&payload);
    check::<CreateConsoleEventInput>(&payload);
});
