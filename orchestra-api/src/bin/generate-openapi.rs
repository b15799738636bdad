//! OpenAPI Specification Generator Binary
//!
//! Prints the Orchestra OpenAPI document as JSON to stdout.
//!
//! Usage:
//!   cargo run -p orchestra-api --bin generate-openapi > openapi.json

use orchestra_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI document: {}", e);
            std::process::exit(1);
        }
    }
}
