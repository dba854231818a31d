pub mod common;
pub mod substitute_e2e;

use common::Error;
use std::env;
use substitute_e2e::substitute_e2e_test;
use tracing::*;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("substitute") => {
            info!("Running substitute end-to-end test");
            substitute_e2e_test().await
        }
        _ => {
            warn!("Please specify one test; the only one is \"substitute\"");
            Ok(())
        }
    }
}
