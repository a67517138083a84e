//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `venuebook_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use venuebook_core::db::{migrations::latest_version, open_db_in_memory};

fn main() {
    println!("venuebook_core version={}", venuebook_core::core_version());

    match open_db_in_memory() {
        Ok(_conn) => println!("venuebook_core schema_version={}", latest_version()),
        Err(err) => {
            eprintln!("venuebook_core db_open failed: {err}");
            std::process::exit(1);
        }
    }
}
