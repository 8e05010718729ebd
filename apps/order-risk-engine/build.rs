//! Build Script for the Order Risk Engine
//!
//! Emits the `coverage` cfg when building under cargo-llvm-cov so code can
//! opt out with `#[cfg(not(coverage))]`.

use std::env;

fn main() {
    // Unique profile files per process/module during coverage runs
    #[cfg(coverage)]
    {
        println!("cargo:rustc-env=LLVM_PROFILE_FILE=coverage-%p-%m.profraw");
    }

    println!("cargo:rerun-if-changed=build.rs");

    if env::var("CARGO_LLVM_COV").is_ok()
        || env::var("LLVM_PROFILE_FILE").is_ok()
        || env::var("RUSTFLAGS")
            .map(|f| f.contains("instrument-coverage"))
            .unwrap_or(false)
    {
        println!("cargo:rustc-cfg=coverage");
    }
}
