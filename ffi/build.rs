//! Generates `include/cdn_ffi.h` from the `extern "C"` surface.

use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let header = PathBuf::from(&crate_dir).join("include").join("cdn_ffi.h");

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("CDN_FFI_H")
        .with_cpp_compat(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        Err(err) => println!("cargo:warning=cbindgen failed: {err}"),
    }
}
