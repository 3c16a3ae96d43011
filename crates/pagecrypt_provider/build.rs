//! Detects the linked OpenSSL flavour for the `fips` feature.

use std::env;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(ossl300)");
    println!("cargo:rustc-check-cfg=cfg(libressl)");

    if env::var_os("DEP_OPENSSL_LIBRESSL_VERSION_NUMBER").is_some() {
        println!("cargo:rustc-cfg=libressl");
        return;
    }

    // Set by openssl-sys, which is only linked with the `fips` feature.
    if let Ok(version) = env::var("DEP_OPENSSL_VERSION_NUMBER") {
        let version = u64::from_str_radix(&version, 16).unwrap_or(0);
        if version >= 0x3000_0000 {
            println!("cargo:rustc-cfg=ossl300");
        }
    }
}
