fn main() {
    // Feature flags reach build scripts as environment variables.
    if std::env::var_os("CARGO_FEATURE_NAPI").is_some() {
        napi_build::setup();
    }
}
