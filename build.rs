#![forbid(unsafe_code)]

fn main() {
    build_data::set_BUILD_TIMESTAMP();
    build_data::set_RUSTC_VERSION();
}
