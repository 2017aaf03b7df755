//! Command-line entry point for `shoptest`.

fn main() {
    shoptest_cli::entry::run();
}
