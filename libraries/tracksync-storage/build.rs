//! Embeds the cache schema: `sqlx::migrate!` reads `migrations/` at compile time.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
