// Property-based tests harness
mod strategies;
mod classifier {
    include!("classifier.rs");
}
mod quoting {
    include!("quoting.rs");
}
mod pools {
    include!("pools.rs");
}
