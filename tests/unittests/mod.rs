// Unit tests harness
mod scenarios {
    include!("scenarios.rs");
}
mod cells {
    include!("cells.rs");
}
mod series {
    include!("series.rs");
}
mod hooks {
    include!("hooks.rs");
}
mod bind {
    include!("bind.rs");
}
