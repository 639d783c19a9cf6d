pub mod config;
pub mod db;
pub mod rng;
pub mod tech;

/// tree geometry: a node id packs (layer, index) in its two nibbles
pub const LAYER_CAP: usize = 16;
pub const INDEX_CAP: usize = 16;

/// item names leave room for the "item-" atom prefix
pub const NAME_CAP: usize = config::SYMBOL_CAP - 5;

// generator tuning
pub const CHILD_COUNT_CAP: u32 = 32;
pub const CHECK_MULT: u32 = 8;
pub const CHECK_DIV: u32 = 10;

// writer buffer sizes; output sizes are bounded so overflow is fatal
pub const DUMP_CAP: usize = 1 << 20;
pub const FRAGMENT_CAP: usize = 1 << 18;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// initialize logging; all diagnostics go to stderr
pub fn init(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .set_time_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .expect("initialize logger");
}
