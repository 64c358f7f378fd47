//! Bundled sample data served when running with `DEMO_MODE=true`

pub const DEMO_ARCSTATS: &str = include_str!("arcstats.txt");
pub const DEMO_ZFETCHSTATS: &str = include_str!("zfetchstats.txt");
pub const DEMO_DMU_TX: &str = include_str!("dmu_tx.txt");
pub const DEMO_POOL_IO: &str = include_str!("data_io.txt");

pub const DEMO_ZPOOL_LIST: &str = include_str!("zpool_list.txt");
pub const DEMO_ZPOOL_LIST_DATA: &str = include_str!("zpool_list_data.txt");
pub const DEMO_ZPOOL_LIST_BOOT: &str = include_str!("zpool_list_boot.txt");
pub const DEMO_ZPOOL_STATUS_DATA: &str = include_str!("zpool_status_data.txt");
pub const DEMO_ZPOOL_STATUS_BOOT: &str = include_str!("zpool_status_boot.txt");

/// fio `--output-format=json` report, with the leading note fio prints
pub const DEMO_FIO_JSON: &str = include_str!("fio.json");

/// Whether the `DEMO_MODE` environment variable asks for bundled data
pub fn enabled() -> bool {
    std::env::var("DEMO_MODE").unwrap_or_else(|_| "false".to_string()) == "true"
}
