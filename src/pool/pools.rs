use crate::error::{DiagError, DiagResult};
use crate::system::CommandExecutor;
use std::time::Duration;

/// Upper bound for any single `zpool` invocation
pub const ZPOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Properties requested from `zpool list`, in output order
const LIST_PROPERTIES: &str = "name,size,alloc,free,frag,health";

/// Capacity and health of one pool from `zpool list -Hp`
#[derive(Debug, Clone, PartialEq)]
pub struct PoolCapacity {
    pub name: String,
    pub size: u64,
    pub alloc: u64,
    pub free: u64,
    /// Not reported for pools without spacemap histograms
    pub fragmentation: Option<u64>,
    pub health: String,
}

/// Pool detection and per-pool queries through the `zpool` command
pub struct PoolManager<E: CommandExecutor> {
    command_executor: E,
}

impl<E: CommandExecutor> PoolManager<E> {
    pub fn new(command_executor: E) -> Self {
        Self { command_executor }
    }

    /// Get list of imported pools
    pub async fn list_pools(&self) -> DiagResult<Vec<String>> {
        let output = self
            .command_executor
            .execute_with_timeout("zpool", &["list", "-H", "-o", "name"], ZPOOL_TIMEOUT)
            .await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Capacity, fragmentation and health of one pool
    pub async fn capacity(&self, pool: &str) -> DiagResult<PoolCapacity> {
        let output = self
            .command_executor
            .execute_with_timeout(
                "zpool",
                &["list", "-Hp", "-o", LIST_PROPERTIES, pool],
                ZPOOL_TIMEOUT,
            )
            .await?;
        parse_capacity(&output)
    }

    /// Raw `zpool status -p` text of one pool
    pub async fn status(&self, pool: &str) -> DiagResult<String> {
        self.command_executor
            .execute_with_timeout("zpool", &["status", "-p", pool], ZPOOL_TIMEOUT)
            .await
    }
}

pub fn parse_capacity(output: &str) -> DiagResult<PoolCapacity> {
    let line = output
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| DiagError::invalid_format("one pool row", "empty output", "zpool list"))?;
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 6 {
        return Err(DiagError::invalid_format(
            "6 tab-separated columns",
            &format!("{} columns", fields.len()),
            "zpool list",
        ));
    }

    let number = |index: usize, what: &str| {
        fields[index].parse::<u64>().map_err(|_| {
            DiagError::parse_error("zpool list", line, &format!("Invalid {}: {}", what, fields[index]))
        })
    };

    Ok(PoolCapacity {
        name: fields[0].to_string(),
        size: number(1, "size")?,
        alloc: number(2, "alloc")?,
        free: number(3, "free")?,
        fragmentation: fields[4].trim_end_matches('%').parse::<u64>().ok(),
        health: fields[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::DemoCommandExecutor;

    #[test]
    fn test_parse_capacity() {
        let capacity =
            parse_capacity("data\t15994458210304\t7201932574720\t8792525635584\t12\tONLINE\n").unwrap();
        assert_eq!(
            capacity,
            PoolCapacity {
                name: "data".to_string(),
                size: 15_994_458_210_304,
                alloc: 7_201_932_574_720,
                free: 8_792_525_635_584,
                fragmentation: Some(12),
                health: "ONLINE".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_fragmentation() {
        let capacity = parse_capacity("old\t100\t10\t90\t-\tDEGRADED\n").unwrap();
        assert_eq!(capacity.fragmentation, None);
        assert_eq!(capacity.health, "DEGRADED");
    }

    #[test]
    fn test_bad_capacity_rows() {
        assert!(matches!(parse_capacity(""), Err(DiagError::InvalidFormat { .. })));
        assert!(matches!(
            parse_capacity("data\t1\t2\n"),
            Err(DiagError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_capacity("data\t1.5T\t2\t3\t4\tONLINE\n"),
            Err(DiagError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_pools() {
        let manager = PoolManager::new(DemoCommandExecutor);
        assert_eq!(manager.list_pools().await.unwrap(), vec!["boot-pool", "data"]);
        assert_eq!(manager.capacity("data").await.unwrap().alloc, 7_201_932_574_720);
        assert!(manager.capacity("missing").await.is_err());
    }
}
