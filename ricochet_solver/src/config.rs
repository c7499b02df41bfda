use crate::SolverError;

/// The largest supported depth ceiling.
///
/// Depths are stored as `u8` in the transposition table.
pub const MAX_DEPTH_CEILING: usize = u8::MAX as usize;

/// The factor by which a hash table grows once it is more than half full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Double the number of slots.
    Double,
    /// Quadruple the number of slots.
    Quadruple,
}

impl Growth {
    /// Returns the number of bits the capacity is shifted by when growing.
    pub(crate) fn shift(self) -> u32 {
        match self {
            Growth::Double => 1,
            Growth::Quadruple => 2,
        }
    }
}

impl Default for Growth {
    fn default() -> Self {
        Growth::Quadruple
    }
}

/// Configuration shared by all solvers.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// The maximum number of moves a solution may have.
    pub max_depth: usize,
    /// Stop searching once this much time has passed since the solve started.
    pub time_limit: Option<chrono::Duration>,
    /// Stop searching after visiting this many nodes.
    pub node_limit: Option<u64>,
    /// The initial number of slots in each hash table, rounded up to a power of two.
    pub table_capacity: usize,
    /// How hash tables grow.
    pub growth: Growth,
}

impl SolverConfig {
    /// Checks that all values can be used by the solvers.
    pub fn validate(&self) -> Result<(), SolverError> {
        let reason = if self.max_depth == 0 {
            "the maximum depth has to be at least 1"
        } else if self.max_depth > MAX_DEPTH_CEILING {
            "the maximum depth can't be larger than 255"
        } else if self.table_capacity == 0 {
            "the table capacity has to be at least 1"
        } else if self.table_capacity > (usize::MAX >> 2) {
            "the table capacity is too large"
        } else if matches!(self.time_limit, Some(limit) if limit <= chrono::Duration::zero()) {
            "the time limit has to be positive"
        } else {
            return Ok(());
        };
        Err(SolverError::InvalidConfig { reason })
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            time_limit: None,
            node_limit: None,
            table_capacity: 65536,
            growth: Growth::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Growth, SolverConfig};
    use crate::SolverError;

    #[test]
    fn default_is_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.growth, Growth::Quadruple);
    }

    #[test]
    fn rejects_invalid_values() {
        let configs = vec![
            SolverConfig {
                max_depth: 0,
                ..Default::default()
            },
            SolverConfig {
                max_depth: 256,
                ..Default::default()
            },
            SolverConfig {
                table_capacity: 0,
                ..Default::default()
            },
            SolverConfig {
                time_limit: Some(chrono::Duration::zero()),
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(matches!(
                config.validate(),
                Err(SolverError::InvalidConfig { .. })
            ));
        }
    }
}
