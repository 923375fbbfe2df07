use crate::domain::{BeaconSpec, MemberAddress, MembershipRegistry, DEFAULT_QUORUM};
use crate::error::OracleResult;

/// Oracle configuration
///
/// Seeds the engine on first boot only; a persisted snapshot takes precedence.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub spec: BeaconSpec,
    /// Initial oracle members
    pub members: Vec<MemberAddress>,
    /// Initial quorum
    pub quorum: u32,
    /// Buffered events per subscriber before the slowest one lags
    pub event_capacity: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            spec: BeaconSpec::default(),
            members: Vec::new(),
            quorum: DEFAULT_QUORUM,
            event_capacity: 1024,
        }
    }
}

impl OracleConfig {
    /// Validate and build the initial member registry
    pub fn membership(&self) -> OracleResult<MembershipRegistry> {
        self.spec.validate()?;
        MembershipRegistry::from_parts(self.members.iter().copied(), self.quorum)
    }
}
