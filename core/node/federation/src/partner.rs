use enserver_types::HealthAuthorityId;

/// One federation peer this server pulls from (C11). Endpoint discovery
/// and credential provisioning are configuration-loading concerns (out of
/// scope, per `enserver_config`'s crate doc comment); callers construct
/// these directly when wiring the pull loop.
#[derive(Debug, Clone)]
pub struct FederationPartner {
    pub id: HealthAuthorityId,
    pub endpoint: String,
    pub include_regions: Vec<String>,
    pub exclude_regions: Vec<String>,
}

impl FederationPartner {
    pub fn new(id: HealthAuthorityId, endpoint: impl Into<String>) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            include_regions: Vec::new(),
            exclude_regions: Vec::new(),
        }
    }

    pub fn with_regions(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
        self.include_regions = include;
        self.exclude_regions = exclude;
        self
    }
}
