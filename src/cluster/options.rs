use crate::utils::prelude::*;

/// Network-facing configuration for one gossip process: which port to
/// listen on and which upstream peer (if any) to dial at startup.
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    pub port: u16,
    pub link: Option<String>,
    pub secret: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig { port: 8099, link: None, secret: crate::cluster::protocol::DEFAULT_SECRET.to_owned() }
    }
}
