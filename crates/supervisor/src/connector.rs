//! Venue wiring
//!
//! A connector turns a validated config into the pair of venue handles the
//! controller runs against. The simulated connector keeps one venue per
//! endpoint so testnet runs never touch the live book.

use ladder_core::StrategyConfig;
use ladder_gateway::{ExchangeGateway, MarketSnapshotSource, SimVenue, VenueEndpoint};
use std::sync::Arc;

/// Resolves venue handles for a run
pub trait VenueConnector: Send + Sync {
    fn connect(
        &self,
        config: &StrategyConfig,
    ) -> (Arc<dyn MarketSnapshotSource>, Arc<dyn ExchangeGateway>);
}

/// Connector backed by in-process simulated venues
pub struct SimConnector {
    live: Arc<SimVenue>,
    testnet: Arc<SimVenue>,
}

impl SimConnector {
    pub fn new(live: Arc<SimVenue>, testnet: Arc<SimVenue>) -> Self {
        Self { live, testnet }
    }

    fn venue(&self, endpoint: VenueEndpoint) -> &Arc<SimVenue> {
        match endpoint {
            VenueEndpoint::Live => &self.live,
            VenueEndpoint::Testnet => &self.testnet,
        }
    }
}

impl VenueConnector for SimConnector {
    fn connect(
        &self,
        config: &StrategyConfig,
    ) -> (Arc<dyn MarketSnapshotSource>, Arc<dyn ExchangeGateway>) {
        let venue = self.venue(VenueEndpoint::select(config.testnet));
        let snapshots: Arc<dyn MarketSnapshotSource> = venue.clone();
        let gateway: Arc<dyn ExchangeGateway> = venue.clone();
        (snapshots, gateway)
    }
}
