//! Source trait definitions
//!
//! Narrow lookup interfaces onto the systems that own securities, positions
//! and portfolios. A missing entity is `None`; sources never fail the
//! resolution layer and retry policy, if any, lives behind these traits.

use crate::models::{Portfolio, PortfolioNode, Position, Security, Trade, UniqueId, VersionCorrection};
use std::fmt::Debug;
use std::sync::Arc;

/// Security lookup service
pub trait SecuritySource: Send + Sync + Debug {
    fn get(&self, unique_id: &UniqueId, version_correction: VersionCorrection) -> Option<Arc<Security>>;

    /// Name of the source for diagnostics
    fn source_name(&self) -> &'static str;
}

/// Position and portfolio lookup service
pub trait PositionSource: Send + Sync + Debug {
    fn get_position(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Position>>;

    fn get_trade(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Trade>>;

    fn get_portfolio_node(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<PortfolioNode>>;

    fn get_portfolio(
        &self,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Option<Arc<Portfolio>>;

    fn source_name(&self) -> &'static str;
}
