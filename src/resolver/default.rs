//! # Default Target Resolver
//!
//! Dispatches a specification on its type tag to one resolution strategy:
//!
//! | Type | Strategy |
//! |---|---|
//! | `PRIMITIVE` | wraps the unique id, no lookup |
//! | `SECURITY` | security source |
//! | `POSITION`, `TRADE` | position source, wrapped in a lazily resolving decorator |
//! | `PORTFOLIO_NODE` | node lookup, then the root node of a portfolio with that id |
//! | multiple | each alternative in order, first found wins |
//! | nested | the innermost type of the chain |
//!
//! Strategies that need a source fail with
//! [`TargetResolutionError::SourceNotConfigured`] when it is missing. `Null`
//! reaching a strategy, or an empty combinator, fails with
//! [`TargetResolutionError::UnsupportedTargetType`].

use super::{AtVersionCorrectionResolver, ComputationTargetResolver};
use crate::error::{Result, TargetResolutionError};
use crate::models::{
    ComputationTarget, Primitive, TargetSpecification, TargetType, TargetValue, UniqueId,
    VersionCorrection,
};
use crate::sources::lazy::{
    LazyResolutionContext, LazyResolvedPortfolioNode, LazyResolvedPosition, LazyResolvedTrade,
};
use crate::sources::{PositionSource, SecuritySource};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DefaultTargetResolver {
    security_source: Option<Arc<dyn SecuritySource>>,
    position_source: Option<Arc<dyn PositionSource>>,
}

impl DefaultTargetResolver {
    pub fn new(
        security_source: Option<Arc<dyn SecuritySource>>,
        position_source: Option<Arc<dyn PositionSource>>,
    ) -> Self {
        Self {
            security_source,
            position_source,
        }
    }

    pub fn with_security_source(mut self, source: Arc<dyn SecuritySource>) -> Self {
        self.security_source = Some(source);
        self
    }

    pub fn with_position_source(mut self, source: Arc<dyn PositionSource>) -> Self {
        self.position_source = Some(source);
        self
    }

    fn require_security_source(&self, target_type: &TargetType) -> Result<&Arc<dyn SecuritySource>> {
        self.security_source
            .as_ref()
            .ok_or_else(|| TargetResolutionError::SourceNotConfigured {
                source_kind: "security",
                target_type: target_type.to_string(),
            })
    }

    fn require_position_source(&self, target_type: &TargetType) -> Result<&Arc<dyn PositionSource>> {
        self.position_source
            .as_ref()
            .ok_or_else(|| TargetResolutionError::SourceNotConfigured {
                source_kind: "position",
                target_type: target_type.to_string(),
            })
    }

    /// Both sources plus the context the lazy decorators resolve securities through
    fn lazy_strategy(
        &self,
        target_type: &TargetType,
        version_correction: VersionCorrection,
    ) -> Result<(&Arc<dyn PositionSource>, LazyResolutionContext)> {
        let security_source = self.require_security_source(target_type)?;
        let position_source = self.require_position_source(target_type)?;
        Ok((
            position_source,
            LazyResolutionContext::new(security_source.clone(), version_correction),
        ))
    }

    fn resolve_value(
        &self,
        target_type: &TargetType,
        unique_id: &UniqueId,
        version_correction: VersionCorrection,
    ) -> Result<Option<Arc<TargetValue>>> {
        let value = match target_type {
            TargetType::Primitive => Some(TargetValue::Primitive(Primitive::new(unique_id.clone()))),
            TargetType::Security => self
                .require_security_source(target_type)?
                .get(unique_id, version_correction)
                .map(TargetValue::Security),
            TargetType::Position => {
                let (positions, context) = self.lazy_strategy(target_type, version_correction)?;
                positions
                    .get_position(unique_id, version_correction)
                    .map(|position| TargetValue::Position(LazyResolvedPosition::new(position, context)))
            }
            TargetType::Trade => {
                let (positions, context) = self.lazy_strategy(target_type, version_correction)?;
                positions
                    .get_trade(unique_id, version_correction)
                    .map(|trade| TargetValue::Trade(LazyResolvedTrade::new(trade, context)))
            }
            TargetType::PortfolioNode => {
                let (positions, context) = self.lazy_strategy(target_type, version_correction)?;
                positions
                    .get_portfolio_node(unique_id, version_correction)
                    .or_else(|| {
                        positions
                            .get_portfolio(unique_id, version_correction)
                            .map(|portfolio| portfolio.root_node.clone())
                    })
                    .map(|node| TargetValue::PortfolioNode(LazyResolvedPortfolioNode::new(node, context)))
            }
            TargetType::Multiple(members) if !members.is_empty() => {
                for member in members {
                    if let Some(value) = self.resolve_value(member, unique_id, version_correction)? {
                        return Ok(Some(value));
                    }
                }
                None
            }
            TargetType::Nested(_) => match target_type.leaf() {
                Some(leaf) => return self.resolve_value(leaf, unique_id, version_correction),
                None => return Err(unsupported(target_type)),
            },
            TargetType::Multiple(_) | TargetType::Null => return Err(unsupported(target_type)),
        };
        Ok(value.map(Arc::new))
    }
}

fn unsupported(target_type: &TargetType) -> TargetResolutionError {
    TargetResolutionError::UnsupportedTargetType {
        target_type: target_type.to_string(),
    }
}

impl ComputationTargetResolver for DefaultTargetResolver {
    fn resolve(
        &self,
        specification: &Arc<TargetSpecification>,
        version_correction: VersionCorrection,
    ) -> Result<Option<Arc<ComputationTarget>>> {
        let Some(unique_id) = specification.unique_id() else {
            return Ok(Some(ComputationTarget::null()));
        };

        match self.resolve_value(specification.target_type(), unique_id, version_correction)? {
            Some(value) => Ok(Some(Arc::new(ComputationTarget::for_value(
                specification,
                value,
            )?))),
            None => {
                debug!(
                    specification = %specification,
                    version_correction = %version_correction,
                    "Target not found"
                );
                Ok(None)
            }
        }
    }

    fn security_source(&self) -> Option<Arc<dyn SecuritySource>> {
        self.security_source.clone()
    }

    fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        self.position_source.clone()
    }

    fn at_version_correction(&self, version_correction: VersionCorrection) -> AtVersionCorrectionResolver {
        AtVersionCorrectionResolver::new(Arc::new(self.clone()), version_correction)
    }
}
