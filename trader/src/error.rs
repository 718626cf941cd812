use crate::{ids::TradeId, trade::TradeStatus};
use engine_execution::BrokerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("trade {0} not found")]
    NotFound(TradeId),

    #[error("trade {trade_id} cannot {action} from status {from:?}")]
    InvalidStateTransition {
        trade_id: TradeId,
        from: TradeStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Broker(#[from] BrokerError),
}
